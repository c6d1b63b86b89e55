//! Common types used across the roast companion

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CompletedRoast, RoastLevel};

/// Inclusive range over roast start timestamps (epoch ms).
/// A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeRange {
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn lower(&self) -> i64 {
        self.start.unwrap_or(i64::MIN)
    }

    pub fn upper(&self) -> i64 {
        self.end.unwrap_or(i64::MAX)
    }

    pub fn contains(&self, at: i64) -> bool {
        at >= self.lower() && at <= self.upper()
    }
}

/// Filters for roast history and comparison views
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoastFilters {
    pub lot_id: Option<Uuid>,
    pub roast_level: Option<RoastLevel>,
    /// Inclusive lower bound on `started_at`
    pub from: Option<i64>,
    /// Inclusive upper bound on `started_at`
    pub to: Option<i64>,
}

impl RoastFilters {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.from,
            end: self.to,
        }
    }

    /// Full predicate, applied after the primary index scan
    pub fn matches(&self, roast: &CompletedRoast) -> bool {
        if let Some(lot_id) = self.lot_id {
            if roast.lot_id != lot_id {
                return false;
            }
        }
        if let Some(level) = self.roast_level {
            if roast.roast_level != level {
                return false;
            }
        }
        self.range().contains(roast.started_at)
    }
}
