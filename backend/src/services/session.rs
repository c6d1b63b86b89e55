//! Live roast session service
//!
//! The server hosts exactly one [`RoastSession`]. Each action locks it,
//! applies one transition and answers with a fresh snapshot. Saving is the
//! only action that touches the database.

use std::sync::Arc;

use serde::Serialize;
use shared::{
    BeginRoastInput, CompletedRoast, DiscardOutcome, PostRoastInput, RoastEventType,
    RoastSession, SessionSnapshot,
};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{InventoryService, RoastingService};
use crate::error::AppResult;

/// The process-wide session handle stored in `AppState`
pub type SharedSession = Arc<Mutex<RoastSession>>;

pub fn new_shared_session() -> SharedSession {
    Arc::new(Mutex::new(RoastSession::new()))
}

/// Outcome of a session action
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    /// Whether the transition was accepted
    pub applied: bool,
    pub session: SessionSnapshot,
}

/// Outcome of a discard request
#[derive(Debug, Clone, Serialize)]
pub struct DiscardView {
    pub outcome: DiscardOutcome,
    pub session: SessionSnapshot,
}

/// Outcome of a successful save
#[derive(Debug, Clone, Serialize)]
pub struct SavedView {
    pub roast: CompletedRoast,
    pub session: SessionSnapshot,
}

#[derive(Clone)]
pub struct SessionService {
    db: SqlitePool,
    session: SharedSession,
}

impl SessionService {
    pub fn new(db: SqlitePool, session: SharedSession) -> Self {
        Self { db, session }
    }

    async fn apply(
        &self,
        now_ms: i64,
        transition: impl FnOnce(&mut RoastSession) -> bool,
    ) -> SessionView {
        let mut session = self.session.lock().await;
        let applied = transition(&mut *session);
        SessionView {
            applied,
            session: session.snapshot(now_ms),
        }
    }

    pub async fn snapshot(&self, now_ms: i64) -> SessionSnapshot {
        self.session.lock().await.snapshot(now_ms)
    }

    pub async fn open_pre_roast(&self, now_ms: i64) -> SessionView {
        self.apply(now_ms, RoastSession::open_pre_roast).await
    }

    pub async fn cancel_pre_roast(&self, now_ms: i64) -> SessionView {
        self.apply(now_ms, RoastSession::cancel_pre_roast).await
    }

    /// Validate the pre-roast form, check the lot exists, then start the roast
    pub async fn begin_roast(&self, input: BeginRoastInput, now_ms: i64) -> AppResult<SessionView> {
        let begin = input.validate()?;
        InventoryService::new(self.db.clone())
            .get_lot(begin.lot_id)
            .await?;

        Ok(self
            .apply(now_ms, |session| session.begin_roast(begin, now_ms))
            .await)
    }

    pub async fn mark_first_crack(&self, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| session.mark_first_crack(now_ms))
            .await
    }

    pub async fn mark_drop(&self, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| session.mark_drop(now_ms)).await
    }

    pub async fn stop(&self, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| session.stop(now_ms)).await
    }

    pub async fn delete_marker(&self, kind: RoastEventType, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| session.delete_marker(kind))
            .await
    }

    pub async fn focus_marker(&self, kind: Option<RoastEventType>, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| session.focus_marker(kind))
            .await
    }

    /// Validate the post-roast form against the recorded green weight
    pub async fn record_post_roast(
        &self,
        input: PostRoastInput,
        now_ms: i64,
    ) -> AppResult<SessionView> {
        let mut session = self.session.lock().await;
        let post_roast = input.validate(session.green_weight_grams())?;
        let applied = session.record_post_roast(post_roast);
        Ok(SessionView {
            applied,
            session: session.snapshot(now_ms),
        })
    }

    pub async fn set_notes(&self, notes: String, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| {
            session.set_notes(notes);
            true
        })
        .await
    }

    pub async fn set_selected_lot(&self, lot_id: Option<Uuid>, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| session.set_selected_lot(lot_id))
            .await
    }

    pub async fn reset_session(&self, now_ms: i64) -> SessionView {
        self.apply(now_ms, |session| session.reset_session())
            .await
    }

    pub async fn discard(&self, now_ms: i64) -> DiscardView {
        let mut session = self.session.lock().await;
        let outcome = session.discard();
        if outcome == DiscardOutcome::Discarded {
            tracing::info!("Discarded roast draft");
        }
        DiscardView {
            outcome,
            session: session.snapshot(now_ms),
        }
    }

    /// Persist the reviewed roast, then reset the session.
    ///
    /// The lock is held across the write so nothing can change the draft
    /// mid-save; on failure the session is left as it was.
    pub async fn save(&self, now_ms: i64) -> AppResult<SavedView> {
        let mut session = self.session.lock().await;
        let roast = session.to_completed_roast()?;

        let saved = RoastingService::new(self.db.clone())
            .save_roast(roast)
            .await?;

        *session = RoastSession::new();
        Ok(SavedView {
            roast: saved,
            session: session.snapshot(now_ms),
        })
    }
}
