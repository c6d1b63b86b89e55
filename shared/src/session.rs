//! Roast session state machine
//!
//! One [`RoastSession`] holds the in-progress roast on a device. The caller
//! owns it and passes it by reference to every transition; construction and
//! [`RoastSession::reset_session`] bound its lifecycle. A session restored
//! through `Deserialize` is checked against the same invariants the
//! transitions keep.
//!
//! Flow: `idle → preRoast → running → postRoast → review → idle`.
//!
//! Transitions return `true` when applied. A rejected transition leaves the
//! session exactly as it was; callers are expected to pre-check with the
//! `can_*` selectors, but the session is the final authority over its
//! event log. Methods that append events take the caller's clock reading in
//! epoch milliseconds; an appended event is stamped
//! `max(now, previous event)` so a clock stepping backwards mid-roast never
//! produces a regressing log.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::{derive_phase_times, derive_yield_percent, PhaseTimes};
use crate::models::{event_timestamp, NewRoast, RoastEvent, RoastEventType, RoastLevel};
use crate::validation::{
    can_append_event, clean_text, validate_event_sequence, validate_new_roast, BeginRoast,
    PostRoast, SequenceError, ValidationError,
};

/// Coarse UI phase layered over the event log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowStep {
    #[default]
    Idle,
    PreRoast,
    Running,
    PostRoast,
    Review,
}

/// Result of a discard request in review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardOutcome {
    /// Not in review; nothing happened
    Ignored,
    /// First tap; a second tap is required
    Armed,
    /// Second tap; the draft was dropped
    Discarded,
}

/// Why a stored session cannot be restored
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("stored event log is invalid: {0}")]
    Events(#[from] SequenceError),

    #[error("stored session is inconsistent: {0}")]
    Inconsistent(&'static str),
}

/// The in-progress roast
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoastSession {
    events: Vec<RoastEvent>,
    flow_step: FlowStep,
    roast_level: Option<RoastLevel>,
    green_weight_grams: Option<Decimal>,
    roasted_weight_grams: Option<Decimal>,
    notes: String,
    selected_lot_id: Option<Uuid>,
    focused_event: Option<RoastEventType>,
    discard_armed: bool,
}

impl RoastSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn events(&self) -> &[RoastEvent] {
        &self.events
    }

    pub fn flow_step(&self) -> FlowStep {
        self.flow_step
    }

    /// Derived from the log: START present and STOP absent
    pub fn is_running(&self) -> bool {
        self.has_event(RoastEventType::Start) && !self.has_event(RoastEventType::Stop)
    }

    /// Derived from the log
    pub fn start_at(&self) -> Option<i64> {
        event_timestamp(&self.events, RoastEventType::Start)
    }

    pub fn roast_level(&self) -> Option<RoastLevel> {
        self.roast_level
    }

    pub fn green_weight_grams(&self) -> Option<Decimal> {
        self.green_weight_grams
    }

    pub fn roasted_weight_grams(&self) -> Option<Decimal> {
        self.roasted_weight_grams
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn selected_lot_id(&self) -> Option<Uuid> {
        self.selected_lot_id
    }

    pub fn focused_event(&self) -> Option<RoastEventType> {
        self.focused_event
    }

    pub fn is_discard_armed(&self) -> bool {
        self.discard_armed
    }

    pub fn has_event(&self, kind: RoastEventType) -> bool {
        self.events.iter().any(|event| event.kind == kind)
    }

    fn last_at(&self) -> Option<i64> {
        self.events.last().map(|event| event.at)
    }

    fn stamp(&self, kind: RoastEventType, now_ms: i64) -> RoastEvent {
        let at = match self.last_at() {
            Some(last) => now_ms.max(last),
            None => now_ms,
        };
        RoastEvent::new(kind, at)
    }

    fn reject(&self, action: &'static str) -> bool {
        tracing::debug!(
            action,
            flow_step = ?self.flow_step,
            events = self.events.len(),
            "Rejected roast session transition"
        );
        false
    }

    // ========================================================================
    // Flow Transitions
    // ========================================================================

    /// idle → preRoast.
    ///
    /// Also accepted from any later step whose log is empty, which is where
    /// deleting START leaves the session.
    pub fn open_pre_roast(&mut self) -> bool {
        if self.flow_step == FlowStep::PreRoast || !self.events.is_empty() {
            return self.reject("open_pre_roast");
        }
        self.flow_step = FlowStep::PreRoast;
        self.roast_level = None;
        self.roasted_weight_grams = None;
        self.focused_event = None;
        self.discard_armed = false;
        true
    }

    /// preRoast → idle, dropping the lot and weight draft
    pub fn cancel_pre_roast(&mut self) -> bool {
        if self.flow_step != FlowStep::PreRoast {
            return self.reject("cancel_pre_roast");
        }
        self.flow_step = FlowStep::Idle;
        self.selected_lot_id = None;
        self.green_weight_grams = None;
        true
    }

    /// preRoast → running; appends START.
    ///
    /// Also accepted from `running`, `postRoast` or `review` with an empty
    /// log, which is where a deleted START leaves the session.
    pub fn begin_roast(&mut self, input: BeginRoast, now_ms: i64) -> bool {
        let ready = match self.flow_step {
            FlowStep::Idle => false,
            FlowStep::PreRoast => !self.is_running(),
            FlowStep::Running | FlowStep::PostRoast | FlowStep::Review => self.events.is_empty(),
        };
        if !ready {
            return self.reject("begin_roast");
        }
        if input.green_weight_grams <= Decimal::ZERO {
            return self.reject("begin_roast");
        }

        self.events = vec![RoastEvent::new(RoastEventType::Start, now_ms)];
        self.flow_step = FlowStep::Running;
        self.focused_event = None;
        self.roast_level = None;
        self.roasted_weight_grams = None;
        self.green_weight_grams = Some(input.green_weight_grams);
        self.selected_lot_id = Some(input.lot_id);
        self.discard_armed = false;
        true
    }

    fn append(&mut self, kind: RoastEventType, now_ms: i64, action: &'static str) -> bool {
        if !self.is_running() {
            return self.reject(action);
        }
        let candidate = self.stamp(kind, now_ms);
        if !can_append_event(&self.events, candidate) {
            return self.reject(action);
        }
        self.events.push(candidate);
        self.discard_armed = false;
        true
    }

    pub fn mark_first_crack(&mut self, now_ms: i64) -> bool {
        self.append(RoastEventType::FirstCrack, now_ms, "mark_first_crack")
    }

    pub fn mark_drop(&mut self, now_ms: i64) -> bool {
        self.append(RoastEventType::Drop, now_ms, "mark_drop")
    }

    /// running → postRoast; appends STOP
    pub fn stop(&mut self, now_ms: i64) -> bool {
        if !self.append(RoastEventType::Stop, now_ms, "stop") {
            return false;
        }
        self.flow_step = FlowStep::PostRoast;
        true
    }

    /// Drop `kind` and every later milestone. Running state is re-derived
    /// from what remains; the flow step is left alone.
    pub fn delete_marker(&mut self, kind: RoastEventType) -> bool {
        if !self.has_event(kind) {
            return self.reject("delete_marker");
        }
        let cutoff = kind.ordinal();
        self.events.retain(|event| event.kind.ordinal() < cutoff);
        if matches!(self.focused_event, Some(focused) if focused.ordinal() >= cutoff) {
            self.focused_event = None;
        }
        self.discard_armed = false;
        true
    }

    /// Move the marker cursor; `None` clears it
    pub fn focus_marker(&mut self, kind: Option<RoastEventType>) -> bool {
        if let Some(kind) = kind {
            if !self.has_event(kind) {
                return self.reject("focus_marker");
            }
        }
        self.focused_event = kind;
        true
    }

    /// postRoast → review
    pub fn record_post_roast(&mut self, input: PostRoast) -> bool {
        if self.flow_step != FlowStep::PostRoast || !self.has_event(RoastEventType::Stop) {
            return self.reject("record_post_roast");
        }
        match self.green_weight_grams {
            Some(green)
                if input.roasted_weight_grams > Decimal::ZERO
                    && input.roasted_weight_grams <= green => {}
            _ => return self.reject("record_post_roast"),
        }

        self.roast_level = Some(input.roast_level);
        self.roasted_weight_grams = Some(input.roasted_weight_grams);
        self.flow_step = FlowStep::Review;
        self.discard_armed = false;
        true
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
        self.discard_armed = false;
    }

    /// Lot picker; locked once the roast has started
    pub fn set_selected_lot(&mut self, lot_id: Option<Uuid>) -> bool {
        if self.flow_step != FlowStep::PreRoast {
            return self.reject("set_selected_lot");
        }
        self.selected_lot_id = lot_id;
        true
    }

    /// review → idle without the discard confirmation, once the roast has
    /// been saved. Refused in every other step.
    pub fn reset_session(&mut self) -> bool {
        if self.flow_step != FlowStep::Review {
            return self.reject("reset_session");
        }
        self.clear();
        true
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Two-step discard from review: the first call arms, the second resets
    pub fn discard(&mut self) -> DiscardOutcome {
        if self.flow_step != FlowStep::Review {
            self.reject("discard");
            return DiscardOutcome::Ignored;
        }
        if !self.discard_armed {
            self.discard_armed = true;
            return DiscardOutcome::Armed;
        }
        self.clear();
        DiscardOutcome::Discarded
    }

    /// Build the record to persist from a session in review
    pub fn to_completed_roast(&self) -> Result<NewRoast, ValidationError> {
        if self.flow_step != FlowStep::Review {
            return Err(ValidationError::new(
                "flow_step",
                "Finish the post-roast details before saving",
            ));
        }
        let lot_id = self
            .selected_lot_id
            .ok_or_else(|| ValidationError::new("lot_id", "Select a lot before saving this roast"))?;
        let roast_level = self
            .roast_level
            .ok_or_else(|| ValidationError::new("roast_level", "Roast level is required"))?;
        let green = self.green_weight_grams.ok_or_else(|| {
            ValidationError::new("green_weight_grams", "Green weight is required")
        })?;
        let roasted = self.roasted_weight_grams.ok_or_else(|| {
            ValidationError::new("roasted_weight_grams", "Roasted weight is required")
        })?;
        let started_at = self
            .start_at()
            .ok_or_else(|| ValidationError::new("events", "Missing START marker"))?;
        let ended_at = event_timestamp(&self.events, RoastEventType::Stop)
            .ok_or_else(|| ValidationError::new("events", "Missing STOP marker"))?;
        let yield_percent = derive_yield_percent(green, roasted)
            .ok_or_else(|| ValidationError::new("roasted_weight_grams", "Weights must be positive"))?;

        let roast = NewRoast {
            lot_id,
            started_at,
            ended_at,
            roast_level,
            green_weight_grams: green,
            roasted_weight_grams: roasted,
            yield_percent,
            notes: clean_text(Some(&self.notes)),
            events: self.events.clone(),
        };
        validate_new_roast(&roast)?;
        Ok(roast)
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    pub fn phase_times(&self) -> PhaseTimes {
        derive_phase_times(&self.events)
    }

    /// START to now while running, else the recorded total
    pub fn total_elapsed_ms(&self, now_ms: i64) -> Option<i64> {
        match self.start_at() {
            Some(start) if self.is_running() => Some(now_ms.saturating_sub(start).max(0)),
            _ => self.phase_times().total_ms,
        }
    }

    /// FIRST_CRACK to now while developing, else the recorded development
    pub fn development_elapsed_ms(&self, now_ms: i64) -> Option<i64> {
        let first_crack = event_timestamp(&self.events, RoastEventType::FirstCrack);
        match first_crack {
            Some(at) if self.is_running() && !self.has_event(RoastEventType::Drop) => {
                Some(now_ms.saturating_sub(at).max(0))
            }
            _ => self.phase_times().development_ms,
        }
    }

    /// DROP to now while cooling, else the recorded cooling
    pub fn cooling_elapsed_ms(&self, now_ms: i64) -> Option<i64> {
        let drop = event_timestamp(&self.events, RoastEventType::Drop);
        match drop {
            Some(at) if self.is_running() => Some(now_ms.saturating_sub(at).max(0)),
            _ => self.phase_times().cooling_ms,
        }
    }

    fn can_append(&self, kind: RoastEventType) -> bool {
        self.is_running()
            && can_append_event(
                &self.events,
                RoastEvent::new(kind, self.last_at().unwrap_or_default()),
            )
    }

    pub fn can_mark_first_crack(&self) -> bool {
        self.can_append(RoastEventType::FirstCrack)
    }

    pub fn can_mark_drop(&self) -> bool {
        self.can_append(RoastEventType::Drop)
    }

    pub fn can_stop(&self) -> bool {
        self.can_append(RoastEventType::Stop)
    }

    pub fn yield_percent(&self) -> Option<Decimal> {
        match (self.green_weight_grams, self.roasted_weight_grams) {
            (Some(green), Some(roasted)) => derive_yield_percent(green, roasted),
            _ => None,
        }
    }

    /// Everything a screen needs, evaluated at `now_ms`
    pub fn snapshot(&self, now_ms: i64) -> SessionSnapshot {
        SessionSnapshot {
            flow_step: self.flow_step,
            is_running: self.is_running(),
            start_at: self.start_at(),
            events: self.events.clone(),
            phase_times: self.phase_times(),
            total_elapsed_ms: self.total_elapsed_ms(now_ms),
            development_elapsed_ms: self.development_elapsed_ms(now_ms),
            cooling_elapsed_ms: self.cooling_elapsed_ms(now_ms),
            can_mark_first_crack: self.can_mark_first_crack(),
            can_mark_drop: self.can_mark_drop(),
            can_stop: self.can_stop(),
            roast_level: self.roast_level,
            green_weight_grams: self.green_weight_grams,
            roasted_weight_grams: self.roasted_weight_grams,
            yield_percent: self.yield_percent(),
            notes: self.notes.clone(),
            selected_lot_id: self.selected_lot_id,
            focused_event: self.focused_event,
            discard_armed: self.discard_armed,
        }
    }
}

// ============================================================================
// Restore
// ============================================================================

/// Field-for-field mirror of the serialized session, checked before use
#[derive(Default, Deserialize)]
#[serde(default)]
struct StoredSession {
    events: Vec<RoastEvent>,
    flow_step: FlowStep,
    roast_level: Option<RoastLevel>,
    green_weight_grams: Option<Decimal>,
    roasted_weight_grams: Option<Decimal>,
    notes: String,
    selected_lot_id: Option<Uuid>,
    focused_event: Option<RoastEventType>,
    discard_armed: bool,
}

impl TryFrom<StoredSession> for RoastSession {
    type Error = RestoreError;

    fn try_from(stored: StoredSession) -> Result<Self, RestoreError> {
        validate_event_sequence(&stored.events)?;

        let session = RoastSession {
            events: stored.events,
            flow_step: stored.flow_step,
            roast_level: stored.roast_level,
            green_weight_grams: stored.green_weight_grams,
            roasted_weight_grams: stored.roasted_weight_grams,
            notes: stored.notes,
            selected_lot_id: stored.selected_lot_id,
            focused_event: stored.focused_event,
            discard_armed: stored.discard_armed,
        };

        match session.flow_step {
            FlowStep::Idle | FlowStep::PreRoast if !session.events.is_empty() => {
                return Err(RestoreError::Inconsistent("events recorded before the roast began"));
            }
            FlowStep::Running if session.has_event(RoastEventType::Stop) => {
                return Err(RestoreError::Inconsistent("running session already has STOP"));
            }
            FlowStep::Review
                if session.roast_level.is_none() || session.roasted_weight_grams.is_none() =>
            {
                return Err(RestoreError::Inconsistent("review without post-roast details"));
            }
            _ => {}
        }

        if matches!(session.focused_event, Some(kind) if !session.has_event(kind)) {
            return Err(RestoreError::Inconsistent("focused marker is not in the log"));
        }
        if matches!(session.green_weight_grams, Some(green) if green <= Decimal::ZERO) {
            return Err(RestoreError::Inconsistent("green weight must be positive"));
        }
        match (session.green_weight_grams, session.roasted_weight_grams) {
            (_, Some(roasted)) if roasted <= Decimal::ZERO => {
                return Err(RestoreError::Inconsistent("roasted weight must be positive"));
            }
            (Some(green), Some(roasted)) if roasted > green => {
                return Err(RestoreError::Inconsistent("roasted weight exceeds green weight"));
            }
            _ => {}
        }
        if session.discard_armed && session.flow_step != FlowStep::Review {
            return Err(RestoreError::Inconsistent("discard armed outside review"));
        }

        Ok(session)
    }
}

impl<'de> Deserialize<'de> for RoastSession {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let stored = StoredSession::deserialize(deserializer)?;
        RoastSession::try_from(stored).map_err(serde::de::Error::custom)
    }
}

/// Read-only projection of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub flow_step: FlowStep,
    pub is_running: bool,
    pub start_at: Option<i64>,
    pub events: Vec<RoastEvent>,
    pub phase_times: PhaseTimes,
    pub total_elapsed_ms: Option<i64>,
    pub development_elapsed_ms: Option<i64>,
    pub cooling_elapsed_ms: Option<i64>,
    pub can_mark_first_crack: bool,
    pub can_mark_drop: bool,
    pub can_stop: bool,
    pub roast_level: Option<RoastLevel>,
    pub green_weight_grams: Option<Decimal>,
    pub roasted_weight_grams: Option<Decimal>,
    pub yield_percent: Option<Decimal>,
    pub notes: String,
    pub selected_lot_id: Option<Uuid>,
    pub focused_event: Option<RoastEventType>,
    pub discard_armed: bool,
}
