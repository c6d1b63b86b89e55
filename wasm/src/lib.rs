//! WebAssembly bindings for the roast companion
//!
//! Provides client-side:
//! - The roast session state machine, driven by the page's clock
//! - Unit conversion and yield calculation
//! - Elapsed-time and yield formatting
//!
//! Quantities cross the boundary as decimal strings so nothing is lost to
//! floating point. Timestamps are `Date.now()` values.

use std::str::FromStr;

use rust_decimal::Decimal;
use shared::{
    derive_yield_percent, format_elapsed_ms, format_yield_percent, grams_to_normalized_lbs,
    is_event_sequence_valid, BeginRoastInput, DiscardOutcome, PostRoastInput, RoastEvent,
    RoastEventType, RoastLevel, RoastSession,
};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::debug_1(&JsValue::from_str("roast companion wasm loaded"));
}

fn to_js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|_| format!("{} is not a number: {:?}", field, value))
}

fn parse_event_type(value: &str) -> Result<RoastEventType, String> {
    RoastEventType::from_str(value).ok_or_else(|| format!("Unknown roast event {:?}", value))
}

fn parse_lot_id(value: &str) -> Result<Uuid, String> {
    Uuid::parse_str(value).map_err(|_| format!("Invalid lot id {:?}", value))
}

fn clock(now_ms: f64) -> i64 {
    now_ms as i64
}

/// The in-progress roast, owned by the page
#[wasm_bindgen]
#[derive(Default)]
pub struct WasmRoastSession {
    inner: RoastSession,
}

impl WasmRoastSession {
    fn restore(json: &str) -> Result<Self, String> {
        serde_json::from_str(json)
            .map(|inner| Self { inner })
            .map_err(|err| format!("Invalid session JSON: {}", err))
    }

    fn begin(&mut self, green_weight_grams: &str, lot_id: &str, now_ms: i64) -> Result<bool, String> {
        let input = BeginRoastInput {
            green_weight_grams: Some(parse_decimal("green_weight_grams", green_weight_grams)?),
            lot_id: Some(parse_lot_id(lot_id)?),
        };
        let begin = input.validate().map_err(|err| err.to_string())?;
        Ok(self.inner.begin_roast(begin, now_ms))
    }

    fn post_roast(&mut self, roast_level: &str, roasted_weight_grams: &str) -> Result<bool, String> {
        let level = RoastLevel::from_str(roast_level)
            .ok_or_else(|| format!("Unknown roast level {:?}", roast_level))?;
        let input = PostRoastInput {
            roast_level: Some(level),
            roasted_weight_grams: Some(parse_decimal(
                "roasted_weight_grams",
                roasted_weight_grams,
            )?),
        };
        let post_roast = input
            .validate(self.inner.green_weight_grams())
            .map_err(|err| err.to_string())?;
        Ok(self.inner.record_post_roast(post_roast))
    }

    fn snapshot_json(&self, now_ms: i64) -> Result<String, String> {
        serde_json::to_string(&self.inner.snapshot(now_ms)).map_err(|err| err.to_string())
    }

    fn completed_roast_json(&self) -> Result<String, String> {
        let roast = self.inner.to_completed_roast().map_err(|err| err.to_string())?;
        serde_json::to_string(&roast).map_err(|err| err.to_string())
    }
}

#[wasm_bindgen]
impl WasmRoastSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a session saved with `to_json`; a tampered or inconsistent
    /// session is refused
    pub fn from_json(json: &str) -> Result<WasmRoastSession, JsValue> {
        Self::restore(json).map_err(to_js_error)
    }

    /// Serialize for local storage
    pub fn to_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.inner).map_err(|err| to_js_error(err.to_string()))
    }

    pub fn open_pre_roast(&mut self) -> bool {
        self.inner.open_pre_roast()
    }

    pub fn cancel_pre_roast(&mut self) -> bool {
        self.inner.cancel_pre_roast()
    }

    pub fn begin_roast(
        &mut self,
        green_weight_grams: &str,
        lot_id: &str,
        now_ms: f64,
    ) -> Result<bool, JsValue> {
        self.begin(green_weight_grams, lot_id, clock(now_ms))
            .map_err(to_js_error)
    }

    pub fn mark_first_crack(&mut self, now_ms: f64) -> bool {
        self.inner.mark_first_crack(clock(now_ms))
    }

    pub fn mark_drop(&mut self, now_ms: f64) -> bool {
        self.inner.mark_drop(clock(now_ms))
    }

    pub fn stop(&mut self, now_ms: f64) -> bool {
        self.inner.stop(clock(now_ms))
    }

    pub fn delete_marker(&mut self, event_type: &str) -> Result<bool, JsValue> {
        let kind = parse_event_type(event_type).map_err(to_js_error)?;
        Ok(self.inner.delete_marker(kind))
    }

    /// Pass `undefined` to clear the focus
    pub fn focus_marker(&mut self, event_type: Option<String>) -> Result<bool, JsValue> {
        let kind = event_type
            .as_deref()
            .map(parse_event_type)
            .transpose()
            .map_err(to_js_error)?;
        Ok(self.inner.focus_marker(kind))
    }

    pub fn record_post_roast(
        &mut self,
        roast_level: &str,
        roasted_weight_grams: &str,
    ) -> Result<bool, JsValue> {
        self.post_roast(roast_level, roasted_weight_grams)
            .map_err(to_js_error)
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.inner.set_notes(notes);
    }

    pub fn set_selected_lot(&mut self, lot_id: Option<String>) -> Result<bool, JsValue> {
        let lot_id = lot_id
            .as_deref()
            .map(parse_lot_id)
            .transpose()
            .map_err(to_js_error)?;
        Ok(self.inner.set_selected_lot(lot_id))
    }

    /// Only applies in review
    pub fn reset_session(&mut self) -> bool {
        self.inner.reset_session()
    }

    /// `"ignored"`, `"armed"` or `"discarded"`
    pub fn discard(&mut self) -> String {
        match self.inner.discard() {
            DiscardOutcome::Ignored => "ignored",
            DiscardOutcome::Armed => "armed",
            DiscardOutcome::Discarded => "discarded",
        }
        .to_string()
    }

    pub fn can_mark_first_crack(&self) -> bool {
        self.inner.can_mark_first_crack()
    }

    pub fn can_mark_drop(&self) -> bool {
        self.inner.can_mark_drop()
    }

    pub fn can_stop(&self) -> bool {
        self.inner.can_stop()
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    /// Session state at `now_ms` as JSON
    pub fn snapshot(&self, now_ms: f64) -> Result<String, JsValue> {
        self.snapshot_json(clock(now_ms)).map_err(to_js_error)
    }

    /// The record to send to the server, as JSON; fails outside review
    pub fn to_completed_roast(&self) -> Result<String, JsValue> {
        self.completed_roast_json().map_err(to_js_error)
    }
}

/// Grams to pounds, rounded to 3 places; `undefined` for bad input
#[wasm_bindgen]
pub fn grams_to_lbs(grams: &str) -> Option<String> {
    parse_decimal("grams", grams)
        .ok()
        .map(|grams| grams_to_normalized_lbs(grams).to_string())
}

/// Yield percentage from weights; `undefined` when either weight is not positive
#[wasm_bindgen]
pub fn calculate_yield_percent(green_weight_grams: &str, roasted_weight_grams: &str) -> Option<String> {
    let green = parse_decimal("green_weight_grams", green_weight_grams).ok()?;
    let roasted = parse_decimal("roasted_weight_grams", roasted_weight_grams).ok()?;
    derive_yield_percent(green, roasted).map(|value| value.to_string())
}

/// `m:ss`
#[wasm_bindgen]
pub fn format_elapsed(elapsed_ms: f64) -> String {
    format_elapsed_ms(clock(elapsed_ms))
}

/// `84.7%`, or `--` when absent
#[wasm_bindgen]
pub fn format_yield(yield_percent: Option<String>) -> String {
    let value = yield_percent
        .as_deref()
        .and_then(|value| parse_decimal("yield_percent", value).ok());
    format_yield_percent(value)
}

/// Check an event log given as JSON
#[wasm_bindgen]
pub fn validate_event_log(events_json: &str) -> bool {
    serde_json::from_str::<Vec<RoastEvent>>(events_json)
        .map(|events| is_event_sequence_valid(&events))
        .unwrap_or(false)
}
