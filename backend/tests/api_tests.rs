//! HTTP API tests
//!
//! Drives the full router in-process:
//! - Passcode gate (lock, unlock, forged cookies)
//! - A complete roast from pre-roast to saved ledger entry
//! - Error envelopes for validation and missing records

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use roast_companion_backend::config::{AccessConfig, Config};
use roast_companion_backend::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

const PASSCODE: &str = "espresso";

async fn setup_app() -> Router {
    let pool = common::setup_db().await;
    let config = Config {
        access: AccessConfig {
            passcode: Some(PASSCODE.to_string()),
            secure_cookie: false,
        },
        ..Default::default()
    };
    create_app(AppState::new(pool, config))
}

/// Send one request; returns status, the raw `set-cookie` header and the JSON body
async fn send(
    app: &Router,
    method: Method,
    path: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(json_body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string());

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, set_cookie, json_body)
}

/// Unlock and return the `name=value` pair to send back as a Cookie header
async fn unlock(app: &Router) -> String {
    let (status, set_cookie, _) = send(
        app,
        Method::POST,
        "/api/v1/access/unlock",
        None,
        Some(json!({ "passcode": PASSCODE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let set_cookie = set_cookie.expect("unlock should set a cookie");
    set_cookie.split(';').next().unwrap().to_string()
}

// ============================================================================
// Access Gate
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = setup_app().await;

    let (status, _, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    let (status, _, _) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

/// A closed pool reports degraded rather than healthy
#[tokio::test]
async fn test_health_degraded_without_database() {
    let pool = common::setup_db().await;
    let app = create_app(AppState::new(pool.clone(), Config::default()));
    pool.close().await;

    let (status, _, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_locked_without_cookie() {
    let app = setup_app().await;

    let (status, _, body) = send(&app, Method::GET, "/api/v1/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "LOCKED");
}

#[tokio::test]
async fn test_wrong_passcode_rejected() {
    let app = setup_app().await;

    let (status, set_cookie, body) = send(
        &app,
        Method::POST,
        "/api/v1/access/unlock",
        None,
        Some(json!({ "passcode": "decaf" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INCORRECT_PASSCODE");
    assert!(set_cookie.is_none());

    let (status, _, _) = send(&app, Method::POST, "/api/v1/access/unlock", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unlock_cookie_grants_access() {
    let app = setup_app().await;
    let cookie = unlock(&app).await;
    assert!(cookie.starts_with("rt_unlocked="));

    let (status, _, body) = send(&app, Method::GET, "/api/v1/session", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["flow_step"], "idle");
    assert_eq!(body["is_running"], false);
}

#[tokio::test]
async fn test_forged_cookie_rejected() {
    let app = setup_app().await;

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/api/v1/lots",
        Some("rt_unlocked=true"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Roast Flow
// ============================================================================

/// Pre-roast to saved roast, then delete it again
#[tokio::test]
async fn test_complete_roast_over_http() {
    let app = setup_app().await;
    let cookie = unlock(&app).await;
    let cookie = Some(cookie.as_str());

    let (status, _, coffee) = send(
        &app,
        Method::POST,
        "/api/v1/coffees",
        cookie,
        Some(json!({ "name": "Kenya AA", "origin": "Nyeri", "process": "Washed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, lot) = send(
        &app,
        Method::POST,
        "/api/v1/lots",
        cookie,
        Some(json!({
            "coffee_id": coffee["id"],
            "label": "Nyeri 2024",
            "starting_inventory_lbs": "10"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lot["current_inventory_lbs"], "10.000");
    let lot_id = lot["id"].as_str().unwrap().to_string();

    let (_, _, view) = send(&app, Method::POST, "/api/v1/session/open", cookie, None).await;
    assert_eq!(view["applied"], true);
    assert_eq!(view["session"]["flow_step"], "preRoast");

    let (status, _, view) = send(
        &app,
        Method::POST,
        "/api/v1/session/begin",
        cookie,
        Some(json!({ "green_weight_grams": "453.592", "lot_id": lot_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["applied"], true);
    assert_eq!(view["session"]["flow_step"], "running");
    assert_eq!(view["session"]["can_mark_first_crack"], true);

    for step in ["first-crack", "drop", "stop"] {
        let path = format!("/api/v1/session/{}", step);
        let (_, _, view) = send(&app, Method::POST, &path, cookie, None).await;
        assert_eq!(view["applied"], true, "step {}", step);
    }

    let (_, _, view) = send(
        &app,
        Method::POST,
        "/api/v1/session/post-roast",
        cookie,
        Some(json!({ "roast_level": "Medium", "roasted_weight_grams": "385" })),
    )
    .await;
    assert_eq!(view["session"]["flow_step"], "review");

    let (_, _, view) = send(
        &app,
        Method::POST,
        "/api/v1/session/notes",
        cookie,
        Some(json!({ "notes": "bright, juicy" })),
    )
    .await;
    assert_eq!(view["session"]["notes"], "bright, juicy");

    let (status, _, saved) = send(&app, Method::POST, "/api/v1/session/save", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["session"]["flow_step"], "idle");
    assert_eq!(saved["roast"]["notes"], "bright, juicy");
    let roast_id = saved["roast"]["id"].as_str().unwrap().to_string();

    let lot_path = format!("/api/v1/lots/{}", lot_id);
    let (_, _, lot) = send(&app, Method::GET, &lot_path, cookie, None).await;
    assert_eq!(lot["current_inventory_lbs"], "9.000");

    let list_path = format!("/api/v1/roasts?lot_id={}&roast_level=Medium", lot_id);
    let (status, _, roasts) = send(&app, Method::GET, &list_path, cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roasts.as_array().unwrap().len(), 1);

    let (_, _, latest) = send(&app, Method::GET, "/api/v1/roasts/latest", cookie, None).await;
    assert_eq!(latest["id"], roast_id.as_str());

    let roast_path = format!("/api/v1/roasts/{}", roast_id);
    let (_, _, deleted) = send(&app, Method::DELETE, &roast_path, cookie, None).await;
    assert_eq!(deleted["deleted"], true);

    let (_, _, lot) = send(&app, Method::GET, &lot_path, cookie, None).await;
    assert_eq!(lot["current_inventory_lbs"], "10.000");
}

/// Out-of-order actions answer 200 with `applied: false`
#[tokio::test]
async fn test_rejected_transition_is_not_an_error() {
    let app = setup_app().await;
    let cookie = unlock(&app).await;

    let (status, _, view) = send(
        &app,
        Method::POST,
        "/api/v1/session/drop",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["applied"], false);
    assert_eq!(view["session"]["flow_step"], "idle");
}

#[tokio::test]
async fn test_adjustments_over_http() {
    let app = setup_app().await;
    let cookie = unlock(&app).await;
    let cookie = Some(cookie.as_str());

    let (_, _, coffee) = send(
        &app,
        Method::POST,
        "/api/v1/coffees",
        cookie,
        Some(json!({ "name": "Brazil Cerrado", "process": "Natural" })),
    )
    .await;
    let (_, _, lot) = send(
        &app,
        Method::POST,
        "/api/v1/lots",
        cookie,
        Some(json!({
            "coffee_id": coffee["id"],
            "label": "Cerrado",
            "starting_inventory_lbs": "1"
        })),
    )
    .await;
    let adjustments_path = format!("/api/v1/lots/{}/adjustments", lot["id"].as_str().unwrap());

    let (status, _, adjustment) = send(
        &app,
        Method::POST,
        &adjustments_path,
        cookie,
        Some(json!({ "amount_lbs": "-1.5", "reason": "correction" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(adjustment["reason"], "correction");

    let (_, _, history) = send(&app, Method::GET, &adjustments_path, cookie, None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (_, _, summaries) = send(&app, Method::GET, "/api/v1/lots/summary", cookie, None).await;
    let summary = &summaries.as_array().unwrap()[0];
    assert_eq!(summary["is_negative"], true);
    assert_eq!(summary["coffee_name"], "Brazil Cerrado");
    assert_eq!(summary["lot"]["current_inventory_lbs"], "-0.500");
}

// ============================================================================
// Error Envelopes
// ============================================================================

#[tokio::test]
async fn test_validation_error_names_field() {
    let app = setup_app().await;
    let cookie = unlock(&app).await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/v1/session/begin",
        Some(&cookie),
        Some(json!({ "lot_id": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "green_weight_grams");
}

#[tokio::test]
async fn test_unknown_marker_type() {
    let app = setup_app().await;
    let cookie = unlock(&app).await;

    let (status, _, body) = send(
        &app,
        Method::DELETE,
        "/api/v1/session/markers/CRACK",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "type");
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let app = setup_app().await;
    let cookie = unlock(&app).await;

    let path = format!("/api/v1/lots/{}", uuid::Uuid::new_v4());
    let (status, _, body) = send(&app, Method::GET, &path, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let path = format!("/api/v1/roasts/{}", uuid::Uuid::new_v4());
    let (status, _, _) = send(&app, Method::GET, &path, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
