//! HTTP handler for the passcode gate

use axum::{body::Bytes, extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::access::{access_token, passcode_matches, unlock_cookie};
use crate::AppState;

/// Unlock request body
#[derive(Debug, Deserialize)]
pub struct UnlockInput {
    pub passcode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub ok: bool,
}

/// Exchange the passcode for an unlock cookie.
///
/// A body that is not JSON counts as a wrong passcode.
pub async fn unlock(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<UnlockResponse>)> {
    let attempt = serde_json::from_slice::<UnlockInput>(&body)
        .ok()
        .and_then(|input| input.passcode);
    let configured = state.config.access.passcode.as_deref();

    if !passcode_matches(configured, attempt.as_deref()) {
        tracing::warn!("Rejected unlock attempt");
        return Err(AppError::IncorrectPasscode);
    }

    let token = configured
        .and_then(access_token)
        .ok_or_else(|| AppError::Internal("Could not derive access token".to_string()))?;

    tracing::info!("Unlocked access");
    let jar = jar.add(unlock_cookie(token, state.config.access.secure_cookie));
    Ok((jar, Json(UnlockResponse { ok: true })))
}
