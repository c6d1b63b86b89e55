//! Passcode gate
//!
//! Unlocking sets the `rt_unlocked` cookie to an HMAC-SHA256 tag keyed by the
//! configured passcode. The cookie cannot be minted without the passcode and
//! stops verifying as soon as the passcode changes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AppError;
use crate::AppState;

pub const ACCESS_COOKIE: &str = "rt_unlocked";

const TAG_MESSAGE: &[u8] = b"rt_unlocked";

type HmacSha256 = Hmac<Sha256>;

fn mac_for(passcode: &str) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(passcode.as_bytes()).ok()
}

/// Cookie value proving the passcode was entered
pub fn access_token(passcode: &str) -> Option<String> {
    let mut mac = mac_for(passcode)?;
    mac.update(TAG_MESSAGE);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a cookie value against the passcode
pub fn verify_access_token(passcode: &str, token: &str) -> bool {
    let Ok(tag) = BASE64.decode(token) else {
        return false;
    };
    match mac_for(passcode) {
        Some(mut mac) => {
            mac.update(TAG_MESSAGE);
            mac.verify_slice(&tag).is_ok()
        }
        None => false,
    }
}

/// True when `attempt` matches the configured passcode
pub fn passcode_matches(configured: Option<&str>, attempt: Option<&str>) -> bool {
    match (configured, attempt) {
        (Some(expected), Some(attempt)) => !expected.is_empty() && expected == attempt,
        _ => false,
    }
}

/// Build the unlock cookie
pub fn unlock_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build()
}

/// Middleware rejecting requests without a valid unlock cookie
pub async fn require_unlock(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let unlocked = match (state.config.access.passcode.as_deref(), jar.get(ACCESS_COOKIE)) {
        (Some(passcode), Some(cookie)) => verify_access_token(passcode, cookie.value()),
        _ => false,
    };

    if !unlocked {
        tracing::debug!(path = %request.uri().path(), "Request blocked by passcode gate");
        return AppError::Locked.into_response();
    }

    next.run(request).await
}
