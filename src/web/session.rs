// Session cookie handling.
//
// The cookie carries only the opaque token; the session itself lives in the
// account service's session store.

use super::error::ApiError;
use super::AppState;
use crate::core::accounts::Session;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const SESSION_COOKIE: &str = "session";

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Add the removal cookie for the session (expired, empty value).
pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// The logged-in session for this request, if any.
pub async fn current_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<Session>, ApiError> {
    let Some(token) = session_token(jar) else {
        return Ok(None);
    };
    Ok(state.accounts.current_session(&token).await?)
}

/// Like `current_session`, but a missing session is a 401 with `message`.
pub async fn require_session(
    state: &AppState,
    jar: &CookieJar,
    message: &str,
) -> Result<Session, ApiError> {
    current_session(state, jar)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(message.to_string()))
}
