//! Credentials and sessions.

pub mod password;
pub mod session;

pub use session::{SESSION_COOKIE, SessionManager};

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;

/// 256 bits of randomness, URL-safe base64 without padding.
pub fn random_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Cookie with the attributes shared by every logbook cookie.
/// Without `max_age` the cookie lives for the browser session.
pub fn build_cookie(
    name: &'static str,
    value: String,
    secure: bool,
    max_age: Option<time::Duration>,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);
    if let Some(age) = max_age {
        builder = builder.max_age(age);
    }
    builder.build()
}

pub fn clear_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}
