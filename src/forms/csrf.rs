//! Per-browser CSRF tokens for HTML forms.
//!
//! The token lives in a private cookie and is echoed back in a hidden form
//! field; a submission is accepted only when the two match.

use axum_extra::extract::cookie::PrivateCookieJar;
use subtle::ConstantTimeEq;

use super::FieldErrors;
use crate::auth::{build_cookie, random_token};

pub const CSRF_COOKIE: &str = "logbook_csrf";
pub const CSRF_FIELD: &str = "csrf_token";

/// Return the browser's token, minting and storing a new one if needed.
pub fn issue(jar: PrivateCookieJar, secure: bool) -> (PrivateCookieJar, String) {
    if let Some(token) = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned()) {
        return (jar, token);
    }
    let token = random_token();
    let jar = jar.add(build_cookie(CSRF_COOKIE, token.clone(), secure, None));
    (jar, token)
}

pub fn check(jar: &PrivateCookieJar, submitted: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if submitted.is_empty() {
        errors.push(CSRF_FIELD, "The CSRF token is missing.");
        return Err(errors);
    }
    let Some(expected) = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned()) else {
        errors.push(CSRF_FIELD, "The CSRF session token is missing.");
        return Err(errors);
    };
    if !bool::from(submitted.as_bytes().ct_eq(expected.as_bytes())) {
        errors.push(CSRF_FIELD, "The CSRF token is invalid.");
        return Err(errors);
    }
    Ok(())
}
