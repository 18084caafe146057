use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use tracing::debug;

use crate::db::User;
use crate::router::LogbookState;

pub const SIGNIN_PATH: &str = "/signin";

/// Resolve the session cookie on an inbound request to its user.
pub async fn resolve_user(parts: &mut Parts, state: &LogbookState) -> Result<Option<User>, Response> {
    let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
        Ok(jar) => jar,
        Err(never) => match never {},
    };
    state
        .sessions
        .current_user(&jar)
        .await
        .map_err(IntoResponse::into_response)
}

/// The signed-in user, if any.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl FromRequestParts<LogbookState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &LogbookState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_user(parts, state).await?))
    }
}

/// Guard for routes that need a signed-in user.
/// Anonymous requests are redirected to the sign-in page before the handler runs.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl FromRequestParts<LogbookState> for RequireUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &LogbookState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state).await? {
            Some(user) => Ok(Self(user)),
            None => {
                debug!(path = %parts.uri.path(), "anonymous request to protected route");
                Err(Redirect::to(SIGNIN_PATH).into_response())
            }
        }
    }
}
