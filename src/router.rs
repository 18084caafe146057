use axum::{Router, extract::FromRef, routing::get};
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use tower_http::trace::TraceLayer;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::db::LogbookStorage;
use crate::handlers::{accounts, posts};

/// Shared state handed to every handler. Built once at startup.
#[derive(Clone)]
pub struct LogbookState {
    pub storage: LogbookStorage,
    pub sessions: SessionManager,
    key: Key,
}

impl LogbookState {
    pub fn new(storage: LogbookStorage, cfg: &Config) -> Self {
        let sessions = SessionManager::new(storage.clone(), cfg);
        Self {
            storage,
            sessions,
            key: cookie_key(&cfg.secret_key),
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.sessions.secure_cookies()
    }
}

impl FromRef<LogbookState> for Key {
    fn from_ref(state: &LogbookState) -> Self {
        state.key.clone()
    }
}

/// Stretch the configured secret to the 64 bytes the cookie key needs.
fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

pub fn logbook_router(state: LogbookState) -> Router {
    Router::new()
        .route("/", get(posts::list_posts))
        .route("/log/{id}", get(posts::view_post))
        .route("/new/log", get(posts::new_post_form).post(posts::create_post))
        .route("/signup", get(accounts::signup_form).post(accounts::signup))
        .route("/signin", get(accounts::signin_form).post(accounts::signin))
        .route("/logout", get(accounts::logout))
        .fallback(posts::not_found)
        .method_not_allowed_fallback(posts::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
