use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::Utc;
use tracing::{debug, info};

use super::{build_cookie, clear_cookie, random_token};
use crate::config::Config;
use crate::db::{DbSession, LogbookStorage, User};
use crate::error::LogbookError;

pub const SESSION_COOKIE: &str = "logbook_session";

/// Maps browsers to signed-in users.
///
/// The browser holds an opaque token in an encrypted private cookie; the token
/// is resolved against the `sessions` table on every request, so ending a
/// session server-side invalidates the cookie even if the browser keeps it.
#[derive(Clone)]
pub struct SessionManager {
    storage: LogbookStorage,
    secure: bool,
    session_ttl_secs: i64,
    remember_ttl_secs: i64,
}

impl SessionManager {
    pub fn new(storage: LogbookStorage, cfg: &Config) -> Self {
        Self {
            storage,
            secure: !cfg.insecure_cookie,
            session_ttl_secs: cfg.session_hours.saturating_mul(3600),
            remember_ttl_secs: cfg.remember_days.saturating_mul(86_400),
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure
    }

    /// Start a session for `user_id`. With `remember` the cookie survives
    /// browser restarts; otherwise it is dropped when the browser closes.
    pub async fn authenticate(
        &self,
        jar: PrivateCookieJar,
        user_id: i64,
        remember: bool,
    ) -> Result<PrivateCookieJar, LogbookError> {
        self.authenticate_at(jar, user_id, remember, Utc::now().timestamp())
            .await
    }

    async fn authenticate_at(
        &self,
        jar: PrivateCookieJar,
        user_id: i64,
        remember: bool,
        now: i64,
    ) -> Result<PrivateCookieJar, LogbookError> {
        let purged = self.storage.purge_expired_sessions(now).await?;
        if purged > 0 {
            debug!(purged, "expired sessions removed");
        }

        let ttl = if remember {
            self.remember_ttl_secs
        } else {
            self.session_ttl_secs
        };
        let session = DbSession {
            token: random_token(),
            user_id,
            remember,
            created_at: now,
            expires_at: now.saturating_add(ttl),
        };
        self.storage.create_session(&session).await?;
        info!(user_id, remember, "session started");

        let max_age = remember.then(|| time::Duration::seconds(ttl));
        Ok(jar.add(build_cookie(
            SESSION_COOKIE,
            session.token,
            self.secure,
            max_age,
        )))
    }

    /// Resolve the request's session cookie to a user. Missing, tampered,
    /// unknown and expired tokens all resolve to `None`.
    pub async fn current_user(&self, jar: &PrivateCookieJar) -> Result<Option<User>, LogbookError> {
        self.current_user_at(jar, Utc::now().timestamp()).await
    }

    async fn current_user_at(
        &self,
        jar: &PrivateCookieJar,
        now: i64,
    ) -> Result<Option<User>, LogbookError> {
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) else {
            return Ok(None);
        };
        self.storage.find_session_user(&token, now).await
    }

    /// Drop the server-side session and remove the cookie.
    pub async fn end_session(&self, jar: PrivateCookieJar) -> Result<PrivateCookieJar, LogbookError> {
        if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) {
            let removed = self.storage.delete_session(&token).await?;
            info!(removed, "session ended");
        }
        Ok(jar.remove(clear_cookie(SESSION_COOKIE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::{Cookie, Key};

    async fn setup() -> (SessionManager, User) {
        let storage = LogbookStorage::connect("sqlite::memory:").await.unwrap();
        let user = storage
            .create_user("alice1", "alice@example.com", "hash")
            .await
            .unwrap();
        (SessionManager::new(storage, &Config::default()), user)
    }

    fn jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::generate())
    }

    #[tokio::test]
    async fn anonymous_jar_has_no_user() {
        let (sessions, _) = setup().await;
        assert_eq!(sessions.current_user(&jar()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn authenticated_jar_resolves_to_user() {
        let (sessions, user) = setup().await;
        let jar = sessions.authenticate(jar(), user.id, false).await.unwrap();
        assert_eq!(sessions.current_user(&jar).await.unwrap(), Some(user));

        let cookie = jar.get(SESSION_COOKIE).expect("session cookie");
        assert!(cookie.max_age().is_none());
    }

    #[tokio::test]
    async fn remember_me_sets_persistent_cookie() {
        let (sessions, user) = setup().await;
        let jar = sessions.authenticate(jar(), user.id, true).await.unwrap();
        let cookie = jar.get(SESSION_COOKIE).expect("session cookie");
        assert_eq!(cookie.max_age(), Some(time::Duration::days(365)));
    }

    #[tokio::test]
    async fn sessions_expire() {
        let (sessions, user) = setup().await;
        let jar = sessions
            .authenticate_at(jar(), user.id, false, 1_000)
            .await
            .unwrap();
        let ttl = 24 * 3600;
        assert!(
            sessions
                .current_user_at(&jar, 1_000 + ttl - 1)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            sessions
                .current_user_at(&jar, 1_000 + ttl)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn ended_session_no_longer_resolves() {
        let (sessions, user) = setup().await;
        let jar = sessions.authenticate(jar(), user.id, false).await.unwrap();
        let stolen = jar.clone();

        let jar = sessions.end_session(jar).await.unwrap();
        assert!(jar.get(SESSION_COOKIE).is_none());
        // A copy of the old cookie is useless once the row is gone.
        assert_eq!(sessions.current_user(&stolen).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_token_is_anonymous() {
        let (sessions, _) = setup().await;
        let jar = jar().add(Cookie::new(SESSION_COOKIE, "forged"));
        assert_eq!(sessions.current_user(&jar).await.unwrap(), None);
    }
}
