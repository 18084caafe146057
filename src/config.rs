//! Layered runtime configuration.
//!
//! Sources, lowest precedence first:
//! - built-in defaults (`Config::default()`)
//! - `logbook.toml` in the working directory, if present
//! - environment variables prefixed with `LOGBOOK_` (e.g. `LOGBOOK_DATABASE_URL`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::LogbookError;

pub const CONFIG_FILE: &str = "logbook.toml";
pub const ENV_PREFIX: &str = "LOGBOOK_";

/// Session signing secret used when none is configured.
/// Deployments are expected to override it through `LOGBOOK_SECRET_KEY`.
pub const DEFAULT_SECRET_KEY: &str = "superSecret";

/// Upper bounds for session lifetimes; keep expiry timestamps far from `i64` overflow.
pub const MAX_SESSION_HOURS: i64 = 24 * 365;
pub const MAX_REMEMBER_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    pub secret_key: String,
    /// Drop the `Secure` attribute from cookies, for plain-http local runs.
    pub insecure_cookie: bool,
    /// Lifetime of a session created without "remember me".
    pub session_hours: i64,
    /// Lifetime of a session created with "remember me".
    pub remember_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
            database_url: "sqlite:logbook.db".to_string(),
            loglevel: "info".to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            insecure_cookie: false,
            session_hours: 24,
            remember_days: 365,
        }
    }
}

impl Config {
    /// Load configuration from defaults, `logbook.toml` and the environment.
    pub fn load() -> Result<Self, LogbookError> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, LogbookError> {
        let cfg: Config = figment.extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), LogbookError> {
        if self.secret_key.is_empty() {
            return Err(LogbookError::InvalidConfig(
                "secret_key must not be empty".to_string(),
            ));
        }
        if !(1..=MAX_SESSION_HOURS).contains(&self.session_hours) {
            return Err(LogbookError::InvalidConfig(format!(
                "session_hours must be between 1 and {MAX_SESSION_HOURS}"
            )));
        }
        if !(1..=MAX_REMEMBER_DAYS).contains(&self.remember_days) {
            return Err(LogbookError::InvalidConfig(format!(
                "remember_days must be between 1 and {MAX_REMEMBER_DAYS}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::Serialized;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::from_figment(Figment::from(Serialized::defaults(Config::default())))
            .expect("defaults should load");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.remember_days, 365);
    }

    #[test]
    fn overrides_are_merged_over_defaults() {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("database_url", "sqlite::memory:"))
            .merge(Serialized::default("insecure_cookie", true));
        let cfg = Config::from_figment(figment).expect("config should load");
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert!(cfg.insecure_cookie);
        assert_eq!(cfg.loglevel, "info");
    }

    #[test]
    fn empty_secret_is_rejected() {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("secret_key", ""));
        let err = Config::from_figment(figment).unwrap_err();
        assert!(matches!(err, LogbookError::InvalidConfig(_)));
    }

    #[test]
    fn non_positive_lifetimes_are_rejected() {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("session_hours", 0));
        assert!(Config::from_figment(figment).is_err());
    }

    #[test]
    fn oversized_lifetimes_are_rejected() {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("remember_days", i64::MAX));
        let err = Config::from_figment(figment).unwrap_err();
        assert!(matches!(err, LogbookError::InvalidConfig(_)));

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("session_hours", MAX_SESSION_HOURS + 1));
        assert!(Config::from_figment(figment).is_err());

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Serialized::default("remember_days", MAX_REMEMBER_DAYS));
        assert!(Config::from_figment(figment).is_ok());
    }
}
