use base64::Engine;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AgencyError;

/// Runtime configuration.
///
/// Layering: built-in defaults, then `DATABASE_URL`, then any `AGENCY_*`
/// variable (e.g. `AGENCY_LISTEN_ADDR`, `AGENCY_SESSION_KEY`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    /// Base64-encoded cookie key material, at least 64 bytes once decoded.
    pub session_key: Option<String>,
    pub insecure_cookie: bool,
    pub remember_days: i64,
    pub wkhtmltopdf: String,
    pub pdf_timeout_secs: u64,
    pub login_attempts_per_minute: u32,
    pub case_sensitive_search: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:agency.db".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            session_key: None,
            insecure_cookie: false,
            remember_days: 365,
            wkhtmltopdf: "wkhtmltopdf".to_string(),
            pdf_timeout_secs: 30,
            login_attempts_per_minute: 10,
            case_sensitive_search: false,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["database_url"]))
            .merge(Env::prefixed("AGENCY_"))
    }

    pub fn load() -> Result<Self, AgencyError> {
        Self::figment()
            .extract()
            .map_err(|e| AgencyError::Config(e.to_string()))
    }

    /// Decoded session key bytes, if one is configured.
    pub fn session_key_bytes(&self) -> Result<Option<Vec<u8>>, AgencyError> {
        let Some(encoded) = self.session_key.as_deref() else {
            return Ok(None);
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| AgencyError::Config(format!("session_key is not valid base64: {e}")))?;
        if bytes.len() < 64 {
            return Err(AgencyError::Config(format!(
                "session_key must decode to at least 64 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Some(bytes))
    }

    pub fn pdf_timeout(&self) -> Duration {
        Duration::from_secs(self.pdf_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_apply_without_environment() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.database_url, "sqlite:agency.db");
            assert_eq!(cfg.remember_days, 365);
            assert!(!cfg.case_sensitive_search);
            Ok(())
        });
    }

    #[test]
    fn database_url_and_prefixed_keys_override_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "sqlite::memory:");
            jail.set_env("AGENCY_LISTEN_ADDR", "127.0.0.1:9000");
            jail.set_env("AGENCY_CASE_SENSITIVE_SEARCH", "true");
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.database_url, "sqlite::memory:");
            assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
            assert!(cfg.case_sensitive_search);
            Ok(())
        });
    }

    #[test]
    fn short_session_key_is_rejected() {
        let cfg = Config {
            session_key: Some(base64::engine::general_purpose::STANDARD.encode([7u8; 16])),
            ..Config::default()
        };
        assert!(matches!(cfg.session_key_bytes(), Err(AgencyError::Config(_))));
    }

    #[test]
    fn long_session_key_decodes() {
        let cfg = Config {
            session_key: Some(base64::engine::general_purpose::STANDARD.encode([7u8; 64])),
            ..Config::default()
        };
        let bytes = cfg.session_key_bytes().unwrap().unwrap();
        assert_eq!(bytes.len(), 64);
    }
}
