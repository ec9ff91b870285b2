//! Environment-driven configuration for the reminder service.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// SMTP relay settings. Present only when credentials are configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    /// `None` when SMTP_USER or SMTP_PASS is missing
    pub smtp: Option<SmtpConfig>,
    pub reminder_max_attempts: u32,
    pub reminder_retry_base: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_path = get("DATABASE_PATH").unwrap_or_else(|| "retinacare.db".to_string());
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let smtp = match (get("SMTP_USER"), get("SMTP_PASS")) {
            (Some(username), Some(password)) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .with_context(|| format!("Invalid SMTP_PORT: {raw}"))?,
                    None => 587,
                };
                let timeout_secs = match get("SMTP_TIMEOUT_SECS") {
                    Some(raw) => {
                        let secs = raw
                            .parse::<u64>()
                            .with_context(|| format!("Invalid SMTP_TIMEOUT_SECS: {raw}"))?;
                        if secs == 0 {
                            anyhow::bail!("SMTP_TIMEOUT_SECS must be at least 1");
                        }
                        secs
                    }
                    None => 30,
                };
                Some(SmtpConfig {
                    host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                    port,
                    from: get("SMTP_FROM").unwrap_or_else(|| username.clone()),
                    username,
                    password,
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            _ => None,
        };

        let reminder_max_attempts = match get("REMINDER_MAX_ATTEMPTS") {
            Some(raw) => {
                let attempts = raw
                    .parse::<u32>()
                    .with_context(|| format!("Invalid REMINDER_MAX_ATTEMPTS: {raw}"))?;
                if attempts == 0 {
                    anyhow::bail!("REMINDER_MAX_ATTEMPTS must be at least 1");
                }
                attempts
            }
            None => 3,
        };

        let retry_base_ms = match get("REMINDER_RETRY_BASE_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("Invalid REMINDER_RETRY_BASE_MS: {raw}"))?,
            None => 700,
        };

        Ok(Config {
            database_path,
            log_level,
            smtp,
            reminder_max_attempts,
            reminder_retry_base: Duration::from_millis(retry_base_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_path, "retinacare.db");
        assert_eq!(config.log_level, "info");
        assert!(config.smtp.is_none());
        assert_eq!(config.reminder_max_attempts, 3);
        assert_eq!(config.reminder_retry_base, Duration::from_millis(700));
    }

    #[test]
    fn test_smtp_requires_both_credentials() {
        let config = config_from(&[("SMTP_USER", "clinic@example.com")]).unwrap();
        assert!(config.smtp.is_none());

        let config = config_from(&[("SMTP_USER", "clinic@example.com"), ("SMTP_PASS", "  ")]).unwrap();
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_smtp_configured() {
        let config = config_from(&[
            ("SMTP_USER", "clinic@example.com"),
            ("SMTP_PASS", "secret"),
            ("SMTP_PORT", "2525"),
        ])
        .unwrap();

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.gmail.com");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.from, "clinic@example.com");
        assert_eq!(smtp.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(config_from(&[("REMINDER_MAX_ATTEMPTS", "many")]).is_err());
        assert!(config_from(&[("REMINDER_MAX_ATTEMPTS", "0")]).is_err());
        assert!(config_from(&[("REMINDER_RETRY_BASE_MS", "-5")]).is_err());
        assert!(config_from(&[
            ("SMTP_USER", "a"),
            ("SMTP_PASS", "b"),
            ("SMTP_PORT", "99999"),
        ])
        .is_err());
        assert!(config_from(&[
            ("SMTP_USER", "a"),
            ("SMTP_PASS", "b"),
            ("SMTP_TIMEOUT_SECS", "0"),
        ])
        .is_err());
    }
}
