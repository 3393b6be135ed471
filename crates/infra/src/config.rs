//! Environment-driven configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ORDERDESK_DATABASE_URL` (falls back to `DATABASE_URL`) | unset: in-memory store |
//! | `ORDERDESK_TRACKING_PREFIX` | `ORD` |
//! | `ORDERDESK_TRACKING_MAX_ATTEMPTS` | `20` |
//! | `ORDERDESK_TRANSITIONS` | `permissive` (or `forward-only`) |
//! | `ORDERDESK_LOG` | unset: `RUST_LOG`, then `info` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderdesk_orders::{TrackingCode, TransitionPolicy};

use crate::lifecycle::{DEFAULT_TRACKING_ATTEMPTS, DEFAULT_TRACKING_PREFIX};

pub const ENV_DATABASE_URL: &str = "ORDERDESK_DATABASE_URL";
pub const ENV_DATABASE_URL_FALLBACK: &str = "DATABASE_URL";
pub const ENV_TRACKING_PREFIX: &str = "ORDERDESK_TRACKING_PREFIX";
pub const ENV_TRACKING_MAX_ATTEMPTS: &str = "ORDERDESK_TRACKING_MAX_ATTEMPTS";
pub const ENV_TRANSITIONS: &str = "ORDERDESK_TRANSITIONS";
pub const ENV_LOG: &str = "ORDERDESK_LOG";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub tracking_prefix: String,
    pub tracking_max_attempts: u32,
    pub transitions: TransitionPolicy,
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            tracking_prefix: DEFAULT_TRACKING_PREFIX.to_string(),
            tracking_max_attempts: DEFAULT_TRACKING_ATTEMPTS,
            transitions: TransitionPolicy::default(),
            log_filter: None,
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let tracking_prefix = match get(ENV_TRACKING_PREFIX) {
            Some(prefix) => {
                TrackingCode::check_prefix(&prefix).map_err(|e| ConfigError::Invalid {
                    key: ENV_TRACKING_PREFIX,
                    value: prefix.clone(),
                    reason: e.to_string(),
                })?;
                prefix
            }
            None => defaults.tracking_prefix,
        };

        let tracking_max_attempts = match get(ENV_TRACKING_MAX_ATTEMPTS) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: ENV_TRACKING_MAX_ATTEMPTS,
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    });
                }
            },
            None => defaults.tracking_max_attempts,
        };

        let transitions = match get(ENV_TRANSITIONS) {
            Some(raw) => raw.parse().map_err(|e: orderdesk_core::DomainError| ConfigError::Invalid {
                key: ENV_TRANSITIONS,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.transitions,
        };

        Ok(Self {
            database_url: get(ENV_DATABASE_URL).or_else(|| get(ENV_DATABASE_URL_FALLBACK)),
            tracking_prefix,
            tracking_max_attempts,
            transitions,
            log_filter: get(ENV_LOG),
        })
    }
}
