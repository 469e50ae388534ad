use std::env;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_EARLY_JOIN_MINUTES: i64 = 15;
pub const DEFAULT_LATE_JOIN_MINUTES: i64 = 60;
pub const DEFAULT_PRESENCE_POLL_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_PRESENCE_ESCALATION_THRESHOLD: u32 = 3;

/// Upper bound for either side of the join window (one week).
pub const MAX_JOIN_WINDOW_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub early_join_minutes: i64,
    pub late_join_minutes: i64,
    pub presence_poll_interval_ms: u64,
    pub presence_escalation_threshold: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            early_join_minutes: DEFAULT_EARLY_JOIN_MINUTES,
            late_join_minutes: DEFAULT_LATE_JOIN_MINUTES,
            presence_poll_interval_ms: DEFAULT_PRESENCE_POLL_INTERVAL_MS,
            presence_escalation_threshold: DEFAULT_PRESENCE_ESCALATION_THRESHOLD,
        }
    }
}

impl AppConfig {
    /// Applies a `.env` file when one is present, then reads the environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so callers (and tests)
    /// don't have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            early_join_minutes: read_var(
                &lookup,
                "TELEHEALTH_EARLY_JOIN_MINUTES",
                defaults.early_join_minutes,
                |minutes| (0..=MAX_JOIN_WINDOW_MINUTES).contains(minutes),
            ),
            late_join_minutes: read_var(
                &lookup,
                "TELEHEALTH_LATE_JOIN_MINUTES",
                defaults.late_join_minutes,
                |minutes| (0..=MAX_JOIN_WINDOW_MINUTES).contains(minutes),
            ),
            presence_poll_interval_ms: read_var(
                &lookup,
                "PRESENCE_POLL_INTERVAL_MS",
                defaults.presence_poll_interval_ms,
                |ms| *ms > 0,
            ),
            presence_escalation_threshold: read_var(
                &lookup,
                "PRESENCE_ESCALATION_THRESHOLD",
                defaults.presence_escalation_threshold,
                |_| true,
            ),
        };

        if config != defaults {
            info!(?config, "Telehealth configuration overridden from environment");
        }

        config
    }
}

fn read_var<T, F, V>(lookup: &F, key: &str, default: T, valid: V) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        Ok(_) => {
            warn!("{} out of range ({}), using default {}", key, raw, default);
            default
        }
        Err(_) => {
            warn!("{} is not a valid number ({}), using default {}", key, raw, default);
            default
        }
    }
}
