// =====================================================================================
// PRESENCE CELL MODELS
// =====================================================================================

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::{AppConfig, DEFAULT_PRESENCE_ESCALATION_THRESHOLD, DEFAULT_PRESENCE_POLL_INTERVAL_MS};

// -------------------------------------------------------------------------------------
// Channels
// -------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    #[serde(alias = "joining")]
    Connecting,
    Joined,
    Closed,
    Errored,
}

impl ChannelState {
    /// Joined and still-joining channels count as healthy; anything else is degraded.
    pub fn is_healthy(&self) -> bool {
        matches!(self, ChannelState::Connecting | ChannelState::Joined)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Joined => write!(f, "joined"),
            ChannelState::Closed => write!(f, "closed"),
            ChannelState::Errored => write!(f, "errored"),
        }
    }
}

/// Snapshot of one realtime subscription as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    pub id: Uuid,
    pub topic: String,
    pub state: ChannelState,
}

impl ChannelHandle {
    pub fn new(topic: impl Into<String>, state: ChannelState) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            state,
        }
    }
}

// -------------------------------------------------------------------------------------
// Verdicts
// -------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    Healthy,
    NoChannels,
    Degraded,
    Escalating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceVerdict {
    pub state: PresenceState,
    pub connected: bool,
    pub consecutive_bad_samples: u32,
    pub channel_count: usize,
    pub degraded_channels: usize,
}

impl PresenceVerdict {
    /// Verdict before the first sample.
    pub fn initial() -> Self {
        Self {
            state: PresenceState::Healthy,
            connected: true,
            consecutive_bad_samples: 0,
            channel_count: 0,
            degraded_channels: 0,
        }
    }

    /// Whether the UI should show a "reconnecting" indicator.
    pub fn is_reconnecting(&self) -> bool {
        !self.connected
    }
}

impl Default for PresenceVerdict {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// Every listed channel was torn down; the owner must resubscribe.
    Escalated {
        removed: Vec<ChannelHandle>,
        bad_samples: u32,
    },
    ConnectivityChanged {
        connected: bool,
    },
}

// -------------------------------------------------------------------------------------
// Configuration
// -------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceConfig {
    pub poll_interval: Duration,     // Sampling period (default: 3s)
    pub escalation_threshold: u32,   // Escalate once bad samples exceed this (default: 3)
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_PRESENCE_POLL_INTERVAL_MS),
            escalation_threshold: DEFAULT_PRESENCE_ESCALATION_THRESHOLD,
        }
    }
}

impl PresenceConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.presence_poll_interval_ms),
            escalation_threshold: config.presence_escalation_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), PresenceError> {
        if self.poll_interval.is_zero() {
            return Err(PresenceError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------
// Errors
// -------------------------------------------------------------------------------------

/// Failures reported by the channel registry collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Channel registry unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to remove channel {channel}: {reason}")]
    RemovalFailed { channel: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresenceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Invalid presence configuration: {0}")]
    InvalidConfig(String),
}
