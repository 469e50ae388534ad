// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use shared_config::{
    AppConfig, DEFAULT_EARLY_JOIN_MINUTES, DEFAULT_LATE_JOIN_MINUTES, MAX_JOIN_WINDOW_MINUTES,
};

use crate::services::opener::JoinTargetOpener;

// ==============================================================================
// JOIN WINDOW CONFIGURATION
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWindowConfig {
    pub early_join_minutes: i64, // How long before start the join action opens (default: 15)
    pub late_join_minutes: i64,  // How long after start it stays open (default: 60)
}

impl Default for JoinWindowConfig {
    fn default() -> Self {
        Self {
            early_join_minutes: DEFAULT_EARLY_JOIN_MINUTES,
            late_join_minutes: DEFAULT_LATE_JOIN_MINUTES,
        }
    }
}

impl JoinWindowConfig {
    pub fn new(early_join_minutes: i64, late_join_minutes: i64) -> Result<Self, JoinWindowError> {
        let config = Self {
            early_join_minutes,
            late_join_minutes,
        };
        config.validate()?;
        Ok(config)
    }

    /// `AppConfig` has already range-checked both bounds; clamped again here
    /// so this cannot fail.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            early_join_minutes: config.early_join_minutes.clamp(0, MAX_JOIN_WINDOW_MINUTES),
            late_join_minutes: config.late_join_minutes.clamp(0, MAX_JOIN_WINDOW_MINUTES),
        }
    }

    pub fn validate(&self) -> Result<(), JoinWindowError> {
        check_bound("early_join_minutes", self.early_join_minutes)?;
        check_bound("late_join_minutes", self.late_join_minutes)
    }

    /// Saturates instead of panicking for bounds that skipped `validate`.
    pub fn early_join(&self) -> Duration {
        Duration::try_minutes(self.early_join_minutes).unwrap_or(Duration::MAX)
    }

    pub fn late_join(&self) -> Duration {
        Duration::try_minutes(self.late_join_minutes).unwrap_or(Duration::MAX)
    }
}

fn check_bound(name: &str, minutes: i64) -> Result<(), JoinWindowError> {
    if !(0..=MAX_JOIN_WINDOW_MINUTES).contains(&minutes) {
        return Err(JoinWindowError::InvalidConfig(format!(
            "{} must be between 0 and {} (got {})",
            name, MAX_JOIN_WINDOW_MINUTES, minutes
        )));
    }
    Ok(())
}

// ==============================================================================
// JOIN WINDOW
// ==============================================================================

/// The closed interval `[start - early, start + late]` in which joining is
/// enabled, clamped to the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinWindow {
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl JoinWindow {
    pub fn around(start_at: DateTime<Utc>, config: &JoinWindowConfig) -> Self {
        Self {
            opens_at: start_at
                .checked_sub_signed(config.early_join())
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            closes_at: start_at
                .checked_add_signed(config.late_join())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Inclusive at both ends.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.opens_at && now <= self.closes_at
    }

    pub fn phase(&self, now: DateTime<Utc>) -> Option<PendingPhase> {
        if now < self.opens_at {
            Some(PendingPhase::Upcoming)
        } else if now > self.closes_at {
            Some(PendingPhase::Elapsed)
        } else {
            None
        }
    }
}

// ==============================================================================
// JOIN DECISIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPhase {
    Upcoming, // Window has not opened yet
    Elapsed,  // Window has closed
}

/// What the join affordance should show for one appointment at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JoinDecision {
    /// Render nothing.
    NotApplicable,
    /// Static "your doctor will call you" indicator, never actionable.
    PhoneInformational,
    /// Disabled join affordance.
    VideoPending {
        phase: PendingPhase,
        window: JoinWindow,
        early_join_minutes: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        passcode: Option<String>,
    },
    /// Enabled join affordance.
    VideoActionable(ActionableJoin),
}

impl JoinDecision {
    pub fn is_actionable(&self) -> bool {
        matches!(self, JoinDecision::VideoActionable(_))
    }

    pub fn actionable(&self) -> Option<&ActionableJoin> {
        match self {
            JoinDecision::VideoActionable(join) => Some(join),
            _ => None,
        }
    }

    /// Passcode to display next to the affordance, actionable or not.
    pub fn passcode(&self) -> Option<&str> {
        match self {
            JoinDecision::VideoPending { passcode, .. } => passcode.as_deref(),
            JoinDecision::VideoActionable(join) => join.passcode(),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            JoinDecision::NotApplicable => None,
            JoinDecision::PhoneInformational => Some("Your doctor will call you"),
            JoinDecision::VideoPending { .. } | JoinDecision::VideoActionable(_) => {
                Some("Join video call")
            }
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            JoinDecision::VideoPending {
                early_join_minutes, ..
            } => Some(format!(
                "Available {} minutes before your appointment",
                early_join_minutes
            )),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JoinDecision::NotApplicable => "not_applicable",
            JoinDecision::PhoneInformational => "phone_informational",
            JoinDecision::VideoPending { .. } => "video_pending",
            JoinDecision::VideoActionable(_) => "video_actionable",
        }
    }
}

impl fmt::Display for JoinDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// An open join window. Only the evaluator can construct one, so holding an
/// `ActionableJoin` is proof the join target may be opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionableJoin {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    passcode: Option<String>,
    window: JoinWindow,
}

impl ActionableJoin {
    pub(crate) fn new(url: String, passcode: Option<String>, window: JoinWindow) -> Self {
        Self {
            url,
            passcode,
            window,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn passcode(&self) -> Option<&str> {
        self.passcode.as_deref()
    }

    pub fn window(&self) -> JoinWindow {
        self.window
    }

    /// Hands the join target to the platform. Fire-and-forget.
    pub fn open(&self, opener: &dyn JoinTargetOpener) {
        tracing::info!(closes_at = %self.window.closes_at, "Opening video join target");
        opener.open(&self.url);
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinWindowError {
    #[error("Invalid join window configuration: {0}")]
    InvalidConfig(String),
}
