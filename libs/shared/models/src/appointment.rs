// libs/shared/models/src/appointment.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// APPOINTMENT RECORD (AS HANDED IN BY THE DATA-FETCH LAYER)
// ==============================================================================

/// Read-only view of a booked appointment.
///
/// Timestamps arrive already parsed into instants; parsing and timezone
/// normalisation belong to the data-fetch layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub mode: AppointmentMode,
    pub start_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_target: Option<JoinTarget>,
}

impl Appointment {
    pub fn is_video(&self) -> bool {
        self.mode == AppointmentMode::Video
    }

    /// The join target, but only for video appointments.
    pub fn video_join_target(&self) -> Option<&JoinTarget> {
        if self.is_video() {
            self.join_target.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentMode {
    #[serde(alias = "video_call", alias = "telehealth")]
    Video,
    #[serde(alias = "phone_call")]
    Phone,
    #[serde(alias = "in-person", alias = "clinic")]
    InPerson,
    /// Any mode this client doesn't know about yet.
    #[serde(other)]
    Other,
}

impl fmt::Display for AppointmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentMode::Video => write!(f, "video"),
            AppointmentMode::Phone => write!(f, "phone"),
            AppointmentMode::InPerson => write!(f, "in_person"),
            AppointmentMode::Other => write!(f, "other"),
        }
    }
}

/// Where the provider hosts the video session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTarget {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode: Option<String>,
}

impl JoinTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            passcode: None,
        }
    }

    pub fn with_passcode(mut self, passcode: impl Into<String>) -> Self {
        self.passcode = Some(passcode.into());
        self
    }
}
