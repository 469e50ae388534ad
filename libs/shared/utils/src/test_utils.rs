use std::sync::Once;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Appointment, AppointmentMode, JoinTarget};

static TRACING: Once = Once::new();

/// Installs a test subscriber once per process. Honours `RUST_LOG`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
            ))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

pub struct TestConfig {
    pub early_join_minutes: i64,
    pub late_join_minutes: i64,
    pub presence_poll_interval_ms: u64,
    pub presence_escalation_threshold: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            early_join_minutes: defaults.early_join_minutes,
            late_join_minutes: defaults.late_join_minutes,
            presence_poll_interval_ms: defaults.presence_poll_interval_ms,
            presence_escalation_threshold: defaults.presence_escalation_threshold,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            early_join_minutes: self.early_join_minutes,
            late_join_minutes: self.late_join_minutes,
            presence_poll_interval_ms: self.presence_poll_interval_ms,
            presence_escalation_threshold: self.presence_escalation_threshold,
        }
    }
}

pub const TEST_JOIN_URL: &str = "https://meet.example.org/r/amae-test-room";
pub const TEST_PASSCODE: &str = "482913";

/// Fixed reference instant so boundary tests never depend on the wall clock.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
}

pub struct TestAppointment {
    pub mode: AppointmentMode,
    pub start_at: DateTime<Utc>,
    pub join_target: Option<JoinTarget>,
}

impl TestAppointment {
    pub fn video(start_at: DateTime<Utc>) -> Self {
        Self {
            mode: AppointmentMode::Video,
            start_at,
            join_target: Some(JoinTarget::new(TEST_JOIN_URL)),
        }
    }

    /// Video appointment starting `offset` after `now`. Negative offsets put
    /// the start in the past.
    pub fn video_in(now: DateTime<Utc>, offset: Duration) -> Self {
        Self::video(now + offset)
    }

    pub fn phone(start_at: DateTime<Utc>) -> Self {
        Self {
            mode: AppointmentMode::Phone,
            start_at,
            join_target: None,
        }
    }

    pub fn in_person(start_at: DateTime<Utc>) -> Self {
        Self {
            mode: AppointmentMode::InPerson,
            start_at,
            join_target: None,
        }
    }

    pub fn with_passcode(mut self, passcode: &str) -> Self {
        self.join_target = self
            .join_target
            .map(|target| target.with_passcode(passcode));
        self
    }

    pub fn without_join_target(mut self) -> Self {
        self.join_target = None;
        self
    }

    pub fn with_join_target(mut self, target: JoinTarget) -> Self {
        self.join_target = Some(target);
        self
    }

    pub fn build(self) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            mode: self.mode,
            start_at: self.start_at,
            join_target: self.join_target,
        }
    }
}
