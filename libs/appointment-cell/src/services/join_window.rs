// libs/appointment-cell/src/services/join_window.rs
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::{Appointment, AppointmentMode, JoinTarget};

use crate::models::{ActionableJoin, JoinDecision, JoinWindow, JoinWindowConfig};

/// Stateless join-window evaluation with a fixed configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinWindowEvaluator {
    config: JoinWindowConfig,
}

impl JoinWindowEvaluator {
    pub fn new(config: JoinWindowConfig) -> Self {
        Self { config }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(JoinWindowConfig::from_app_config(config))
    }

    pub fn config(&self) -> &JoinWindowConfig {
        &self.config
    }

    pub fn evaluate(&self, appointment: &Appointment, now: DateTime<Utc>) -> JoinDecision {
        let decision = evaluate_join_window(appointment, now, &self.config);
        debug!(
            "Join decision for appointment {} ({}): {}",
            appointment.id, appointment.mode, decision
        );
        decision
    }

    pub fn evaluate_all(&self, appointments: &[Appointment], now: DateTime<Utc>) -> Vec<JoinDecision> {
        appointments
            .iter()
            .map(|appointment| evaluate_join_window(appointment, now, &self.config))
            .collect()
    }

    /// Join window for a video appointment with a usable join target.
    pub fn window_for(&self, appointment: &Appointment) -> Option<JoinWindow> {
        usable_join_target(appointment)?;
        Some(JoinWindow::around(appointment.start_at, &self.config))
    }

    /// First instant after `now` at which `evaluate` returns a different
    /// decision, or `None` once the decision is final.
    pub fn next_transition(&self, appointment: &Appointment, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let window = self.window_for(appointment)?;

        if now < window.opens_at {
            Some(window.opens_at)
        } else if now <= window.closes_at {
            // A window ending at the last representable instant never closes.
            window.closes_at.checked_add_signed(Duration::nanoseconds(1))
        } else {
            None
        }
    }
}

/// Pure decision for `appointment` at `now`. Total over all inputs.
pub fn evaluate_join_window(
    appointment: &Appointment,
    now: DateTime<Utc>,
    config: &JoinWindowConfig,
) -> JoinDecision {
    match appointment.mode {
        AppointmentMode::Phone => JoinDecision::PhoneInformational,
        AppointmentMode::Video => {
            let Some(target) = usable_join_target(appointment) else {
                return JoinDecision::NotApplicable;
            };

            let window = JoinWindow::around(appointment.start_at, config);
            match window.phase(now) {
                None => JoinDecision::VideoActionable(ActionableJoin::new(
                    target.url.clone(),
                    target.passcode.clone(),
                    window,
                )),
                Some(phase) => JoinDecision::VideoPending {
                    phase,
                    window,
                    early_join_minutes: config.early_join_minutes,
                    passcode: target.passcode.clone(),
                },
            }
        }
        AppointmentMode::InPerson | AppointmentMode::Other => JoinDecision::NotApplicable,
    }
}

// A blank URL is as good as no join target.
fn usable_join_target(appointment: &Appointment) -> Option<&JoinTarget> {
    appointment
        .video_join_target()
        .filter(|target| !target.url.trim().is_empty())
}
