// libs/appointment-cell/src/lib.rs
//! # Appointment Cell
//!
//! Decides when a scheduled telehealth appointment can be joined.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                 Appointment Cell                    |
//! +-----------------------------------------------------+
//! |  models.rs        |  Decisions, windows, config     |
//! |  services/        |                                 |
//! |    join_window.rs |  Join-window evaluation         |
//! |    opener.rs      |  Join target opener seam        |
//! +-----------------------------------------------------+
//! ```
//!
//! Evaluation is a pure function of the appointment and a caller-supplied
//! `now`; it is safe to recompute on every render.
//!
//! ```rust
//! use appointment_cell::{JoinDecision, JoinWindowEvaluator};
//! use chrono::{Duration, Utc};
//! use shared_models::{Appointment, AppointmentMode, JoinTarget};
//! use uuid::Uuid;
//!
//! let now = Utc::now();
//! let appointment = Appointment {
//!     id: Uuid::new_v4(),
//!     mode: AppointmentMode::Video,
//!     start_at: now + Duration::minutes(10),
//!     join_target: Some(JoinTarget::new("https://meet.example.org/r/room")),
//! };
//!
//! let evaluator = JoinWindowEvaluator::default();
//! let decision = evaluator.evaluate(&appointment, now);
//! assert!(decision.is_actionable());
//! ```

pub mod models;
pub mod services;

pub use models::{
    ActionableJoin, JoinDecision, JoinWindow, JoinWindowConfig, JoinWindowError, PendingPhase,
};

pub use services::{evaluate_join_window, JoinTargetOpener, JoinWindowEvaluator};
