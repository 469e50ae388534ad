pub mod appointment;

pub use appointment::{Appointment, AppointmentMode, JoinTarget};
