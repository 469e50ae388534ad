// libs/appointment-cell/src/services/mod.rs

pub mod join_window;
pub mod opener;

pub use join_window::{evaluate_join_window, JoinWindowEvaluator};
pub use opener::JoinTargetOpener;
