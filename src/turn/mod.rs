//! Single-active-prompt-per-session enforcement and cooperative cancellation.

pub mod cancellation;
pub mod controller;

pub use cancellation::{cancellation_pair, CancellationSignal, CancellationTrigger};
pub use controller::{SharedTurnController, TurnConflict, TurnController, TurnGuard};
