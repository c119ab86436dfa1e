//! Transmission mode catalogue and run lifecycle
//!
//! Modes map to fixed rpitx script names on the Pi; the controller dispatches
//! one background worker per invocation and owns the transmitting flag; the
//! stop module implements the emergency kill/reset sequence.

pub mod controller;
pub mod mode;
pub mod stop;

// Re-exports
pub use controller::{SessionState, Transmitter};
pub use mode::{build_command, frequency_to_hz, ModeArg, ModeParams, TxMode};
pub use stop::{run_emergency_stop, StopReport, EMERGENCY_COMMANDS};
