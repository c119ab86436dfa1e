//! rpitx-remote - Remote control for rpitx RF transmission over SSH
//!
//! This crate drives the `rpitx` toolkit preinstalled on a Raspberry Pi:
//! it opens an SSH session, invokes the transmission scripts with
//! operator-supplied parameters, uploads payload files over SFTP, and
//! provides an emergency force-stop sequence that kills remote processes
//! and resets GPIO state.
//!
//! # Features
//!
//! - Thirteen transmission modes (carrier, chirp, spectrum painting, FM RDS,
//!   NFM, SSB, AM, FreeDV, SSTV, POCSAG, Opera, RTTY)
//! - Persistent SSH connection with reconnect on demand
//! - SFTP upload to a fixed staging directory with permission fixup
//! - Best-effort emergency stop with process and GPIO verification
//! - Flat JSON settings file with named frequency presets
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! rpitx-remote --host=192.168.0.197 --user=pi --password=raspberry \
//!   transmit tune --freq 434.0
//! ```

pub mod config;
pub mod error;
pub mod settings;
pub mod ssh;
pub mod transmit;

// Re-exports for convenience
pub use config::{Args, Command, Config, PresetAction};
pub use error::{Result, RpitxError};
pub use settings::{Preset, Settings};
pub use ssh::{
    escape_command_for_shell, escape_for_shell, sanitize_command, CommandOutput, SshConfig,
    SshConnectionManager, SshHandler,
};
pub use transmit::{
    build_command, frequency_to_hz, run_emergency_stop, ModeParams, SessionState, StopReport,
    Transmitter, TxMode,
};
