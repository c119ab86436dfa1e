//! SSH connection management module
//!
//! This module provides persistent SSH connection handling with
//! reconnection on demand, authentication, command execution, and SFTP
//! file transfer to the Pi.

pub mod command;
pub mod config;
pub mod connection;
pub mod handler;
pub mod sanitize;
pub mod sftp;

// Re-exports
pub use command::CommandOutput;
pub use config::SshConfig;
pub use connection::SshConnectionManager;
pub use handler::SshHandler;
pub use sanitize::{escape_command_for_shell, escape_for_shell, sanitize_command};
