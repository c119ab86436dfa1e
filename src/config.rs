//! Configuration and CLI argument parsing for rpitx-remote

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::error::{Result, RpitxError};
use crate::settings::Settings;
use crate::transmit::TxMode;

/// Default timeout for command execution in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000; // 60 seconds

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// rpitx-remote CLI Arguments
///
/// Connection flags override the persisted settings file; overridden values
/// are written back after a successful connect.
#[derive(Parser, Debug, Clone)]
#[command(name = "rpitx-remote")]
#[command(version)]
#[command(about = "Remote control for rpitx RF transmission on a Raspberry Pi over SSH")]
pub struct Args {
    /// Pi hostname or IP (overrides the settings file)
    #[arg(long, env = "RPITX_REMOTE_HOST")]
    pub host: Option<String>,

    /// SSH port
    #[arg(long, env = "RPITX_REMOTE_PORT")]
    pub port: Option<u16>,

    /// SSH username
    #[arg(long, env = "RPITX_REMOTE_USER")]
    pub user: Option<String>,

    /// SSH password (alternative to key)
    #[arg(long, env = "RPITX_REMOTE_PASSWORD")]
    pub password: Option<String>,

    /// Path to SSH private key file (alternative to password)
    #[arg(long, env = "RPITX_REMOTE_KEY")]
    pub key: Option<PathBuf>,

    /// Remote rpitx install directory
    #[arg(long = "rpitx-path", env = "RPITX_REMOTE_PATH")]
    pub rpitx_path: Option<String>,

    /// Settings file location
    #[arg(long, env = "RPITX_REMOTE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Command execution timeout in milliseconds
    #[arg(long, default_value = "60000", env = "RPITX_REMOTE_TIMEOUT")]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Operator commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start a transmission and run until it exits or Ctrl-C
    Transmit {
        /// Transmission mode
        #[arg(value_enum)]
        mode: TxMode,

        /// Frequency in MHz (default: from settings)
        #[arg(long)]
        freq: Option<f64>,

        /// Local payload file for file modes (WAV/JPG/RF)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Message or callsign for text modes
        #[arg(long)]
        message: Option<String>,

        /// Chirp bandwidth in Hz (pichirp; default: from settings)
        #[arg(long)]
        bandwidth: Option<u32>,

        /// Chirp sweep time in seconds (pichirp; default: from settings)
        #[arg(long)]
        speed: Option<u32>,
    },

    /// Run the emergency force-stop sequence on the Pi
    Stop,

    /// Upload a file to the Pi staging directory and print its remote path
    Upload {
        /// Local file to upload
        local: PathBuf,
    },

    /// Execute a raw command on the Pi (diagnostics)
    Exec {
        /// Shell command to execute
        command: String,
    },

    /// Manage named frequency presets
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },
}

/// Preset CRUD operations against the settings file
#[derive(Subcommand, Debug, Clone)]
pub enum PresetAction {
    /// Save a preset (overwrites an existing preset with the same name)
    Save {
        /// Preset name
        name: String,

        /// Frequency in MHz (default: current settings value)
        #[arg(long)]
        freq: Option<f64>,

        /// Chirp bandwidth in Hz (default: current settings value)
        #[arg(long)]
        bandwidth: Option<u32>,

        /// Chirp sweep time in seconds (default: current settings value)
        #[arg(long)]
        speed: Option<u32>,
    },

    /// Load a preset into the active frequency/chirp settings
    Load {
        /// Preset name
        name: String,
    },

    /// List saved presets
    List,

    /// Delete a preset
    Delete {
        /// Preset name
        name: String,
    },
}

/// Resolved connection configuration (CLI flags merged over the settings file)
#[derive(Debug, Clone)]
pub struct Config {
    /// Pi hostname or IP
    pub host: String,

    /// SSH port
    pub port: u16,

    /// SSH username
    pub user: String,

    /// SSH password
    pub password: Option<String>,

    /// Path to SSH private key
    pub key: Option<PathBuf>,

    /// Remote rpitx install directory
    pub rpitx_path: String,

    /// Command timeout in milliseconds
    pub timeout_ms: u64,
}

impl Config {
    /// Merge CLI arguments over persisted settings and validate the result
    pub fn resolve(args: &Args, settings: &Settings) -> Result<Self> {
        let host = args
            .host
            .clone()
            .or_else(|| non_empty(&settings.host))
            .unwrap_or_default();
        let user = args
            .user
            .clone()
            .or_else(|| non_empty(&settings.username))
            .unwrap_or_default();
        let password = args
            .password
            .clone()
            .or_else(|| non_empty(&settings.password));
        let port = args.port.unwrap_or(settings.port);
        let rpitx_path = args
            .rpitx_path
            .clone()
            .or_else(|| non_empty(&settings.rpitx_path))
            .unwrap_or_else(|| Settings::default_rpitx_path(&user));

        let config = Config {
            host,
            port,
            user,
            password,
            key: args.key.clone(),
            rpitx_path,
            timeout_ms: args.timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the merged configuration
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.host.is_empty() {
            errors.push("Missing host (use --host or the settings file)".to_string());
        }

        if self.user.is_empty() {
            errors.push("Missing user (use --user or the settings file)".to_string());
        }

        // Must have either password or key
        if self.password.is_none() && self.key.is_none() {
            errors.push("Must provide either --password or --key".to_string());
        }

        // If key is provided, check if file exists
        if let Some(ref key_path) = self.key {
            if !key_path.exists() {
                errors.push(format!("SSH key file not found: {}", key_path.display()));
            }
        }

        if !errors.is_empty() {
            return Err(RpitxError::Config(format!(
                "Configuration error:\n{}",
                errors.join("\n")
            )));
        }

        Ok(())
    }

    /// Write the resolved connection fields back into the settings
    ///
    /// Called after a successful connect so the next run picks up the
    /// operator's latest overrides.
    pub fn persist_into(&self, settings: &mut Settings) {
        settings.host = self.host.clone();
        settings.port = self.port;
        settings.username = self.user.clone();
        if let Some(ref password) = self.password {
            settings.password = password.clone();
        }
        settings.rpitx_path = self.rpitx_path.clone();
    }
}

/// Return `Some` only for non-empty strings
fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
