//! Command execution over SSH
//!
//! Provides the `CommandOutput` struct and `exec_command` functionality
//! for executing commands over an SSH connection with timeout support.

use std::time::Duration;

use russh::ChannelMsg;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use super::connection::SshConnectionManager;
use super::sanitize::escape_command_for_shell;
use crate::error::{Result, RpitxError};

/// Output from a command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,

    /// Standard error from the command
    pub stderr: String,

    /// Exit code of the command (if available)
    pub exit_code: Option<u32>,
}

impl CommandOutput {
    /// Create a new empty CommandOutput
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the command succeeded (exit code 0 or no exit code available)
    pub fn success(&self) -> bool {
        self.exit_code.is_none_or(|code| code == 0)
    }

    /// Get combined output (stdout + stderr)
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

impl SshConnectionManager {
    /// Execute a command over SSH
    ///
    /// This method:
    /// 1. Ensures the connection is active
    /// 2. Opens a new exec channel
    /// 3. Collects stdout/stderr with timeout
    /// 4. On timeout, attempts graceful abort via pkill
    ///
    /// # Arguments
    /// * `command` - The command to execute (should be pre-sanitized)
    /// * `timeout_duration` - Maximum time to wait for command completion
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` - Command output with stdout, stderr, and exit code
    /// * `Err(RpitxError::Timeout)` - If command times out
    /// * `Err(RpitxError::Connection)` - If connection issues occur
    pub async fn exec_command(
        &self,
        command: &str,
        timeout_duration: Duration,
    ) -> Result<CommandOutput> {
        // Ensure we're connected
        self.ensure_connected().await?;

        debug!("Executing remote command: {}", command);
        self.exec_via_channel(command, timeout_duration).await
    }

    /// Execute a command best-effort: failures are logged and swallowed
    ///
    /// Used by the force-stop sequence where individual command failures
    /// must not abort the rest of the sequence.
    pub async fn exec_command_best_effort(
        &self,
        command: &str,
        timeout_duration: Duration,
    ) -> Option<CommandOutput> {
        match self.exec_command(command, timeout_duration).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!("Best-effort command '{}' failed: {}", command, e);
                None
            }
        }
    }

    /// Execute command via a new exec channel
    async fn exec_via_channel(
        &self,
        command: &str,
        timeout_duration: Duration,
    ) -> Result<CommandOutput> {
        // Open a new channel
        let channel = self.open_channel().await?;

        // Execute command
        channel
            .exec(true, command)
            .await
            .map_err(|e| RpitxError::connection(format!("Failed to exec command: {}", e)))?;

        // Collect output with timeout
        let result = timeout(timeout_duration, collect_channel_output(channel)).await;

        match result {
            Ok(output) => output,
            Err(_) => {
                // Timeout occurred - attempt graceful abort
                warn!(
                    "Command timed out after {}ms, attempting abort",
                    timeout_duration.as_millis()
                );
                self.abort_command(command).await;
                Err(RpitxError::Timeout(timeout_duration.as_millis() as u64))
            }
        }
    }

    /// Attempt to abort a running command by killing matching processes
    ///
    /// Sends `timeout 3s pkill -f 'command' 2>/dev/null || true` to kill
    /// any processes matching the command pattern.
    pub(crate) async fn abort_command(&self, command: &str) {
        // Try to open a new channel for the abort command
        let channel = match self.open_channel().await {
            Ok(ch) => ch,
            Err(e) => {
                error!("Failed to open channel for abort: {}", e);
                return;
            }
        };

        let escaped_command = escape_command_for_shell(command);
        let abort_cmd = format!(
            "timeout 3s pkill -f '{}' 2>/dev/null || true",
            escaped_command
        );

        debug!("Sending abort command: {}", abort_cmd);

        if let Err(e) = channel.exec(true, abort_cmd.as_str()).await {
            error!("Failed to exec abort command: {}", e);
            return;
        }

        // Wait briefly for abort to complete (max 5 seconds)
        let abort_timeout = Duration::from_secs(5);
        let _ = timeout(abort_timeout, async {
            let mut channel = channel;
            while let Some(msg) = channel.wait().await {
                match msg {
                    ChannelMsg::Close | ChannelMsg::Eof => break,
                    _ => continue,
                }
            }
        })
        .await;

        debug!("Abort command completed");
    }
}

/// Collect output from a channel until it closes
pub(crate) async fn collect_channel_output(
    mut channel: russh::Channel<russh::client::Msg>,
) -> Result<CommandOutput> {
    let mut output = CommandOutput::new();

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { data } => {
                output.stdout.push_str(&String::from_utf8_lossy(&data));
            }
            ChannelMsg::ExtendedData { data, ext } => {
                // ext == 1 is typically stderr
                if ext == 1 {
                    output.stderr.push_str(&String::from_utf8_lossy(&data));
                } else {
                    output.stdout.push_str(&String::from_utf8_lossy(&data));
                }
            }
            ChannelMsg::ExitStatus { exit_status } => {
                output.exit_code = Some(exit_status);
            }
            ChannelMsg::Close | ChannelMsg::Eof => {
                break;
            }
            _ => {
                // Ignore other messages
            }
        }
    }

    debug!(
        "Command completed: exit_code={:?}, stdout_len={}, stderr_len={}",
        output.exit_code,
        output.stdout.len(),
        output.stderr.len()
    );

    Ok(output)
}
