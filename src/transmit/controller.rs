//! Transmission run lifecycle
//!
//! One background worker per remote command invocation; at most one
//! transmission is active at a time. The shared transmitting flag is flipped
//! with compare-exchange, so a second `run` while one is active is rejected
//! with a Busy error instead of racing the first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use russh::ChannelMsg;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::mode::{build_command, frequency_to_hz, ModeParams, TxMode};
use super::stop::{run_emergency_stop, StopReport};
use crate::error::{Result, RpitxError};
use crate::ssh::{CommandOutput, SshConnectionManager};

/// Timeout for the remote directory existence check
const DIR_CHECK_TIMEOUT: Duration = Duration::from_secs(15);

/// Poll interval while waiting for the remote process to exit
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Observable session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live SSH session
    Idle,
    /// A connection attempt is in flight
    Connecting,
    /// Connected, no transmission active
    Connected,
    /// A remote transmission process is running
    Transmitting,
}

/// Drives rpitx transmissions over an SSH connection
///
/// Owns the shared transmitting flag and at most one in-flight worker handle.
/// Every error path returns the transmitter to a retryable state.
pub struct Transmitter {
    connection: Arc<SshConnectionManager>,

    /// Remote rpitx install directory
    rpitx_path: String,

    /// True from command dispatch until the remote process reports exit
    /// or the worker is cancelled locally
    transmitting: Arc<AtomicBool>,

    /// In-flight worker handle, at most one
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Transmitter {
    /// Create a transmitter over an existing connection manager
    pub fn new(connection: Arc<SshConnectionManager>, rpitx_path: impl Into<String>) -> Self {
        Self {
            connection,
            rpitx_path: rpitx_path.into(),
            transmitting: Arc::new(AtomicBool::new(false)),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    /// The connection manager this transmitter drives
    pub fn connection(&self) -> &Arc<SshConnectionManager> {
        &self.connection
    }

    /// Whether a transmission is currently active
    pub fn is_transmitting(&self) -> bool {
        self.transmitting.load(Ordering::SeqCst)
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        if self.is_transmitting() {
            SessionState::Transmitting
        } else if self.connection.is_connecting() {
            SessionState::Connecting
        } else if self.connection.is_connected().await {
            SessionState::Connected
        } else {
            SessionState::Idle
        }
    }

    /// Start a transmission
    ///
    /// Verifies the remote rpitx directory exists, builds the command line,
    /// and executes it in a background worker. Returns as soon as the remote
    /// process is dispatched; the transmitting flag stays true until the
    /// process reports exit or `stop()` cancels it.
    ///
    /// # Errors
    /// * `RpitxError::NotFound` - rpitx directory missing; nothing executed
    /// * `RpitxError::Busy` - a transmission is already active
    /// * `RpitxError::InvalidParams` - bad frequency or missing mode argument
    pub async fn run(&self, mode: TxMode, freq_mhz: f64, params: &ModeParams) -> Result<()> {
        let freq_hz = frequency_to_hz(freq_mhz)?;

        self.connection.ensure_connected().await?;
        self.check_rpitx_dir().await?;

        let command = build_command(mode, &self.rpitx_path, freq_hz, params)?;

        // Claim the transmitting flag before touching the remote side
        if self
            .transmitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RpitxError::Busy(format!(
                "cannot start {}, stop the current transmission first",
                mode.script()
            )));
        }

        info!("Executing: {}", command);

        let channel = match self.connection.open_channel().await {
            Ok(ch) => ch,
            Err(e) => {
                self.transmitting.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        if let Err(e) = channel.exec(true, command.as_str()).await {
            self.transmitting.store(false, Ordering::SeqCst);
            return Err(RpitxError::connection(format!(
                "Failed to exec command: {}",
                e
            )));
        }

        // Background worker: poll until the remote process exits or the
        // flag is cleared locally, then drop the channel handle.
        let transmitting = Arc::clone(&self.transmitting);
        let handle = tokio::spawn(async move {
            let mut channel = channel;
            loop {
                if !transmitting.load(Ordering::SeqCst) {
                    debug!("Transmission cancelled locally, closing channel");
                    let _ = channel.eof().await;
                    break;
                }

                match tokio::time::timeout(EXIT_POLL_INTERVAL, channel.wait()).await {
                    Ok(Some(ChannelMsg::ExitStatus { exit_status })) => {
                        debug!("Remote process exited with status {}", exit_status);
                        break;
                    }
                    Ok(Some(ChannelMsg::Close)) | Ok(None) => {
                        debug!("Channel closed by remote");
                        break;
                    }
                    Ok(Some(_)) => continue,
                    Err(_) => continue, // poll timeout, re-check the flag
                }
            }
            transmitting.store(false, Ordering::SeqCst);
        });

        {
            let mut worker_guard = self.worker.lock().await;
            if let Some(previous) = worker_guard.replace(handle) {
                // A finished worker may still be parked here from the last run
                previous.abort();
            }
        }

        Ok(())
    }

    /// Verify the remote rpitx directory exists
    async fn check_rpitx_dir(&self) -> Result<()> {
        let check = format!("test -d {} && echo \"EXISTS\"", self.rpitx_path);
        let output = self.connection.exec_command(&check, DIR_CHECK_TIMEOUT).await?;
        verify_rpitx_dir(&self.rpitx_path, &output)
    }

    /// Stop the current transmission and run the emergency stop sequence
    ///
    /// Clears the transmitting flag (the worker sees it and closes its
    /// channel), drops the tracked worker handle, then runs the force-stop
    /// command list. Postcondition regardless of outcome: flag false, no
    /// tracked handle remains.
    pub async fn stop(&self) -> Result<StopReport> {
        self.transmitting.store(false, Ordering::SeqCst);

        {
            let mut worker_guard = self.worker.lock().await;
            if let Some(mut handle) = worker_guard.take() {
                // Give the worker one poll interval to close its channel
                if tokio::time::timeout(EXIT_POLL_INTERVAL * 2, &mut handle)
                    .await
                    .is_err()
                {
                    warn!("Worker did not wind down in time, aborting it");
                    handle.abort();
                }
            }
        }

        run_emergency_stop(&self.connection).await
    }

    /// Whether a worker handle is currently tracked
    ///
    /// True between a successful `run` dispatch and the following `stop`.
    pub async fn has_worker(&self) -> bool {
        self.worker.lock().await.is_some()
    }
}

/// Decide whether the directory check confirmed the rpitx install
///
/// The check command prints `EXISTS` only when the directory is present;
/// anything else means nothing may be executed.
fn verify_rpitx_dir(rpitx_path: &str, output: &CommandOutput) -> Result<()> {
    if output.stdout.trim() != "EXISTS" {
        return Err(RpitxError::NotFound(rpitx_path.to_string()));
    }
    Ok(())
}
