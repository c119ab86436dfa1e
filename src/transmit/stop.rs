//! Emergency force-stop sequence
//!
//! Kills every known rpitx process by name, resets the transmission GPIO
//! pin, unloads the DMA module, and kills the PWM helper. Each command runs
//! best-effort: an individual failure never aborts the rest of the sequence.
//! Only the aggregate verification result is reported back.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::ssh::SshConnectionManager;

/// Ordered emergency stop command list
///
/// Order matters: DMA-driven transmitters are killed before the GPIO reset,
/// otherwise the pin can be re-driven between the reset and the kill.
pub const EMERGENCY_COMMANDS: &[&str] = &[
    // First stop DMA operations
    "sudo killall -9 rpitx pichirp tune",
    // Force stop all possible processes
    "sudo pkill -f -9 rpitx",
    "sudo pkill -f -9 pichirp",
    "sudo pkill -f -9 tune",
    // Kill all test scripts
    "sudo pkill -f -9 'test.*\\.sh'",
    // Reset GPIO and DMA
    "sudo gpio -g write 4 0",
    "sudo gpio -g mode 4 in",
    // Stop any remaining processes
    "sudo killall -9 rpitx pichirp tune spectrumpaint pifmrds sendiq pocsag piopera freedv pisstv pirtty",
    // Clean up DMA
    "sudo rmmod rpitx_mod 2>/dev/null || true",
    // Final GPIO cleanup
    "echo 4 > /sys/class/gpio/unexport 2>/dev/null || true",
    // Reset PWM
    "sudo killall pi-blaster 2>/dev/null || true",
];

/// Process-presence check run after the kill sequence
pub const VERIFY_PROCESSES: &str = "pgrep -f 'rpitx|pichirp|tune'";

/// GPIO-state read run after the kill sequence (pin 4 drives the antenna)
pub const VERIFY_GPIO: &str = "gpio -g read 4";

/// Per-command timeout within the stop sequence
const STOP_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Settle time between the kill sequence and verification
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Outcome of the force-stop sequence
#[derive(Debug, Clone)]
pub struct StopReport {
    /// Whether every tracked process appears stopped and the GPIO pin is idle
    pub all_stopped: bool,

    /// pgrep output for any still-running process (pids, one per line)
    pub remaining_processes: String,

    /// GPIO pin level read back after the sequence, if the read produced one
    pub gpio_level: Option<String>,
}

impl StopReport {
    fn evaluate(processes: String, gpio: Option<String>) -> Self {
        let processes_stopped = processes.trim().is_empty();
        // An empty read means the gpio utility is absent; treat as idle since
        // nothing else can be driving the pin once the processes are gone.
        let gpio_idle = gpio
            .as_deref()
            .map(|level| {
                let level = level.trim();
                level.is_empty() || level == "0"
            })
            .unwrap_or(true);

        StopReport {
            all_stopped: processes_stopped && gpio_idle,
            remaining_processes: processes.trim().to_string(),
            gpio_level: gpio.map(|g| g.trim().to_string()),
        }
    }
}

/// Run the ordered emergency stop sequence against the Pi
///
/// Individual command failures are logged and ignored. After a short settle
/// delay, the sequence verifies via a process-presence check and a GPIO-state
/// read, and reports whether everything appears stopped.
pub async fn run_emergency_stop(connection: &SshConnectionManager) -> Result<StopReport> {
    connection.ensure_connected().await?;

    info!("Running emergency stop sequence ({} commands)", EMERGENCY_COMMANDS.len());

    for cmd in EMERGENCY_COMMANDS {
        connection
            .exec_command_best_effort(cmd, STOP_COMMAND_TIMEOUT)
            .await;
    }

    // Wait for cleanup
    tokio::time::sleep(SETTLE_DELAY).await;

    let processes = connection
        .exec_command_best_effort(VERIFY_PROCESSES, STOP_COMMAND_TIMEOUT)
        .await
        .map(|o| o.stdout)
        .unwrap_or_default();

    let gpio = connection
        .exec_command_best_effort(VERIFY_GPIO, STOP_COMMAND_TIMEOUT)
        .await
        .map(|o| o.stdout);

    let report = StopReport::evaluate(processes, gpio);

    if report.all_stopped {
        info!("Transmission fully stopped");
    } else {
        warn!(
            "Some processes might still be running: pids=[{}] gpio={:?}",
            report.remaining_processes, report.gpio_level
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_all_stopped() {
        let report = StopReport::evaluate(String::new(), Some("0\n".to_string()));
        assert!(report.all_stopped);
        assert_eq!(report.gpio_level.as_deref(), Some("0"));
    }

    #[test]
    fn test_report_processes_remaining() {
        let report = StopReport::evaluate("1234\n5678\n".to_string(), Some("0".to_string()));
        assert!(!report.all_stopped);
        assert_eq!(report.remaining_processes, "1234\n5678");
    }

    #[test]
    fn test_report_gpio_still_driven() {
        let report = StopReport::evaluate(String::new(), Some("1\n".to_string()));
        assert!(!report.all_stopped);
    }

    #[test]
    fn test_report_missing_gpio_tool_counts_as_idle() {
        let report = StopReport::evaluate(String::new(), None);
        assert!(report.all_stopped);

        let report = StopReport::evaluate(String::new(), Some(String::new()));
        assert!(report.all_stopped);
    }

    #[test]
    fn test_kill_sequence_precedes_gpio_reset() {
        let kill_idx = EMERGENCY_COMMANDS
            .iter()
            .position(|c| c.contains("killall -9 rpitx"))
            .unwrap();
        let gpio_idx = EMERGENCY_COMMANDS
            .iter()
            .position(|c| c.contains("gpio -g write 4 0"))
            .unwrap();
        assert!(kill_idx < gpio_idx);
    }
}
