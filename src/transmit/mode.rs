//! Transmission mode catalogue
//!
//! Each mode maps to a preinstalled script or binary under the rpitx install
//! directory on the Pi. Every script takes the frequency in Hz as its first
//! argument; file modes add a remote payload path and text modes add a
//! single-quoted literal.

use clap::ValueEnum;

use crate::error::{Result, RpitxError};
use crate::ssh::sanitize::escape_for_shell;

/// rpitx frequency range in MHz (5 kHz to 1500 MHz)
const MIN_FREQUENCY_MHZ: f64 = 0.005;
const MAX_FREQUENCY_MHZ: f64 = 1500.0;

/// Kind of mode-specific argument a script expects after the frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Frequency only
    None,
    /// Remote path to an uploaded WAV file
    WavFile,
    /// Remote path to an uploaded JPG file
    JpgFile,
    /// Remote path to an uploaded FreeDV RF file
    RfFile,
    /// Literal text (message or callsign), single-quoted
    Text,
    /// Chirp bandwidth (Hz) and sweep time (s) from the chirp settings
    ChirpParams,
}

/// Transmission modes offered by the remote rpitx install
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TxMode {
    /// Carrier signal
    Tune,
    /// Moving carrier (script-driven)
    Chirp,
    /// Moving carrier with explicit bandwidth/sweep-time
    Pichirp,
    /// JPG spectrum painting
    Spectrum,
    /// FM broadcast with RDS
    Fmrds,
    /// Narrow FM
    Nfm,
    /// Upper sideband
    Ssb,
    /// Amplitude modulation
    Am,
    /// FreeDV digital voice
    Freedv,
    /// Slow scan TV
    Sstv,
    /// POCSAG pager message
    Pocsag,
    /// Opera morse beacon
    Opera,
    /// RTTY teletype
    Rtty,
}

impl TxMode {
    /// Script or binary name under the rpitx install directory
    pub fn script(&self) -> &'static str {
        match self {
            TxMode::Tune => "testvfo.sh",
            TxMode::Chirp => "testchirp.sh",
            TxMode::Pichirp => "pichirp",
            TxMode::Spectrum => "testspectrum.sh",
            TxMode::Fmrds => "testfmrds.sh",
            TxMode::Nfm => "testnfm.sh",
            TxMode::Ssb => "testssb.sh",
            TxMode::Am => "testam.sh",
            TxMode::Freedv => "testfreedv.sh",
            TxMode::Sstv => "testsstv.sh",
            TxMode::Pocsag => "pocsag",
            TxMode::Opera => "testopera.sh",
            TxMode::Rtty => "testrtty.sh",
        }
    }

    /// What the mode expects after the frequency argument
    pub fn arg(&self) -> ModeArg {
        match self {
            TxMode::Tune | TxMode::Chirp => ModeArg::None,
            TxMode::Pichirp => ModeArg::ChirpParams,
            TxMode::Spectrum | TxMode::Sstv => ModeArg::JpgFile,
            TxMode::Fmrds | TxMode::Nfm | TxMode::Ssb | TxMode::Am => ModeArg::WavFile,
            TxMode::Freedv => ModeArg::RfFile,
            TxMode::Pocsag | TxMode::Opera | TxMode::Rtty => ModeArg::Text,
        }
    }

    /// Fixed remote filename for uploaded payloads, if this is a file mode
    pub fn remote_filename(&self) -> Option<&'static str> {
        match self.arg() {
            ModeArg::WavFile => Some("temp.wav"),
            ModeArg::JpgFile => Some("temp.jpg"),
            ModeArg::RfFile => Some("temp.rf"),
            _ => None,
        }
    }
}

/// Convert an operator-entered frequency in MHz to integer Hz
///
/// Rejects non-finite, non-positive, and out-of-range values.
pub fn frequency_to_hz(freq_mhz: f64) -> Result<u64> {
    if !freq_mhz.is_finite() {
        return Err(RpitxError::invalid_params("frequency must be a number"));
    }
    if !(MIN_FREQUENCY_MHZ..=MAX_FREQUENCY_MHZ).contains(&freq_mhz) {
        return Err(RpitxError::invalid_params(format!(
            "frequency {} MHz outside supported range {}..{} MHz",
            freq_mhz, MIN_FREQUENCY_MHZ, MAX_FREQUENCY_MHZ
        )));
    }
    Ok((freq_mhz * 1e6).round() as u64)
}

/// Mode-specific argument values resolved by the caller
#[derive(Debug, Clone, Default)]
pub struct ModeParams {
    /// Remote path of an uploaded payload file
    pub remote_file: Option<String>,

    /// Message or callsign text
    pub text: Option<String>,

    /// Chirp bandwidth in Hz
    pub bandwidth: u32,

    /// Chirp sweep time in seconds
    pub speed: u32,
}

/// Build the full remote command line for a transmission
///
/// Commands take the shape the Pi-side contract expects:
/// `cd <rpitx_path> && sudo ./<script> <freq_hz> [arg...]`
pub fn build_command(
    mode: TxMode,
    rpitx_path: &str,
    freq_hz: u64,
    params: &ModeParams,
) -> Result<String> {
    let script = mode.script();
    let tail = match mode.arg() {
        ModeArg::None => String::new(),
        ModeArg::ChirpParams => format!(" {} {}", params.bandwidth, params.speed),
        ModeArg::WavFile | ModeArg::JpgFile | ModeArg::RfFile => {
            let path = params.remote_file.as_deref().ok_or_else(|| {
                RpitxError::invalid_params(format!("{} requires an uploaded file", script))
            })?;
            format!(" {}", path)
        }
        ModeArg::Text => {
            let text = params.text.as_deref().ok_or_else(|| {
                RpitxError::invalid_params(format!("{} requires a message", script))
            })?;
            if text.trim().is_empty() {
                return Err(RpitxError::invalid_params("message cannot be empty"));
            }
            format!(" '{}'", escape_for_shell(text))
        }
    };

    Ok(format!(
        "cd {} && sudo ./{} {}{}",
        rpitx_path, script, freq_hz, tail
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_conversion() {
        assert_eq!(frequency_to_hz(434.0).unwrap(), 434_000_000);
        assert_eq!(frequency_to_hz(144.5).unwrap(), 144_500_000);
        assert_eq!(frequency_to_hz(0.005).unwrap(), 5_000);
    }

    #[test]
    fn test_frequency_rejects_invalid() {
        assert!(frequency_to_hz(0.0).is_err());
        assert!(frequency_to_hz(-434.0).is_err());
        assert!(frequency_to_hz(f64::NAN).is_err());
        assert!(frequency_to_hz(f64::INFINITY).is_err());
        assert!(frequency_to_hz(2000.0).is_err());
    }

    #[test]
    fn test_tune_command() {
        let cmd = build_command(
            TxMode::Tune,
            "/home/pi/rpitx",
            434_000_000,
            &ModeParams::default(),
        )
        .unwrap();
        assert_eq!(cmd, "cd /home/pi/rpitx && sudo ./testvfo.sh 434000000");
    }

    #[test]
    fn test_pichirp_command_takes_bandwidth_and_speed() {
        let params = ModeParams {
            bandwidth: 60_000,
            speed: 10,
            ..Default::default()
        };
        let cmd = build_command(TxMode::Pichirp, "/home/pi/rpitx", 434_000_000, &params).unwrap();
        assert_eq!(
            cmd,
            "cd /home/pi/rpitx && sudo ./pichirp 434000000 60000 10"
        );
    }

    #[test]
    fn test_file_mode_command() {
        let params = ModeParams {
            remote_file: Some("/home/pi/rpitx/temp/temp.wav".to_string()),
            ..Default::default()
        };
        let cmd = build_command(TxMode::Nfm, "/home/pi/rpitx", 144_500_000, &params).unwrap();
        assert_eq!(
            cmd,
            "cd /home/pi/rpitx && sudo ./testnfm.sh 144500000 /home/pi/rpitx/temp/temp.wav"
        );
    }

    #[test]
    fn test_file_mode_requires_file() {
        let result = build_command(
            TxMode::Sstv,
            "/home/pi/rpitx",
            434_000_000,
            &ModeParams::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_text_mode_command_quotes_message() {
        let params = ModeParams {
            text: Some("CQ CQ DE N0CALL".to_string()),
            ..Default::default()
        };
        let cmd = build_command(TxMode::Rtty, "/home/pi/rpitx", 434_000_000, &params).unwrap();
        assert_eq!(
            cmd,
            "cd /home/pi/rpitx && sudo ./testrtty.sh 434000000 'CQ CQ DE N0CALL'"
        );
    }

    #[test]
    fn test_text_mode_escapes_quotes() {
        let params = ModeParams {
            text: Some("it's".to_string()),
            ..Default::default()
        };
        let cmd = build_command(TxMode::Pocsag, "/home/pi/rpitx", 434_000_000, &params).unwrap();
        assert!(cmd.contains("'it'\"'\"'s'"));
    }

    #[test]
    fn test_text_mode_rejects_empty_message() {
        let params = ModeParams {
            text: Some("   ".to_string()),
            ..Default::default()
        };
        let result = build_command(TxMode::Rtty, "/home/pi/rpitx", 434_000_000, &params);
        assert!(result.is_err());
    }

    #[test]
    fn test_remote_filenames() {
        assert_eq!(TxMode::Nfm.remote_filename(), Some("temp.wav"));
        assert_eq!(TxMode::Sstv.remote_filename(), Some("temp.jpg"));
        assert_eq!(TxMode::Freedv.remote_filename(), Some("temp.rf"));
        assert_eq!(TxMode::Tune.remote_filename(), None);
        assert_eq!(TxMode::Rtty.remote_filename(), None);
    }

    #[test]
    fn test_every_mode_has_a_script() {
        let modes = [
            (TxMode::Tune, "testvfo.sh"),
            (TxMode::Chirp, "testchirp.sh"),
            (TxMode::Pichirp, "pichirp"),
            (TxMode::Spectrum, "testspectrum.sh"),
            (TxMode::Fmrds, "testfmrds.sh"),
            (TxMode::Nfm, "testnfm.sh"),
            (TxMode::Ssb, "testssb.sh"),
            (TxMode::Am, "testam.sh"),
            (TxMode::Freedv, "testfreedv.sh"),
            (TxMode::Sstv, "testsstv.sh"),
            (TxMode::Pocsag, "pocsag"),
            (TxMode::Opera, "testopera.sh"),
            (TxMode::Rtty, "testrtty.sh"),
        ];
        for (mode, script) in modes {
            assert_eq!(mode.script(), script);
        }
    }
}
