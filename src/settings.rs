//! Persisted operator settings and named presets
//!
//! Settings live in a flat JSON file (`rpitx_settings.json` by default),
//! loaded at startup and written back on every mutation. Preset names are
//! unique; saving under an existing name overwrites it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, RpitxError};

/// Default settings file name, relative to the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "rpitx_settings.json";

/// Default transmission frequency in MHz (70cm band)
pub const DEFAULT_FREQUENCY_MHZ: f64 = 434.0;

/// Default chirp bandwidth in Hz
pub const DEFAULT_CHIRP_BANDWIDTH: u32 = 60_000;

/// Default chirp sweep time in seconds
pub const DEFAULT_CHIRP_SPEED: u32 = 10;

/// A named bundle of frequency/bandwidth/speed values persisted for reuse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset name (unique within the settings file)
    pub name: String,

    /// Frequency in MHz
    pub frequency: f64,

    /// Chirp bandwidth in Hz
    pub bandwidth: u32,

    /// Chirp sweep time in seconds
    pub speed: u32,
}

/// Operator settings persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Raspberry Pi hostname or IP address
    pub host: String,

    /// SSH port
    pub port: u16,

    /// SSH username on the Pi
    pub username: String,

    /// SSH password
    pub password: String,

    /// Remote rpitx install directory
    pub rpitx_path: String,

    /// Default transmission frequency in MHz
    pub frequency: f64,

    /// Chirp bandwidth in Hz
    pub chirp_bandwidth: u32,

    /// Chirp sweep time in seconds
    pub chirp_speed: u32,

    /// Named presets
    pub saved_presets: Vec<Preset>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            password: String::new(),
            rpitx_path: String::new(),
            frequency: DEFAULT_FREQUENCY_MHZ,
            chirp_bandwidth: DEFAULT_CHIRP_BANDWIDTH,
            chirp_speed: DEFAULT_CHIRP_SPEED,
            saved_presets: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from `path`
    ///
    /// A missing file is not an error: defaults are returned and written to
    /// disk so the operator has a file to edit.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let settings: Settings = serde_json::from_str(&contents)
                    .map_err(|e| RpitxError::settings(format!("parse error: {}", e)))?;
                debug!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Settings file {} not found, writing defaults",
                    path.display()
                );
                let settings = Settings::default();
                settings.save(path)?;
                Ok(settings)
            }
            Err(e) => Err(RpitxError::Io(e)),
        }
    }

    /// Write settings to `path` as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| RpitxError::settings(format!("serialize error: {}", e)))?;
        std::fs::write(path.as_ref(), json).map_err(RpitxError::Io)?;
        debug!("Saved settings to {}", path.as_ref().display());
        Ok(())
    }

    /// Default rpitx path for a given username
    pub fn default_rpitx_path(username: &str) -> String {
        format!("/home/{}/rpitx", username)
    }

    /// Save a preset, overwriting any preset with the same name
    ///
    /// Overwrite-on-save keeps preset names unique and makes repeated
    /// identical saves idempotent.
    pub fn save_preset(&mut self, preset: Preset) {
        match self.saved_presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.saved_presets.push(preset),
        }
    }

    /// Look up a preset by name
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.saved_presets.iter().find(|p| p.name == name)
    }

    /// Delete a preset by name; returns whether anything was removed
    pub fn delete_preset(&mut self, name: &str) -> bool {
        let before = self.saved_presets.len();
        self.saved_presets.retain(|p| p.name != name);
        self.saved_presets.len() != before
    }

    /// Apply a preset to the active frequency/chirp inputs
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let preset = self
            .preset(name)
            .cloned()
            .ok_or_else(|| RpitxError::invalid_params(format!("no preset named '{}'", name)))?;
        self.frequency = preset.frequency;
        self.chirp_bandwidth = preset.bandwidth;
        self.chirp_speed = preset.speed;
        Ok(())
    }
}

/// Resolve the settings file path from an optional CLI override
pub fn settings_path(override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Settings {
        Settings {
            host: "192.168.0.197".to_string(),
            port: 22,
            username: "pi".to_string(),
            password: "raspberry".to_string(),
            rpitx_path: "/home/pi/rpitx".to_string(),
            frequency: 144.5,
            chirp_bandwidth: 50_000,
            chirp_speed: 5,
            saved_presets: vec![Preset {
                name: "2m".to_string(),
                frequency: 144.5,
                bandwidth: 50_000,
                speed: 5,
            }],
        }
    }

    #[test]
    fn test_round_trip_reproduces_every_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rpitx_settings.json");

        let settings = sample();
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rpitx_settings.json");

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rpitx_settings.json");
        std::fs::write(&path, r#"{"host": "10.0.0.5", "username": "mwk"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.host, "10.0.0.5");
        assert_eq!(settings.username, "mwk");
        assert_eq!(settings.port, 22);
        assert_eq!(settings.frequency, DEFAULT_FREQUENCY_MHZ);
    }

    #[test]
    fn test_save_preset_overwrites_same_name() {
        let mut settings = Settings::default();
        settings.save_preset(Preset {
            name: "70cm".to_string(),
            frequency: 433.0,
            bandwidth: 10_000,
            speed: 1,
        });
        settings.save_preset(Preset {
            name: "70cm".to_string(),
            frequency: 434.0,
            bandwidth: 60_000,
            speed: 10,
        });

        assert_eq!(settings.saved_presets.len(), 1);
        let p = settings.preset("70cm").unwrap();
        assert_eq!(p.frequency, 434.0);
        assert_eq!(p.bandwidth, 60_000);
        assert_eq!(p.speed, 10);
    }

    #[test]
    fn test_preset_save_is_idempotent() {
        let mut settings = Settings::default();
        let preset = Preset {
            name: "70cm".to_string(),
            frequency: 434.0,
            bandwidth: 60_000,
            speed: 10,
        };
        settings.save_preset(preset.clone());
        settings.save_preset(preset.clone());
        settings.save_preset(preset);

        assert_eq!(settings.saved_presets.len(), 1);
    }

    #[test]
    fn test_apply_preset_restores_active_inputs() {
        let mut settings = Settings::default();
        settings.save_preset(Preset {
            name: "70cm".to_string(),
            frequency: 434.0,
            bandwidth: 60_000,
            speed: 10,
        });
        settings.frequency = 0.0;
        settings.chirp_bandwidth = 0;
        settings.chirp_speed = 0;

        settings.apply_preset("70cm").unwrap();
        assert_eq!(settings.frequency, 434.0);
        assert_eq!(settings.chirp_bandwidth, 60_000);
        assert_eq!(settings.chirp_speed, 10);
    }

    #[test]
    fn test_delete_preset_is_idempotent() {
        let mut settings = Settings::default();
        settings.save_preset(Preset {
            name: "70cm".to_string(),
            frequency: 434.0,
            bandwidth: 60_000,
            speed: 10,
        });

        assert!(settings.delete_preset("70cm"));
        assert!(!settings.delete_preset("70cm"));
        assert!(settings.saved_presets.is_empty());
    }

    #[test]
    fn test_apply_missing_preset_fails() {
        let mut settings = Settings::default();
        assert!(settings.apply_preset("nope").is_err());
    }

    #[test]
    fn test_default_rpitx_path() {
        assert_eq!(Settings::default_rpitx_path("mwk"), "/home/mwk/rpitx");
    }
}
