//! JSON configuration for the `modem` binary: the top-level `audio_streams`,
//! `ptt_controls` and `modulators` arrays from an on-disk config file,
//! resolved into the types `modem-core` and this crate's sinks/PTT wiring
//! expect.

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of the top-level `audio_streams` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioStreamConfig {
    NullAudioStream { name: String },
    WavAudioOutputStream {
        name: String,
        filename: String,
        #[serde(default = "default_volume")]
        volume: u32,
    },
    WavAudioInputStream { name: String, filename: String },
    TcpAudioStream {
        name: String,
        host: String,
        audio_port: u16,
        control_port: u16,
    },
}

impl AudioStreamConfig {
    pub fn name(&self) -> &str {
        match self {
            AudioStreamConfig::NullAudioStream { name } => name,
            AudioStreamConfig::WavAudioOutputStream { name, .. } => name,
            AudioStreamConfig::WavAudioInputStream { name, .. } => name,
            AudioStreamConfig::TcpAudioStream { name, .. } => name,
        }
    }
}

fn default_volume() -> u32 {
    100
}

/// One entry of the top-level `ptt_controls` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PttControlConfig {
    NullPttControl {
        name: String,
    },
    SerialPortPttControl {
        name: String,
        serial_port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
        #[serde(default = "default_line")]
        line: String,
        #[serde(default = "default_trigger")]
        trigger: String,
    },
    LibraryPttControl {
        name: String,
        library_path: String,
        #[serde(default)]
        platform: String,
    },
    TcpPttControl {
        name: String,
        host: String,
        port: u16,
    },
}

impl PttControlConfig {
    pub fn name(&self) -> &str {
        match self {
            PttControlConfig::NullPttControl { name } => name,
            PttControlConfig::SerialPortPttControl { name, .. } => name,
            PttControlConfig::LibraryPttControl { name, .. } => name,
            PttControlConfig::TcpPttControl { name, .. } => name,
        }
    }
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_line() -> String {
    "rts".to_string()
}

fn default_trigger() -> String {
    "on".to_string()
}

/// One entry of the top-level `modulators` array. Not present in the
/// original C++ config format: the AX.25 modem didn't need a tunable
/// transmit chain per audio stream, but this CLI contract asks for one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModulatorConfig {
    Ax25Modulator {
        name: String,
        #[serde(flatten)]
        params: ModulatorParams,
    },
    Fx25Modulator {
        name: String,
        #[serde(default = "default_min_check_bytes")]
        min_check_bytes: usize,
        #[serde(flatten)]
        params: ModulatorParams,
    },
}

impl ModulatorConfig {
    pub fn name(&self) -> &str {
        match self {
            ModulatorConfig::Ax25Modulator { name, .. } => name,
            ModulatorConfig::Fx25Modulator { name, .. } => name,
        }
    }

    pub fn params(&self) -> &ModulatorParams {
        match self {
            ModulatorConfig::Ax25Modulator { params, .. } => params,
            ModulatorConfig::Fx25Modulator { params, .. } => params,
        }
    }

    /// Resolve into a `modem_core::ModemConfig` plus the transmit-side
    /// converter it should drive.
    pub fn resolve(&self, sample_rate: u32) -> (modem_core::ModemConfig, modem_core::Converter) {
        let p = self.params();
        let config = modem_core::ModemConfig {
            baud: p.baud,
            f_mark: p.f_mark,
            f_space: p.f_space,
            sample_rate,
            alpha: p.alpha,
            tx_delay_ms: p.tx_delay_ms,
            tx_tail_ms: p.tx_tail_ms,
            gain: p.gain,
            preemphasis: p.preemphasis,
            begin_silence_ms: p.begin_silence_ms,
            end_silence_ms: p.end_silence_ms,
        };
        let converter = match self {
            ModulatorConfig::Ax25Modulator { .. } => modem_core::Converter::Ax25,
            ModulatorConfig::Fx25Modulator {
                min_check_bytes, ..
            } => modem_core::Converter::Fx25 {
                min_check_bytes: *min_check_bytes,
            },
        };
        (config, converter)
    }
}

fn default_min_check_bytes() -> usize {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulatorParams {
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_f_mark")]
    pub f_mark: f64,
    #[serde(default = "default_f_space")]
    pub f_space: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_tx_delay_ms")]
    pub tx_delay_ms: u32,
    #[serde(default = "default_tx_tail_ms")]
    pub tx_tail_ms: u32,
    #[serde(default = "default_gain")]
    pub gain: f64,
    #[serde(default)]
    pub preemphasis: bool,
    #[serde(default)]
    pub begin_silence_ms: u32,
    #[serde(default)]
    pub end_silence_ms: u32,
}

fn default_baud() -> u32 {
    1200
}
fn default_f_mark() -> f64 {
    1200.0
}
fn default_f_space() -> f64 {
    2200.0
}
fn default_alpha() -> f64 {
    1.0
}
fn default_tx_delay_ms() -> u32 {
    300
}
fn default_tx_tail_ms() -> u32 {
    50
}
fn default_gain() -> f64 {
    1.0
}

/// Logging knobs, not part of spec.md's CLI contract but carried as ambient
/// configuration the same way the teacher's CLI config always has a
/// logging section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub target: LogTarget,
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            format: LogFormat::Pretty,
            target: LogTarget::Stdout,
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Logfmt,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// The top-level shape of `modem.json` / `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub audio_streams: Vec<AudioStreamConfig>,
    #[serde(default)]
    pub ptt_controls: Vec<PttControlConfig>,
    #[serde(default)]
    pub modulators: Vec<ModulatorConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| eyre!("failed to read config {}: {e}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| eyre!("failed to parse config {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Resolve the config path per the CLI contract: an explicit `-c/--config`
    /// path if given, else `modem.json` then `config.json` in the working
    /// directory.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = explicit {
            return Ok(p.to_path_buf());
        }
        for candidate in ["modem.json", "config.json"] {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }
        Err(eyre!(
            "no config path given and neither modem.json nor config.json exists"
        ))
    }

    pub fn find_audio_stream(&self, name: &str) -> Option<&AudioStreamConfig> {
        self.audio_streams.iter().find(|a| a.name() == name)
    }

    pub fn find_ptt_control(&self, name: &str) -> Option<&PttControlConfig> {
        self.ptt_controls.iter().find(|p| p.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_all_three_arrays() {
        let json = r#"{
            "audio_streams": [{"type": "wav_audio_output_stream", "name": "out", "filename": "out.wav"}],
            "ptt_controls": [{"type": "null_ptt_control", "name": "none"}],
            "modulators": [{"type": "ax25_modulator", "name": "tx1200", "baud": 1200, "f_mark": 1200.0, "f_space": 2200.0, "tx_delay_ms": 300, "tx_tail_ms": 50}]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.audio_streams.len(), 1);
        assert_eq!(config.ptt_controls.len(), 1);
        assert_eq!(config.modulators.len(), 1);
        assert_eq!(config.modulators[0].name(), "tx1200");
    }

    #[test]
    fn fx25_modulator_resolves_to_fx25_converter() {
        let json = r#"{"type": "fx25_modulator", "name": "fx", "min_check_bytes": 32, "baud": 1200}"#;
        let modulator: ModulatorConfig = serde_json::from_str(json).unwrap();
        let (config, converter) = modulator.resolve(48_000);
        assert_eq!(config.baud, 1200);
        assert_eq!(
            converter,
            modem_core::Converter::Fx25 {
                min_check_bytes: 32
            }
        );
    }

    #[test]
    fn resolve_path_prefers_explicit_then_modem_json_then_config_json() {
        let dir = std::env::temp_dir().join(format!("modem-cli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let prev = std::env::current_dir().unwrap();
        std::env::set_current_dir(&dir).unwrap();

        let err = Config::resolve_path(None);
        assert!(err.is_err());

        std::fs::write("config.json", "{}").unwrap();
        assert_eq!(
            Config::resolve_path(None).unwrap(),
            PathBuf::from("config.json")
        );

        std::fs::write("modem.json", "{}").unwrap();
        assert_eq!(
            Config::resolve_path(None).unwrap(),
            PathBuf::from("modem.json")
        );

        std::env::set_current_dir(&prev).unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }
}
