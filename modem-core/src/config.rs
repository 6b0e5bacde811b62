//! Modem configuration: the tunables that drive the transmit pipeline
//! (§3 "Modem config" / §4.5 / §4.8 / §4.9), independent of how they were
//! loaded (the CLI's JSON config resolves into this type; tests build it
//! directly).

use serde::{Deserialize, Serialize};

/// Signal chain tunables shared by the modulator and the orchestrator's
/// post-processing stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModemConfig {
    pub baud: u32,
    pub f_mark: f64,
    pub f_space: f64,
    pub sample_rate: u32,
    /// DDS frequency-smoothing coefficient; `1.0` is hard-keyed AFSK.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    pub tx_delay_ms: u32,
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

fn default_alpha() -> f64 {
    1.0
}

fn default_gain() -> f64 {
    1.0
}

impl Default for ModemConfig {
    /// Bell 202 1200-baud APRS defaults: 1200 Hz mark, 2200 Hz space.
    fn default() -> Self {
        ModemConfig {
            baud: 1200,
            f_mark: 1200.0,
            f_space: 2200.0,
            sample_rate: 48_000,
            alpha: 1.0,
            tx_delay_ms: 300,
            tx_tail_ms: 50,
            gain: 1.0,
            preemphasis: false,
            begin_silence_ms: 0,
            end_silence_ms: 0,
        }
    }
}

impl ModemConfig {
    /// Milliseconds occupied by one HDLC flag octet at this baud rate.
    pub fn ms_per_flag(&self) -> f64 {
        8000.0 / self.baud as f64
    }

    /// Number of preamble flags needed to fill `tx_delay_ms`, at least one.
    pub fn preamble_flags(&self) -> usize {
        ((self.tx_delay_ms as f64 / self.ms_per_flag()) as usize).max(1)
    }

    /// Number of postamble flags needed to fill `tx_tail_ms`, at least one.
    pub fn postamble_flags(&self) -> usize {
        ((self.tx_tail_ms as f64 / self.ms_per_flag()) as usize).max(1)
    }
}
