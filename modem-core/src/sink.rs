//! Sample sink: the abstract audio output the orchestrator writes mono
//! `f64` samples to. Platform backends (WASAPI, ALSA, WAV files) are
//! external collaborators implemented outside this crate.

use crate::errors::{DeviceError, Result as ModemResult};

/// Mono sample output. Implementations that are physically multichannel
/// must duplicate the mono stream to every channel.
pub trait SampleSink {
    fn start(&mut self) -> ModemResult<()>;
    fn stop(&mut self) -> ModemResult<()>;
    /// Write `samples`, returning the count actually written.
    fn write(&mut self, samples: &[f64]) -> ModemResult<usize>;
    /// Block until the last queued sample has played, or `timeout_ms`
    /// elapses. Returns `true` on a completed drain, `false` on timeout or
    /// cancellation.
    fn wait_write_completed(&mut self, timeout_ms: u64) -> bool;
    fn sample_rate(&self) -> u32;
    fn channels(&self) -> u16;
}

/// A sink that accepts and immediately discards samples; used for tests and
/// headless operation.
#[derive(Debug, Default)]
pub struct NullSink {
    started: bool,
    sample_rate: u32,
    total_written: usize,
}

impl NullSink {
    pub fn new(sample_rate: u32) -> Self {
        NullSink {
            started: false,
            sample_rate,
            total_written: 0,
        }
    }

    pub fn total_written(&self) -> usize {
        self.total_written
    }
}

impl SampleSink for NullSink {
    fn start(&mut self) -> ModemResult<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> ModemResult<()> {
        self.started = false;
        Ok(())
    }

    fn write(&mut self, samples: &[f64]) -> ModemResult<usize> {
        if !self.started {
            return Err(DeviceError::Lost.into());
        }
        self.total_written += samples.len();
        Ok(samples.len())
    }

    fn wait_write_completed(&mut self, _timeout_ms: u64) -> bool {
        true
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_tracks_total_samples_written() {
        let mut sink = NullSink::new(48000);
        sink.start().unwrap();
        sink.write(&[0.0; 10]).unwrap();
        sink.write(&[0.0; 5]).unwrap();
        assert_eq!(sink.total_written(), 15);
        assert!(sink.wait_write_completed(100));
        sink.stop().unwrap();
    }

    #[test]
    fn write_before_start_fails() {
        let mut sink = NullSink::new(48000);
        assert!(sink.write(&[0.0]).is_err());
    }
}
