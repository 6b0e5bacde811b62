//! WAV-file sample sink: `modem_core::SampleSink` backed by `hound`, used
//! when a config's `audio_streams` entry is a `wav_audio_output_stream`.

use hound::{SampleFormat, WavSpec, WavWriter};
use modem_core::errors::{ConnectionError, DeviceError, ModemError, Result as ModemResult};
use modem_core::SampleSink;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub struct WavFileSink {
    writer: Option<WavWriter<BufWriter<File>>>,
    sample_rate: u32,
    started: bool,
}

impl WavFileSink {
    pub fn create(path: &Path, sample_rate: u32) -> ModemResult<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(path, spec).map_err(|e| {
            ModemError::from(DeviceError::OpenFailed {
                reason: e.to_string(),
            })
        })?;
        Ok(WavFileSink {
            writer: Some(writer),
            sample_rate,
            started: false,
        })
    }
}

impl SampleSink for WavFileSink {
    fn start(&mut self) -> ModemResult<()> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> ModemResult<()> {
        self.started = false;
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| ModemError::from(ConnectionError::Io(e.to_string())))?;
        }
        Ok(())
    }

    fn write(&mut self, samples: &[f64]) -> ModemResult<usize> {
        if !self.started {
            return Err(DeviceError::Lost.into());
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or(ModemError::from(DeviceError::Lost))?;
        for &s in samples {
            writer
                .write_sample(s as f32)
                .map_err(|e| ModemError::from(DeviceError::Buffer {
                    reason: e.to_string(),
                }))?;
        }
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
