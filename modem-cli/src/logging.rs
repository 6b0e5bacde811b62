//! Structured logging for the modem daemon: transmit/receive/PTT events and
//! periodic statistics, in one of three wire formats. `modem-core` itself
//! only emits through the `log` facade; [`StructuredLogger`] also acts as
//! that facade's backend so library and CLI events share one output.

use crate::config::{LogFormat, LogTarget, LoggingConfig};
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;

/// Structured log event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// A frame was handed to the sample sink for transmission.
    FrameTx(FrameTxEvent),
    /// A frame was assembled by the streaming decoder.
    FrameRx(FrameRxEvent),
    /// A PTT transition.
    Ptt(PttEvent),
    /// Periodic transmit/receive counters.
    Statistics(StatisticsEvent),
    /// General info message.
    Info { message: String },
    /// Warning message.
    Warn { message: String },
    /// Error message.
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameTxEvent {
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub path: Vec<String>,
    pub info_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRxEvent {
    pub timestamp: DateTime<Utc>,
    pub from: String,
    pub to: String,
    pub path: Vec<String>,
    pub info_len: usize,
    pub preamble_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PttEvent {
    pub timestamp: DateTime<Utc>,
    pub asserted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsEvent {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub frames_transmitted: usize,
    pub frames_received: usize,
    pub crc_failures: usize,
}

/// Logger that serializes [`LogEvent`]s to stdout, stderr, or a file, in
/// JSON, logfmt, or a human-readable pretty form.
pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Mutex<Box<dyn Write + Send>>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("file path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            config,
            writer: Mutex::new(writer),
            start_time: Utc::now(),
        })
    }

    pub fn log(&self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => Self::format_json(&event)?,
            LogFormat::Logfmt => Self::format_logfmt(&event),
            LogFormat::Pretty => Self::format_pretty(&event),
        };

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| color_eyre::eyre::eyre!("logger mutex poisoned"))?;
        writeln!(writer, "{output}")?;
        writer.flush()?;
        Ok(())
    }

    fn format_json(event: &LogEvent) -> Result<String> {
        Ok(serde_json::to_string(event)?)
    }

    fn format_logfmt(event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::FrameTx(e) => format!(
                "ts=\"{ts}\" type=frame_tx from=\"{}\" to=\"{}\" info_len={}",
                e.from, e.to, e.info_len
            ),
            LogEvent::FrameRx(e) => format!(
                "ts=\"{ts}\" type=frame_rx from=\"{}\" to=\"{}\" info_len={} preambles={}",
                e.from, e.to, e.info_len, e.preamble_count
            ),
            LogEvent::Ptt(e) => format!("ts=\"{ts}\" type=ptt asserted={}", e.asserted),
            LogEvent::Statistics(s) => format!(
                "ts=\"{ts}\" type=statistics duration_secs={:.2} tx={} rx={} crc_failures={}",
                s.duration_secs, s.frames_transmitted, s.frames_received, s.crc_failures
            ),
            LogEvent::Info { message } => format!("ts=\"{ts}\" level=info msg=\"{message}\""),
            LogEvent::Warn { message } => format!("ts=\"{ts}\" level=warn msg=\"{message}\""),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{ts}\" level=error msg=\"{message}\" details=\"{d}\""),
                None => format!("ts=\"{ts}\" level=error msg=\"{message}\""),
            },
        }
    }

    fn format_pretty(event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::FrameTx(e) => {
                format!("[{ts}] TX: {} > {} ({} bytes)", e.from, e.to, e.info_len)
            }
            LogEvent::FrameRx(e) => format!(
                "[{ts}] RX: {} > {} ({} bytes, {} preamble flags)",
                e.from, e.to, e.info_len, e.preamble_count
            ),
            LogEvent::Ptt(e) => format!(
                "[{ts}] PTT: {}",
                if e.asserted { "key-up" } else { "key-down" }
            ),
            LogEvent::Statistics(s) => format!(
                "[{ts}] STATS ({:.2}s): tx={} rx={} crc_failures={}",
                s.duration_secs, s.frames_transmitted, s.frames_received, s.crc_failures
            ),
            LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
            LogEvent::Warn { message } => format!("[{ts}] WARN: {message}"),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{ts}] ERROR: {message} | {d}"),
                None => format!("[{ts}] ERROR: {message}"),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// Bridges `log` facade records (emitted by `modem-core`) into the same
/// structured event stream, so a library-level `log::info!` ends up in the
/// same JSON/logfmt/pretty output as CLI-originated events.
impl log::Log for StructuredLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let event = match record.level() {
            log::Level::Error => LogEvent::Error {
                message: record.args().to_string(),
                details: None,
            },
            log::Level::Warn => LogEvent::Warn {
                message: record.args().to_string(),
            },
            _ => LogEvent::Info {
                message: record.args().to_string(),
            },
        };
        let _ = StructuredLogger::log(self, event);
    }

    fn flush(&self) {}
}
