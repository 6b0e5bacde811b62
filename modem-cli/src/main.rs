mod config;
mod logging;
mod sink;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};

use config::{AudioStreamConfig, Config, PttControlConfig};
use logging::{LogEvent, StructuredLogger};
use modem_core::ptt::{
    ChainedPtt, LibraryPtt, NullPtt, PttControl, SerialPtt, SerialPttLine, SerialPttTrigger,
    TcpPtt,
};
use modem_core::sink::{NullSink, SampleSink};
use sink::WavFileSink;

/// AX.25/APRS software modem.
#[derive(Parser, Debug)]
#[command(name = "modem", author, version, about = "AX.25/APRS software modem", long_about = None)]
struct Cli {
    /// Path to the JSON config file. Defaults to `modem.json` then `config.json`.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn build_audio_stream(cfg: &AudioStreamConfig, sample_rate: u32) -> Result<Box<dyn SampleSink>> {
    match cfg {
        AudioStreamConfig::NullAudioStream { .. } => Ok(Box::new(NullSink::new(sample_rate))),
        AudioStreamConfig::WavAudioOutputStream { filename, .. } => Ok(Box::new(
            WavFileSink::create(&PathBuf::from(filename), sample_rate)?,
        )),
        AudioStreamConfig::WavAudioInputStream { .. } => {
            Err(eyre!("WAV input streams are not a transmit-side sink"))
        }
        AudioStreamConfig::TcpAudioStream { .. } => {
            Err(eyre!("TCP audio streams are not yet wired into the CLI"))
        }
    }
}

fn build_ptt_control(cfg: &PttControlConfig) -> Result<Box<dyn PttControl>> {
    match cfg {
        PttControlConfig::NullPttControl { .. } => Ok(Box::new(NullPtt::default())),
        PttControlConfig::SerialPortPttControl {
            serial_port,
            line,
            trigger,
            ..
        } => {
            let line = match line.as_str() {
                "rts" => SerialPttLine::Rts,
                "dtr" => SerialPttLine::Dtr,
                other => return Err(eyre!("unknown PTT line {other:?}, expected rts or dtr")),
            };
            let trigger = match trigger.as_str() {
                "on" => SerialPttTrigger::On,
                "off" => SerialPttTrigger::Off,
                other => return Err(eyre!("unknown PTT trigger {other:?}, expected on or off")),
            };
            Ok(Box::new(SerialPtt::open_with(serial_port, line, trigger)?))
        }
        PttControlConfig::LibraryPttControl { library_path, .. } => {
            Ok(Box::new(LibraryPtt::load(library_path)?))
        }
        PttControlConfig::TcpPttControl { host, port, .. } => {
            Ok(Box::new(TcpPtt::connect(&format!("{host}:{port}"))?))
        }
    }
}

/// Resolve the `ptt_controls` array into a single controller: none, the one
/// entry, or a `ChainedPtt` fanning out to all of them.
fn build_ptt(config: &Config) -> Result<Box<dyn PttControl>> {
    match config.ptt_controls.as_slice() {
        [] => Ok(Box::new(NullPtt::default())),
        [single] => build_ptt_control(single),
        many => {
            let mut chain = ChainedPtt::new();
            for p in many {
                chain.push(build_ptt_control(p)?);
            }
            Ok(Box::new(chain))
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let config = Config::load(&config_path)?;

    let logger: &'static StructuredLogger =
        Box::leak(Box::new(StructuredLogger::new(config.logging.clone())?));
    log::set_logger(logger)
        .map(|()| log::set_max_level(log::LevelFilter::Info))
        .ok();

    let modulator_cfg = config
        .modulators
        .first()
        .ok_or_else(|| eyre!("config has no entries in `modulators`"))?;
    let audio_cfg = config
        .audio_streams
        .first()
        .ok_or_else(|| eyre!("config has no entries in `audio_streams`"))?;

    let (modem_config, converter) = modulator_cfg.resolve(48_000);
    let mut sink = build_audio_stream(audio_cfg, modem_config.sample_rate)?;
    let mut ptt = build_ptt(&config)?;

    let _modem = modem_core::Modem::new(modem_config, converter, sink.as_mut())
        .with_ptt(ptt.as_mut());

    logger.log(LogEvent::Info {
        message: format!(
            "modem ready: config={} audio_stream={:?} ptt_controls={} modulator={:?}",
            config_path.display(),
            audio_cfg.name(),
            config.ptt_controls.len(),
            modulator_cfg.name(),
        ),
    })?;

    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error handler: {e}");
        return ExitCode::FAILURE;
    }
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("modem: {e}");
            ExitCode::FAILURE
        }
    }
}
