//! AX.25/APRS software modem core.
//!
//! The signal chain — packet ↔ frame ↔ stuffed bitstream ↔ NRZI ↔ AFSK
//! samples — plus the synchronous decoder state machine, the FX.25
//! Reed-Solomon outer code, and the external-interface types (sample sink,
//! PTT, KISS framing, TCP control protocol) the orchestrator is wired
//! against. No platform audio backends, no CLI: those are external
//! collaborators, implemented in `modem-cli` or left to the caller.

pub mod address;
pub mod bitstream;
pub mod config;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod frame;
pub mod fx25;
pub mod kiss;
pub mod modulator;
pub mod pipeline;
pub mod ptt;
pub mod sink;
pub mod tcp_control;

pub use address::Address;
pub use config::ModemConfig;
pub use errors::{ModemError, Result};
pub use frame::{Frame, Packet};
pub use modulator::DdsAfskModulator;
pub use pipeline::{Converter, Modem};
pub use ptt::PttControl;
pub use sink::SampleSink;
