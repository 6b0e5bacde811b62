//! Modem error types, organized by concern.

use thiserror::Error;

/// Top-level error type for all modem operations.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("not initialized: {0}")]
    NotInitialized(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

/// Errors parsing addresses, packet strings, JSON config, or CLI arguments.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("address text must be 1-6 uppercase alphanumerics: {text:?}")]
    InvalidAddressText { text: String },

    #[error("SSID {ssid:?} is not a valid decimal 0-15")]
    InvalidSsid { ssid: String },

    #[error("address string {input:?} is empty or exceeds 9 characters")]
    InvalidAddressLength { input: String },

    #[error("malformed config: {reason}")]
    InvalidConfig { reason: String },

    #[error("malformed CLI arguments: {reason}")]
    InvalidCli { reason: String },
}

/// Errors rejecting a candidate AX.25 frame during decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame shorter than the minimum 18 octets: got {len}")]
    FrameTooShort { len: usize },

    #[error("no address terminator found in path region")]
    FrameTerminatorMissing,

    #[error("address region length {len} is not a multiple of 7")]
    AddressesMisaligned { len: usize },

    #[error("control/PID fields missing or out of bounds")]
    ControlFieldMissing,

    #[error("CRC mismatch: expected {expected:#06x}, got {actual:#06x}")]
    CrcMismatch { expected: u16, actual: u16 },
}

/// Errors surfaced by sample sinks and PTT device backends.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device busy")]
    Busy,

    #[error("device lost")]
    Lost,

    #[error("failed to open device: {reason}")]
    OpenFailed { reason: String },

    #[error("sample format not supported")]
    FormatNotSupported,

    #[error("buffer error: {reason}")]
    Buffer { reason: String },

    #[error("buffer underrun")]
    Underrun,

    #[error("buffer overrun")]
    Overrun,

    #[error("device operation timed out")]
    Timeout,
}

/// Errors from the JSON-over-TCP control protocol (malformed messages).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON message: {reason}")]
    MalformedMessage { reason: String },

    #[error("unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("remote returned an error: {reason}")]
    RemoteError { reason: String },
}

/// Errors from the TCP transport underneath the control protocol.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection reset")]
    Reset,

    #[error("connection refused")]
    Refused,

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ConnectionError {
    fn from(e: std::io::Error) -> Self {
        ConnectionError::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModemError>;
