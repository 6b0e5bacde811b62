//! Framed JSON-over-TCP control protocol shared by the TCP PTT client and
//! the stream-control server: `u32` big-endian length prefix, then a UTF-8
//! JSON body.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ConnectionError, ModemError, ProtocolError};
use crate::ptt::PttControl;
use crate::sink::SampleSink;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRequest {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Ok { value: Value },
    Err { error: String },
}

/// Write one length-prefixed JSON message.
pub fn write_message<W: Write>(w: &mut W, body: &impl Serialize) -> Result<(), ModemError> {
    let json = serde_json::to_vec(body)
        .map_err(|e| ProtocolError::MalformedMessage { reason: e.to_string() })?;
    let len = json.len() as u32;
    w.write_all(&len.to_be_bytes())
        .map_err(|e| ConnectionError::from(e))?;
    w.write_all(&json).map_err(|e| ConnectionError::from(e))?;
    Ok(())
}

/// Read one length-prefixed JSON message.
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(r: &mut R) -> Result<T, ModemError> {
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).map_err(|e| ConnectionError::from(e))?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    r.read_exact(&mut body).map_err(|e| ConnectionError::from(e))?;
    serde_json::from_slice(&body)
        .map_err(|e| ProtocolError::MalformedMessage { reason: e.to_string() }.into())
}

/// Issue one request over an open TCP stream and return its result value.
pub fn call(stream: &mut TcpStream, command: &str, value: Option<Value>) -> Result<Value, ModemError> {
    write_message(
        stream,
        &ControlRequest {
            command: command.to_string(),
            value,
        },
    )?;
    match read_message::<_, ControlResponse>(stream)? {
        ControlResponse::Ok { value } => Ok(value),
        ControlResponse::Err { error } => Err(ProtocolError::RemoteError { reason: error }.into()),
    }
}

/// Dispatch one request against a sink + PTT controller pair, the core of a
/// stream-control server. Exposed as a function rather than a full server
/// loop so callers can plug it into whatever accept loop they run.
pub fn dispatch(
    sink: &mut dyn SampleSink,
    ptt: &mut dyn PttControl,
    name: &str,
    request: &ControlRequest,
) -> ControlResponse {
    let result: Result<Value, ModemError> = match request.command.as_str() {
        "get_name" => Ok(Value::String(name.to_string())),
        "get_type" => Ok(Value::String("modem".to_string())),
        "get_volume" => Ok(Value::from(1.0)),
        "set_volume" => Ok(Value::Null),
        "get_sample_rate" => Ok(Value::from(sink.sample_rate())),
        "get_channels" => Ok(Value::from(sink.channels())),
        "start" => sink.start().map(|_| Value::Null),
        "stop" => sink.stop().map(|_| Value::Null),
        "set_ptt" => {
            let enable = request
                .value
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(false);
            ptt.set(enable).map(|_| Value::Null)
        }
        "get_ptt" => Ok(Value::Bool(ptt.get())),
        other => Err(ProtocolError::UnknownCommand {
            command: other.to_string(),
        }
        .into()),
    };

    match result {
        Ok(value) => ControlResponse::Ok { value },
        Err(e) => ControlResponse::Err { error: e.to_string() },
    }
}

/// Accept a single connection on `listener` and serve control requests
/// against `sink`/`ptt` until the peer disconnects. One connection at a
/// time, matching the stream-control server's scope in §6.
pub fn serve_once(
    listener: &TcpListener,
    sink: &mut dyn SampleSink,
    ptt: &mut dyn PttControl,
    name: &str,
) -> Result<(), ModemError> {
    let (mut stream, _peer) = listener.accept().map_err(|e| ConnectionError::from(e))?;
    loop {
        let request: ControlRequest = match read_message(&mut stream) {
            Ok(r) => r,
            Err(_) => break,
        };
        let response = dispatch(sink, ptt, name, &request);
        write_message(&mut stream, &response)?;
    }
    Ok(())
}
