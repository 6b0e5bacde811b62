//! KISS TNC framing: `FEND`-delimited frames carrying a command/port byte
//! followed by a raw AX.25 frame (no FCS, no bit-stuffing — those belong to
//! the HDLC layer underneath).

const FEND: u8 = 0xC0;
const FESC: u8 = 0xDB;
const TFEND: u8 = 0xDC;
const TFESC: u8 = 0xDD;

/// KISS command nibble, low bits of the first frame byte; the high nibble is
/// the port number (only port 0 is relevant for a single-modem instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Data,
    TxDelay,
    Persistence,
    SlotTime,
    TxTail,
    FullDuplex,
    SetHardware,
    Return,
    Other(u8),
}

impl Command {
    fn to_nibble(self) -> u8 {
        match self {
            Command::Data => 0x0,
            Command::TxDelay => 0x1,
            Command::Persistence => 0x2,
            Command::SlotTime => 0x3,
            Command::TxTail => 0x4,
            Command::FullDuplex => 0x5,
            Command::SetHardware => 0x6,
            Command::Return => 0xFF,
            Command::Other(n) => n & 0x0F,
        }
    }

    fn from_nibble(n: u8) -> Command {
        match n {
            0x0 => Command::Data,
            0x1 => Command::TxDelay,
            0x2 => Command::Persistence,
            0x3 => Command::SlotTime,
            0x4 => Command::TxTail,
            0x5 => Command::FullDuplex,
            0x6 => Command::SetHardware,
            0xFF => Command::Return,
            other => Command::Other(other),
        }
    }
}

/// A single decoded KISS frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KissFrame {
    pub port: u8,
    pub command: Command,
    pub payload: Vec<u8>,
}

/// Escape `data` and wrap it in `FEND` delimiters with the given port/command
/// header byte.
pub fn encode_frame(port: u8, command: Command, payload: &[u8]) -> Vec<u8> {
    let header = ((port & 0x0F) << 4) | command.to_nibble();
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.push(FEND);
    escape_into(&mut out, &[header]);
    escape_into(&mut out, payload);
    out.push(FEND);
    out
}

fn escape_into(out: &mut Vec<u8>, data: &[u8]) {
    for &b in data {
        match b {
            FEND => {
                out.push(FESC);
                out.push(TFEND);
            }
            FESC => {
                out.push(FESC);
                out.push(TFESC);
            }
            other => out.push(other),
        }
    }
}

/// Incremental KISS frame decoder: feed raw bytes from the transport one at
/// a time (or in chunks via [`KissDecoder::feed`]), draining completed
/// frames with [`KissDecoder::next_frame`].
#[derive(Debug, Default)]
pub struct KissDecoder {
    in_frame: bool,
    escaped: bool,
    buffer: Vec<u8>,
    ready: std::collections::VecDeque<KissFrame>,
}

impl KissDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.feed_byte(b);
        }
    }

    fn feed_byte(&mut self, b: u8) {
        match b {
            FEND => {
                if self.in_frame && !self.buffer.is_empty() {
                    if let Some(frame) = decode_buffer(&self.buffer) {
                        self.ready.push_back(frame);
                    }
                }
                self.buffer.clear();
                self.escaped = false;
                self.in_frame = true;
            }
            FESC if self.in_frame => {
                self.escaped = true;
            }
            TFEND if self.in_frame && self.escaped => {
                self.buffer.push(FEND);
                self.escaped = false;
            }
            TFESC if self.in_frame && self.escaped => {
                self.buffer.push(FESC);
                self.escaped = false;
            }
            other if self.in_frame => {
                self.escaped = false;
                self.buffer.push(other);
            }
            _ => {}
        }
    }

    pub fn next_frame(&mut self) -> Option<KissFrame> {
        self.ready.pop_front()
    }
}

fn decode_buffer(buffer: &[u8]) -> Option<KissFrame> {
    let header = *buffer.first()?;
    Some(KissFrame {
        port: (header >> 4) & 0x0F,
        command: Command::from_nibble(header & 0x0F),
        payload: buffer[1..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wraps_in_fend_with_data_command() {
        let frame = encode_frame(0, Command::Data, &[1, 2, 3]);
        assert_eq!(frame.first(), Some(&FEND));
        assert_eq!(frame.last(), Some(&FEND));
        assert_eq!(frame[1], 0x00);
    }

    #[test]
    fn escapes_fend_and_fesc_bytes_in_payload() {
        let frame = encode_frame(0, Command::Data, &[FEND, FESC, 0x42]);
        assert_eq!(&frame[1..], &[0x00, FESC, TFEND, FESC, TFESC, 0x42, FEND]);
    }

    #[test]
    fn decoder_round_trips_encoded_frame() {
        let payload = vec![0xC0, 0xDB, 0x10, 0x20];
        let encoded = encode_frame(2, Command::Data, &payload);

        let mut decoder = KissDecoder::new();
        decoder.feed(&encoded);
        let frame = decoder.next_frame().expect("one frame");
        assert_eq!(frame.port, 2);
        assert_eq!(frame.command, Command::Data);
        assert_eq!(frame.payload, payload);
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn decoder_handles_back_to_back_frames() {
        let a = encode_frame(0, Command::Data, b"first");
        let b = encode_frame(0, Command::Data, b"second");
        let mut stream = a;
        stream.extend(b);

        let mut decoder = KissDecoder::new();
        decoder.feed(&stream);
        assert_eq!(decoder.next_frame().unwrap().payload, b"first");
        assert_eq!(decoder.next_frame().unwrap().payload, b"second");
    }

    #[test]
    fn tx_delay_command_round_trips() {
        let encoded = encode_frame(0, Command::TxDelay, &[50]);
        let mut decoder = KissDecoder::new();
        decoder.feed(&encoded);
        let frame = decoder.next_frame().unwrap();
        assert_eq!(frame.command, Command::TxDelay);
        assert_eq!(frame.payload, vec![50]);
    }
}
