//! Streaming AX.25 decoder: a single-bit-at-a-time state machine that
//! synchronizes on HDLC flags, tolerates a flag shared between adjacent
//! frames, and bounds its own memory on noise.

use std::collections::VecDeque;

use crate::bitstream::{bit_unstuff, bits_to_bytes, nrzi_decode};
use crate::errors::ModemError;
use crate::frame::{try_decode_frame, Frame};

const WATCHDOG_BITS: usize = 8000;
const SEARCH_TRIM_THRESHOLD: usize = 16;
const SEARCH_TRIM_KEEP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Searching,
    InPreamble,
    InFrame,
}

/// Decoder state, exclusive to the thread feeding it bits.
pub struct BitstreamState {
    pub phase: Phase,
    pub complete: bool,
    last_nrzi_level: u8,
    bitstream: VecDeque<u8>,
    frame_start_index: usize,
    global_bit_count: u64,

    global_preamble_start_pending: u64,
    frame_nrzi_level_pending: u8,
    preamble_count_pending: u32,
    postamble_count_pending: u32,

    pub global_preamble_start: u64,
    pub global_postamble_end: u64,
    pub frame_nrzi_level: u8,
    pub frame_size_bits: usize,
    pub preamble_count: u32,
    pub postamble_count: u32,

    /// Last successfully decoded frame.
    pub frame: Option<Frame>,
    /// Error from the last decode attempt, if it was rejected (CRC mismatch,
    /// malformed addresses, ...). A validly framed but CRC-failing packet
    /// still reports `complete = true`.
    pub last_error: Option<ModemError>,
}

impl Default for BitstreamState {
    fn default() -> Self {
        BitstreamState {
            phase: Phase::Searching,
            complete: false,
            last_nrzi_level: 0,
            bitstream: VecDeque::new(),
            frame_start_index: 0,
            global_bit_count: 0,
            global_preamble_start_pending: 0,
            frame_nrzi_level_pending: 0,
            preamble_count_pending: 0,
            postamble_count_pending: 0,
            global_preamble_start: 0,
            global_postamble_end: 0,
            frame_nrzi_level: 0,
            frame_size_bits: 0,
            preamble_count: 0,
            postamble_count: 0,
            frame: None,
            last_error: None,
        }
    }
}

fn ends_with_hdlc_flag(buffer: &VecDeque<u8>) -> bool {
    if buffer.len() < 8 {
        return false;
    }
    let start = buffer.len() - 8;
    const PATTERN: [u8; 8] = [0, 1, 1, 1, 1, 1, 1, 0];
    (0..8).all(|i| buffer[start + i] == PATTERN[i])
}

impl BitstreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw (NRZI-line) bit. Returns `true` iff a frame was
    /// assembled and `try_decode_frame` on it succeeded; `self.complete`
    /// is set whenever a frame boundary closed regardless of that outcome.
    pub fn step(&mut self, raw_bit: u8) -> bool {
        if self.complete {
            self.complete = false;
        }

        let decoded = nrzi_decode(raw_bit, self.last_nrzi_level);
        self.last_nrzi_level = raw_bit;
        self.bitstream.push_back(decoded);
        self.global_bit_count += 1;

        let flag = ends_with_hdlc_flag(&self.bitstream);

        match self.phase {
            Phase::Searching => {
                if flag {
                    self.phase = Phase::InPreamble;
                    self.frame_start_index = self.bitstream.len();
                    self.preamble_count_pending = 1;
                    self.global_preamble_start_pending = self.global_bit_count;
                    self.frame_nrzi_level_pending = self.last_nrzi_level;
                } else if self.bitstream.len() > SEARCH_TRIM_THRESHOLD {
                    let excess = self.bitstream.len() - SEARCH_TRIM_KEEP;
                    self.bitstream.drain(0..excess);
                }
                false
            }
            Phase::InPreamble => {
                if flag {
                    self.frame_start_index = self.bitstream.len();
                    self.preamble_count_pending += 1;
                } else if self.bitstream.len() - self.frame_start_index >= 8 {
                    self.phase = Phase::InFrame;
                }
                false
            }
            Phase::InFrame => self.step_in_frame(flag),
        }
    }

    fn step_in_frame(&mut self, flag: bool) -> bool {
        if flag {
            let frame_end = self.bitstream.len() - 8;
            if frame_end > self.frame_start_index {
                let frame_bits: Vec<u8> = self
                    .bitstream
                    .iter()
                    .skip(self.frame_start_index)
                    .take(frame_end - self.frame_start_index)
                    .copied()
                    .collect();
                let unstuffed = bit_unstuff(&frame_bits);
                let frame_bytes = bits_to_bytes(&unstuffed);
                let decode_result = try_decode_frame(&frame_bytes);

                self.global_preamble_start = self.global_preamble_start_pending;
                self.global_postamble_end = self.global_bit_count;
                self.frame_nrzi_level = self.frame_nrzi_level_pending;
                self.frame_size_bits = frame_end - self.frame_start_index;
                self.preamble_count = self.preamble_count_pending;
                self.postamble_count = 1;

                self.bitstream.drain(0..frame_end);
                self.frame_start_index = self.bitstream.len();
                self.phase = Phase::InPreamble;
                self.preamble_count_pending = 1;
                self.complete = true;

                match decode_result {
                    Ok((frame, _crc)) => {
                        self.frame = Some(frame);
                        self.last_error = None;
                        true
                    }
                    Err(e) => {
                        self.last_error = Some(e);
                        false
                    }
                }
            } else {
                // Two flags back-to-back: an empty frame. Stay in preamble,
                // don't touch the pending counters.
                self.frame_start_index = self.bitstream.len();
                false
            }
        } else if self.bitstream.len() > WATCHDOG_BITS {
            self.bitstream.clear();
            self.phase = Phase::Searching;
            self.frame_start_index = 0;
            self.preamble_count_pending = 0;
            self.postamble_count_pending = 0;
            false
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_bitstream;
    use crate::frame::Packet;

    fn test_packet(data: &[u8]) -> Packet {
        Packet {
            from: "N0CALL-1".parse().unwrap(),
            to: "APRS".parse().unwrap(),
            path: vec!["WIDE1-1".parse().unwrap()],
            data: data.to_vec(),
        }
    }

    #[test]
    fn decodes_a_single_packet() {
        let packet = test_packet(b"hello world");
        let bits = encode_bitstream(&packet, 3, 3);

        let mut state = BitstreamState::new();
        let mut completions = 0;
        for bit in bits {
            if state.step(bit) {
                completions += 1;
                assert_eq!(state.frame.as_ref().unwrap().data, b"hello world");
            }
        }
        assert_eq!(completions, 1);
    }

    #[test]
    fn scenario_4_shared_flag_between_two_packets() {
        let p1 = test_packet(b"first");
        let p2 = test_packet(b"second");

        let mut bits = encode_bitstream(&p1, 3, 3);
        bits.extend(encode_bitstream(&p2, 3, 3));

        let mut state = BitstreamState::new();
        let mut decoded = Vec::new();
        let mut complete_count = 0;
        for bit in bits {
            if state.step(bit) {
                decoded.push(state.frame.as_ref().unwrap().data.clone());
            }
            if state.complete {
                complete_count += 1;
            }
        }

        assert_eq!(complete_count, 2);
        assert_eq!(decoded, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[test]
    fn watchdog_resets_to_searching_on_noise() {
        use crate::bitstream::{nrzi_encode, HDLC_FLAG_BITS};

        let mut state = BitstreamState::new();

        // Two consecutive flags: preamble of one flag, then one non-flag
        // octet to force a transition into in_frame.
        let mut raw = HDLC_FLAG_BITS;
        nrzi_encode(&mut raw);
        for &b in &raw {
            state.step(b);
        }
        let mut data_octet = [1u8, 0, 1, 0, 1, 0, 1, 0];
        nrzi_encode(&mut data_octet);
        for &b in &data_octet {
            state.step(b);
        }
        assert_eq!(state.phase, Phase::InFrame);

        for i in 0..9000u32 {
            state.step((i % 2) as u8);
        }
        assert_eq!(state.phase, Phase::Searching);
        assert!(!state.step(0));
    }
}
