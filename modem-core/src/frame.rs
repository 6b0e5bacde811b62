//! AX.25 UI frame: addresses + control + PID + info + FCS.

use crate::address::Address;
use crate::crc;
use crate::errors::{DecodeError, ModemError};

const CONTROL_UI: u8 = 0x03;
const PID_NO_L3: u8 = 0xF0;

/// A decoded or to-be-encoded AX.25 UI frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub to: Address,
    pub from: Address,
    pub path: Vec<Address>,
    pub data: Vec<u8>,
}

/// A user-level packet: APRS-style `from>to,path:data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub from: Address,
    pub to: Address,
    pub path: Vec<Address>,
    pub data: Vec<u8>,
}

impl From<Frame> for Packet {
    fn from(f: Frame) -> Self {
        Packet {
            from: f.from,
            to: f.to,
            path: f.path,
            data: f.data,
        }
    }
}

/// Encode `to`, `from`, `path` into the header octets (no control/PID/info/CRC).
pub fn encode_header(from: &Address, to: &Address, path: &[Address]) -> Vec<u8> {
    let mut out = Vec::with_capacity(14 + path.len() * 7);
    out.extend_from_slice(&to.encode(false));
    out.extend_from_slice(&from.encode(path.is_empty()));
    for (i, addr) in path.iter().enumerate() {
        let last = i == path.len() - 1;
        out.extend_from_slice(&addr.encode(last));
    }
    out
}

/// Encode a full AX.25 UI frame: header + control + PID + info + CRC.
pub fn encode_frame(from: &Address, to: &Address, path: &[Address], info: &[u8]) -> Vec<u8> {
    let mut frame = encode_header(from, to, path);
    frame.push(CONTROL_UI);
    frame.push(PID_NO_L3);
    frame.extend_from_slice(info);
    let crc = crc::crc16(&frame);
    frame.extend_from_slice(&crc);
    frame
}

/// Decode a full AX.25 UI frame, including the trailing FCS check.
pub fn try_decode_frame(bytes: &[u8]) -> Result<(Frame, [u8; 2]), ModemError> {
    if bytes.len() < 18 {
        return Err(DecodeError::FrameTooShort { len: bytes.len() }.into());
    }

    let payload = &bytes[..bytes.len() - 2];
    let received_crc = [bytes[bytes.len() - 2], bytes[bytes.len() - 1]];
    let computed_crc = crc::crc16_lut(payload);
    if computed_crc != received_crc {
        return Err(DecodeError::CrcMismatch {
            expected: u16::from_le_bytes(computed_crc),
            actual: u16::from_le_bytes(received_crc),
        }
        .into());
    }

    let (frame, _) = try_decode_frame_no_fcs(payload)?;
    Ok((frame, received_crc))
}

/// Decode an AX.25 frame whose FCS has already been stripped (e.g. by KISS),
/// performing no CRC check.
pub fn try_decode_frame_no_fcs(bytes: &[u8]) -> Result<(Frame, usize), ModemError> {
    let len = bytes.len();
    if len < 16 {
        return Err(DecodeError::FrameTooShort { len }.into());
    }

    let to_bytes: [u8; 7] = bytes[0..7].try_into().unwrap();
    let from_bytes: [u8; 7] = bytes[7..14].try_into().unwrap();
    let (mut to, _) = Address::decode(&to_bytes);
    let (mut from, _) = Address::decode(&from_bytes);
    // C-bit in source/destination has a different meaning than the H-bit in
    // digipeaters; it is not a "has-been-repeated" mark.
    to.mark = false;
    from.mark = false;

    let addresses_start = 14usize;
    let mut addresses_end = addresses_start;
    let mut found_last = (bytes[13] & 0x01) != 0;

    let mut i = addresses_start;
    while !found_last && i + 7 <= len {
        let b = bytes[i];
        if (b & 0x03) == 0x03 || (b & 0x03) == 0x01 {
            addresses_end = i;
            found_last = true;
        } else if (bytes[i + 6] & 0x01) != 0 {
            addresses_end = i + 7;
            found_last = true;
        }
        i += 7;
    }

    if !found_last {
        return Err(DecodeError::FrameTerminatorMissing.into());
    }

    let addresses_len = addresses_end - addresses_start;
    if addresses_len % 7 != 0 {
        return Err(DecodeError::AddressesMisaligned { len: addresses_len }.into());
    }

    let mut path = Vec::with_capacity(addresses_len / 7);
    let mut j = addresses_start;
    while j < addresses_end {
        let addr_bytes: [u8; 7] = bytes[j..j + 7].try_into().unwrap();
        path.push(Address::decode(&addr_bytes).0);
        j += 7;
    }

    let info_start = addresses_end + 2;
    if info_start > len {
        return Err(DecodeError::ControlFieldMissing.into());
    }
    let data = bytes[info_start..len].to_vec();

    Ok((
        Frame {
            to,
            from,
            path,
            data,
        },
        info_start,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn scenario_1_round_trips_and_crc_matches_lut() {
        let from = addr("N0CALL-1");
        let to = addr("APRS");
        let path = vec![addr("WIDE1-1"), addr("WIDE2-2")];
        let info = b"=4740.00N/12212.00W-";

        let encoded = encode_frame(&from, &to, &path, info);
        let (decoded_frame, crc) = try_decode_frame(&encoded).unwrap();

        assert_eq!(decoded_frame.from, from);
        assert_eq!(decoded_frame.to, to);
        assert_eq!(decoded_frame.path, path);
        assert_eq!(decoded_frame.data, info);

        let expected_crc = crc::crc16_lut(&encoded[..encoded.len() - 2]);
        assert_eq!(crc, expected_crc);
    }

    #[test]
    fn no_path_marks_from_as_last_address() {
        let from = addr("N0CALL-1");
        let to = addr("APRS");
        let encoded = encode_frame(&from, &to, &[], b"hi");
        let (frame, _) = try_decode_frame(&encoded).unwrap();
        assert!(frame.path.is_empty());
    }

    #[test]
    fn truncated_frame_rejected() {
        let bytes = vec![0u8; 10];
        assert!(try_decode_frame(&bytes).is_err());
    }

    #[test]
    fn corrupted_crc_rejected() {
        let from = addr("N0CALL-1");
        let to = addr("APRS");
        let mut encoded = encode_frame(&from, &to, &[], b"hi");
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        assert!(try_decode_frame(&encoded).is_err());
    }

    #[test]
    fn no_fcs_variant_skips_crc_check() {
        let from = addr("N0CALL-1");
        let to = addr("APRS");
        let encoded = encode_frame(&from, &to, &[], b"hi");
        let payload = &encoded[..encoded.len() - 2];
        let (frame, consumed) = try_decode_frame_no_fcs(payload).unwrap();
        assert_eq!(frame.data, b"hi");
        assert_eq!(consumed + frame.data.len(), payload.len());
    }
}
