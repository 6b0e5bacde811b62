//! FX.25: a backward-compatible Reed-Solomon outer code wrapping an
//! HDLC-framed, bit-stuffed AX.25 block. Encode only; FX.25 receive-side
//! error correction is out of scope (see spec Non-goals).

use reed_solomon::Encoder;

/// One fixed (tag, total, data, check) FX.25 mode.
pub struct Mode {
    pub tag: u64,
    pub total: usize,
    pub data: usize,
    pub check: usize,
}

/// The eleven fixed modes, ascending by `data` size, as used for mode
/// selection (first mode whose `data` fits and whose `check` meets the
/// caller's minimum wins).
pub const MODES: [Mode; 11] = [
    Mode { tag: 0x8F05_6EB4_3696_60EE, total: 48, data: 32, check: 16 },
    Mode { tag: 0xDBF8_69BD_2DBB_1776, total: 64, data: 32, check: 32 },
    Mode { tag: 0xC7DC_0508_F3D9_B09E, total: 80, data: 64, check: 16 },
    Mode { tag: 0x1EB7_B9CD_BC09_C00E, total: 96, data: 64, check: 32 },
    Mode { tag: 0x4A4A_BEC4_A724_B796, total: 128, data: 64, check: 64 },
    Mode { tag: 0x26FF_60A6_00CC_8FDE, total: 144, data: 128, check: 16 },
    Mode { tag: 0xFF94_DC63_4F1C_FF4E, total: 160, data: 128, check: 32 },
    Mode { tag: 0xAB69_DB6A_5431_88D6, total: 192, data: 128, check: 64 },
    Mode { tag: 0x3ADB_0C13_DEAE_2836, total: 255, data: 191, check: 64 },
    Mode { tag: 0x6E26_0B1A_C583_5FAE, total: 255, data: 223, check: 32 },
    Mode { tag: 0xB74D_B7DF_8A53_2F3E, total: 255, data: 239, check: 16 },
];

fn select_mode(len: usize, min_check_bytes: usize) -> Option<&'static Mode> {
    MODES.iter().find(|m| len <= m.data && m.check >= min_check_bytes)
}

/// Encode a complete FX.25 frame: `[tag(8 LE)][data bytes][check bytes]`.
/// `frame_bytes` is the HDLC-flagged, bit-stuffed AX.25 block, left-aligned
/// and padded with `0x7E` to the selected mode's `data` size. Returns an
/// empty vector if no mode is large enough.
pub fn encode_fx25_frame(frame_bytes: &[u8], min_check_bytes: usize) -> Vec<u8> {
    let mode = match select_mode(frame_bytes.len(), min_check_bytes) {
        Some(m) => m,
        None => return Vec::new(),
    };

    let mut data_block = vec![0x7Eu8; mode.data];
    data_block[..frame_bytes.len()].copy_from_slice(frame_bytes);

    // RS(255, 255-check) over GF(2^8), poly 0x11D, fcr=1, prim=1. The
    // data block is shorter than 255-check bytes for every mode but the
    // three widest ones; the encoder treats it as a shortened code with
    // implicit leading zeros, matching the parent-code-with-padding
    // construction in the reference implementation.
    let encoder = Encoder::new(mode.check);
    let encoded = encoder.encode(&data_block);

    let mut out = Vec::with_capacity(8 + mode.data + mode.check);
    out.extend_from_slice(&mode.tag.to_le_bytes());
    out.extend_from_slice(&encoded[..mode.data]);
    out.extend_from_slice(&encoded[mode.data..mode.data + mode.check]);
    out
}

/// Full FX.25 encode from a bare AX.25 frame: wrap it in a single HDLC flag
/// on each side, bit-stuff it, then apply [`encode_fx25_frame`].
pub fn encode_fx25_bitstream(
    ax25_frame: &[u8],
    preamble_flags: usize,
    postamble_flags: usize,
    min_check_bytes: usize,
) -> Vec<u8> {
    use crate::bitstream::{add_hdlc_flags, bytes_to_bits, nrzi_encode};
    use crate::encoder::encode_framed_bitstuffed_bytes;

    let ax25_packet_bytes = encode_framed_bitstuffed_bytes(ax25_frame);
    let fx25_frame = encode_fx25_frame(&ax25_packet_bytes, min_check_bytes);
    if fx25_frame.is_empty() {
        return Vec::new();
    }

    let mut bitstream = Vec::new();
    add_hdlc_flags(&mut bitstream, preamble_flags);
    bitstream.extend_from_slice(&bytes_to_bits(&fx25_frame));
    add_hdlc_flags(&mut bitstream, postamble_flags);

    nrzi_encode(&mut bitstream);
    bitstream
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_5_selects_mode_and_preserves_input_bytes() {
        let block = vec![0xAAu8; 100];
        let encoded = encode_fx25_frame(&block, 16);

        assert_eq!(encoded.len(), 8 + 128 + 16);
        assert_eq!(
            u64::from_le_bytes(encoded[..8].try_into().unwrap()),
            0x26FF_60A6_00CC_8FDE
        );
        assert_eq!(&encoded[8..8 + 100], &block[..]);
    }

    #[test]
    fn oversized_block_fails_to_encode() {
        let block = vec![0u8; 500];
        assert!(encode_fx25_frame(&block, 0).is_empty());
    }

    #[test]
    fn min_check_bytes_skips_undersized_check_modes() {
        let block = vec![0u8; 20];
        let encoded = encode_fx25_frame(&block, 32);
        // Smallest mode with data>=20 and check>=32 is (total=64, data=32, check=32).
        assert_eq!(encoded.len(), 8 + 32 + 32);
    }
}
