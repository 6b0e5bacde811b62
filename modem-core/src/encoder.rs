//! AX.25 transmit pipeline: packet → frame bytes → stuffed NRZI bitstream.

use crate::bitstream::{add_hdlc_flags, bit_stuff, bits_to_bytes, bytes_to_bits, nrzi_encode};
use crate::frame::{encode_frame, Packet};

/// Encode a packet into a complete NRZI bitstream ready for modulation:
/// preamble flags + bit-stuffed frame + postamble flags, NRZI-encoded from
/// level 0.
pub fn encode_bitstream(packet: &Packet, preamble_flags: usize, postamble_flags: usize) -> Vec<u8> {
    let frame_bytes = encode_frame(&packet.from, &packet.to, &packet.path, &packet.data);
    encode_bitstream_from_frame(&frame_bytes, preamble_flags, postamble_flags)
}

/// Same as [`encode_bitstream`] but starting from already-encoded frame bytes
/// (used by the FX.25 path, which wraps the AX.25 block in its own flags).
pub fn encode_bitstream_from_frame(
    frame_bytes: &[u8],
    preamble_flags: usize,
    postamble_flags: usize,
) -> Vec<u8> {
    let frame_bits = bytes_to_bits(frame_bytes);
    let stuffed = bit_stuff(&frame_bits);

    let mut bitstream = Vec::with_capacity(stuffed.len() + 8 * (preamble_flags + postamble_flags));
    add_hdlc_flags(&mut bitstream, preamble_flags);
    bitstream.extend_from_slice(&stuffed);
    add_hdlc_flags(&mut bitstream, postamble_flags);

    nrzi_encode(&mut bitstream);
    bitstream
}

/// Encode frame bytes (HDLC flags included, bit-stuffed) without NRZI or
/// pre/postamble, for use as the FX.25 data-region payload.
pub fn encode_framed_bitstuffed_bytes(frame_bytes: &[u8]) -> Vec<u8> {
    let frame_bits = bytes_to_bits(frame_bytes);
    let stuffed = bit_stuff(&frame_bits);

    let mut bits = Vec::with_capacity(stuffed.len() + 16);
    add_hdlc_flags(&mut bits, 1);
    bits.extend_from_slice(&stuffed);
    add_hdlc_flags(&mut bits, 1);

    bits_to_bytes(&bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::{bit_unstuff, HDLC_FLAG_BITS};
    use crate::frame::try_decode_frame;

    fn packet() -> Packet {
        Packet {
            from: "N0CALL-1".parse().unwrap(),
            to: "APRS".parse().unwrap(),
            path: vec!["WIDE1-1".parse().unwrap()],
            data: b"hello".to_vec(),
        }
    }

    #[test]
    fn encoded_bitstream_starts_with_nrzi_encoded_flag() {
        let p = packet();
        let bits = encode_bitstream(&p, 2, 2);
        let mut expected = HDLC_FLAG_BITS;
        crate::bitstream::nrzi_encode(&mut expected);
        assert_eq!(&bits[..8], &expected);
        assert!(bits.len() > 16);
    }

    #[test]
    fn unwrapping_the_pipeline_recovers_the_frame() {
        let p = packet();
        let preamble = 2;
        let postamble = 2;
        let mut bits = encode_bitstream(&p, preamble, postamble);

        // Undo NRZI, then strip the flag-sized preamble/postamble windows.
        let mut last = 0u8;
        let mut decoded = Vec::with_capacity(bits.len());
        for b in bits.drain(..) {
            decoded.push(crate::bitstream::nrzi_decode(b, last));
            last = b;
        }
        let body = &decoded[preamble * 8..decoded.len() - postamble * 8];
        let unstuffed = bit_unstuff(body);
        let frame_bytes = crate::bitstream::bits_to_bytes(&unstuffed);
        let (frame, _) = try_decode_frame(&frame_bytes).unwrap();
        assert_eq!(frame.from, p.from);
        assert_eq!(frame.data, p.data);
    }
}
