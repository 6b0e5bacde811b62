use proptest::prelude::*;

use modem_core::address::Address;
use modem_core::bitstream::{bit_stuff, bit_unstuff, bits_to_bytes, bytes_to_bits, nrzi_decode_range, nrzi_encode};
use modem_core::crc::{crc16, crc16_lut};
use modem_core::frame::{encode_frame, try_decode_frame};

fn call_sign() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,6}"
}

fn ssid() -> impl Strategy<Value = u8> {
    0u8..=15
}

proptest! {
    /// Address round-trip: `parse(format(a)) == a` for any valid address.
    #[test]
    fn address_round_trips(text in call_sign(), ssid in ssid(), has_been_repeated in any::<bool>()) {
        let printable = if has_been_repeated {
            format!("{text}-{ssid}*")
        } else {
            format!("{text}-{ssid}")
        };
        let addr: Address = printable.parse().unwrap();
        let reformatted = addr.to_string();
        let reparsed: Address = reformatted.parse().unwrap();
        prop_assert_eq!(addr, reparsed);
    }

    /// Bit codec round-trip: `bits_to_bytes(bytes_to_bits(b)) == b`.
    #[test]
    fn bit_codec_round_trips(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let bits = bytes_to_bits(&bytes);
        let back = bits_to_bytes(&bits);
        prop_assert_eq!(back, bytes);
    }

    /// Stuffing round-trip for bit sequences that don't already contain the
    /// HDLC flag pattern, and the stuffed sequence never carries six
    /// consecutive ones.
    #[test]
    fn stuffing_round_trips(bits in prop::collection::vec(0u8..=1u8, 0..200)) {
        let stuffed = bit_stuff(&bits);
        let mut run = 0;
        for &b in &stuffed {
            if b == 1 {
                run += 1;
                prop_assert!(run < 6);
            } else {
                run = 0;
            }
        }
        let unstuffed = bit_unstuff(&stuffed);
        prop_assert_eq!(unstuffed, bits);
    }

    /// NRZI round-trip from an initial line state of 0, on the second
    /// through last bits (the first decoded bit depends on a line state
    /// from before this sequence began and is not recoverable).
    #[test]
    fn nrzi_round_trips(bits in prop::collection::vec(0u8..=1u8, 1..200)) {
        let mut encoded = bits.clone();
        nrzi_encode(&mut encoded);
        nrzi_decode_range(&mut encoded, 0);
        prop_assert_eq!(&encoded[1..], &bits[1..]);
    }

    /// Bitwise and table-driven CRC agree on arbitrary inputs.
    #[test]
    fn crc_bitwise_and_lut_agree(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(crc16(&bytes), crc16_lut(&bytes));
    }

    /// Frame round-trip: decoding an encoded packet recovers the same
    /// addresses and payload, with the CRC matching the recomputed one.
    #[test]
    fn frame_round_trips(
        from_text in call_sign(),
        from_ssid in ssid(),
        to_text in call_sign(),
        to_ssid in ssid(),
        data in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let from: Address = format!("{from_text}-{from_ssid}").parse().unwrap();
        let to: Address = format!("{to_text}-{to_ssid}").parse().unwrap();
        let path = vec![];
        let encoded = encode_frame(&from, &to, &path, &data);
        let (decoded, _crc) = try_decode_frame(&encoded).expect("valid frame must decode");
        prop_assert_eq!(decoded.from, from);
        prop_assert_eq!(decoded.to, to);
        prop_assert_eq!(decoded.data, data);
    }
}
