//! AX.25 address: printable `TEXT[-SSID][*]` form and 7-byte wire form.

use crate::errors::{ParseError, Result as ModemResult};
use std::fmt;
use std::str::FromStr;

/// A single AX.25 callsign-SSID address.
///
/// `reserved` defaults to `(true, true)` (R1, R2), matching every address
/// observed on the air; the field exists so a caller reconstructing a frame
/// byte-for-byte from a capture can preserve whatever bits were actually set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    text: [u8; 6],
    len: u8,
    pub ssid: u8,
    pub mark: bool,
    pub reserved: (bool, bool),
}

impl Address {
    pub fn new(text: &str, ssid: u8, mark: bool) -> ModemResult<Self> {
        if text.is_empty() || text.len() > 6 || !text.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ParseError::InvalidAddressText {
                text: text.to_string(),
            }
            .into());
        }
        if ssid > 15 {
            return Err(ParseError::InvalidSsid {
                ssid: ssid.to_string(),
            }
            .into());
        }
        let mut buf = [0u8; 6];
        buf[..text.len()].copy_from_slice(text.as_bytes());
        Ok(Address {
            text: buf,
            len: text.len() as u8,
            ssid,
            mark,
            reserved: (true, true),
        })
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.text[..self.len as usize]).expect("ascii alphanumeric")
    }

    /// Encode the 7-byte wire form. `last` sets the address-list terminator bit.
    pub fn encode(&self, last: bool) -> [u8; 7] {
        let mut out = [0u8; 7];
        for i in 0..6 {
            let ch = if (i as u8) < self.len {
                self.text[i]
            } else {
                b' '
            };
            out[i] = ch << 1;
        }
        let h = if self.mark { 1u8 } else { 0u8 };
        let r1 = if self.reserved.0 { 1u8 } else { 0u8 };
        let r2 = if self.reserved.1 { 1u8 } else { 0u8 };
        let last_bit = if last { 1u8 } else { 0u8 };
        out[6] = (h << 7) | (r1 << 6) | (r2 << 5) | (self.ssid << 1) | last_bit;
        out
    }

    /// Parse a 7-byte wire form, returning the address and its `last` bit.
    pub fn decode(bytes: &[u8; 7]) -> (Self, bool) {
        let mut text = [0u8; 6];
        for i in 0..6 {
            text[i] = bytes[i] >> 1;
        }
        let mut len = 6usize;
        while len > 0 && text[len - 1] == b' ' {
            len -= 1;
        }
        for i in len..6 {
            text[i] = 0;
        }
        let ssid = (bytes[6] >> 1) & 0x0F;
        let mark = (bytes[6] & 0x80) != 0;
        let r1 = (bytes[6] & 0x40) != 0;
        let r2 = (bytes[6] & 0x20) != 0;
        let last = (bytes[6] & 0x01) != 0;
        (
            Address {
                text,
                len: len as u8,
                ssid,
                mark,
                reserved: (r1, r2),
            },
            last,
        )
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())?;
        if self.ssid > 0 {
            write!(f, "-{}", self.ssid)?;
        }
        if self.mark {
            write!(f, "*")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = crate::errors::ModemError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() || input.len() > 9 {
            return Err(ParseError::InvalidAddressLength {
                input: input.to_string(),
            }
            .into());
        }

        let mark = input.ends_with('*');
        let body = if mark { &input[..input.len() - 1] } else { input };

        let (text, ssid) = match body.rfind('-') {
            None => (body, 0u8),
            Some(pos) => {
                let ssid_str = &body[pos + 1..];
                if ssid_str.is_empty()
                    || (ssid_str.len() > 1 && ssid_str.starts_with('0'))
                    || !ssid_str.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(ParseError::InvalidSsid {
                        ssid: ssid_str.to_string(),
                    }
                    .into());
                }
                let value: u32 = ssid_str.parse().map_err(|_| ParseError::InvalidSsid {
                    ssid: ssid_str.to_string(),
                })?;
                let ssid = if value > 15 { 0 } else { value as u8 };
                (&body[..pos], ssid)
            }
        };

        if text.is_empty() || text.len() > 6 || !text.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ParseError::InvalidAddressText {
                text: text.to_string(),
            }
            .into());
        }

        Address::new(text, ssid, mark)
    }
}

impl From<Address> for [u8; 7] {
    fn from(addr: Address) -> Self {
        addr.encode(false)
    }
}

impl TryFrom<[u8; 7]> for Address {
    type Error = std::convert::Infallible;

    fn try_from(bytes: [u8; 7]) -> Result<Self, Self::Error> {
        Ok(Address::decode(&bytes).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn w7ion_5_marked_encodes_to_spec_bytes() {
        let addr = Address::new("W7ION", 5, true).unwrap();
        let bytes = addr.encode(false);
        assert_eq!(bytes, [0xAE, 0x6E, 0x92, 0x9E, 0x9C, 0x40, 0xEA]);
    }

    #[test]
    fn parse_roundtrip() {
        let addr: Address = "N0CALL-1".parse().unwrap();
        assert_eq!(addr.text(), "N0CALL");
        assert_eq!(addr.ssid, 1);
        assert_eq!(addr.to_string(), "N0CALL-1");
    }

    #[test]
    fn leading_zero_ssid_rejected() {
        assert!("N0CALL-01".parse::<Address>().is_err());
    }

    #[test]
    fn out_of_range_ssid_resets_to_zero() {
        let addr: Address = "N0CALL-20".parse().unwrap();
        assert_eq!(addr.ssid, 0);
    }

    #[test]
    fn trailing_star_sets_mark() {
        let addr: Address = "WIDE1-1*".parse().unwrap();
        assert!(addr.mark);
    }

    #[test]
    fn wire_roundtrip_clears_nothing_on_decode() {
        let addr = Address::new("APRS", 0, false).unwrap();
        let bytes = addr.encode(true);
        let (decoded, last) = Address::decode(&bytes);
        assert_eq!(decoded.text(), "APRS");
        assert!(last);
    }

    #[test]
    fn empty_text_rejected() {
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn too_long_rejected() {
        assert!("TOOLONGCALLSIGN-1".parse::<Address>().is_err());
    }
}
