//! JPEG marker alphabet (Table B.1, ITU T.81).
//!
//! Every marker is `0xFF` followed by a non-`0x00`, non-`0xFF` byte.

/// A recognised JPEG marker, decoded from the byte that followed a `0xFF` lead-in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Marker {
    /// Start of image
    SOI,
    /// End of image
    EOI,
    /// Start of scan
    SOS,
    /// Define quantization table(s)
    DQT,
    /// Define Huffman table(s)
    DHT,
    /// Define restart interval
    DRI,
    /// Define arithmetic coding conditioning(s) -- rejected, never implemented
    DAC,
    /// Define number of lines -- skipped
    DNL,
    /// Define hierarchical progression -- skipped
    DHP,
    /// Expand reference component(s) -- skipped
    EXP,
    /// Comment -- skipped
    COM,
    /// Reserved for temporary private use in arithmetic coding, carries no payload
    TEM,
    /// Restart marker `RST0..RST7`, only ever consumed inside an ECS
    RST(u8),
    /// Reserved for application use, `APP0..APP15`, skipped
    APP(u8),
    /// Reserved for JPEG extensions, `JPG0..JPG13`, skipped
    JPG(u8),
    /// Start of frame, `k` identifies the encoding (0 = baseline, 2 = progressive, others rejected)
    SOF(u8),
}

impl Marker {
    /// Decode a marker from the byte that followed `0xFF`.
    ///
    /// Returns `None` for `0x00` (byte stuffing) and `0xFF` (fill byte), neither of
    /// which denotes a marker.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Marker> {
        match byte {
            0x00 | 0xFF => None,
            0x01 => Some(Marker::TEM),
            0xC0 => Some(Marker::SOF(0)),
            0xC2 => Some(Marker::SOF(2)),
            0xC1 | 0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                Some(Marker::SOF(byte & 0x0F))
            }
            0xC4 => Some(Marker::DHT),
            0xCC => Some(Marker::DAC),
            0xD0..=0xD7 => Some(Marker::RST(byte - 0xD0)),
            0xD8 => Some(Marker::SOI),
            0xD9 => Some(Marker::EOI),
            0xDA => Some(Marker::SOS),
            0xDB => Some(Marker::DQT),
            0xDC => Some(Marker::DNL),
            0xDD => Some(Marker::DRI),
            0xDE => Some(Marker::DHP),
            0xDF => Some(Marker::EXP),
            0xE0..=0xEF => Some(Marker::APP(byte - 0xE0)),
            0xF0..=0xFD => Some(Marker::JPG(byte - 0xF0)),
            0xFE => Some(Marker::COM),
            // 0x02..=0xBF (other than TEM) are reserved; treat as unrecognised so the
            // caller can turn them into `InvalidMarker`.
            _ => None,
        }
    }

    /// Whether this marker (other than SOF, handled specially) carries a 16-bit
    /// big-endian length-prefixed payload that the header parser must skip or parse.
    #[must_use]
    pub fn has_length(self) -> bool {
        !matches!(self, Marker::SOI | Marker::EOI | Marker::TEM | Marker::RST(_))
    }
}
