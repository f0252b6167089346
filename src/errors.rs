//! Errors surfaced by the decode pipeline.
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Which unsupported JPEG flavour was rejected during header parsing.
#[derive(Eq, PartialEq, Copy, Clone)]
pub enum UnsupportedFeature {
    /// SOF1 extended sequential DCT, Huffman coding
    ExtendedSequentialHuffman,
    /// SOF3 lossless (sequential), Huffman coding
    LosslessHuffman,
    /// Any SOF using arithmetic coding conditioning instead of Huffman
    ArithmeticCoding,
    /// SOF5/6/7 and friends, hierarchical/differential frames
    Hierarchical,
    /// Precision other than 8 bits per sample
    Precision(u8),
}

impl Debug for UnsupportedFeature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtendedSequentialHuffman => {
                write!(f, "extended sequential DCT (SOF1) is not supported")
            }
            Self::LosslessHuffman => write!(f, "lossless frames (SOF3) are not supported"),
            Self::ArithmeticCoding => write!(f, "arithmetic coding (DAC) is not supported"),
            Self::Hierarchical => write!(f, "hierarchical/differential frames are not supported"),
            Self::Precision(bits) => {
                write!(f, "{bits}-bit sample precision is not supported, only 8-bit is")
            }
        }
    }
}

/// Common decode errors.
#[allow(clippy::module_name_repetitions)]
pub enum DecodeErrors {
    /// The byte source was exhausted before a complete segment or before EOI.
    UnexpectedEof,
    /// A byte following 0xFF was neither 0x00, 0xFF, nor a recognised marker.
    InvalidMarker(u8),
    /// A recognised-but-rejected JPEG variant, or a structural violation of the marker alphabet.
    UnsupportedFormat(UnsupportedFeature),
    /// A malformed or duplicated DQT/DHT table.
    InvalidTable(String),
    /// A malformed scan header, or a scan referencing a table that was never defined.
    InvalidScan(String),
    /// A corrupt entropy-coded segment: unknown Huffman code, bad refinement bit, or
    /// coefficient placement beyond `Se`.
    BitstreamCorrupt(String),
}

impl Debug for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of file while decoding"),
            Self::InvalidMarker(byte) => {
                write!(f, "invalid marker byte 0xFF{byte:02X}, stream desynchronized")
            }
            Self::UnsupportedFormat(feature) => write!(f, "unsupported format: {feature:?}"),
            Self::InvalidTable(reason) => write!(f, "invalid quantization/Huffman table: {reason}"),
            Self::InvalidScan(reason) => write!(f, "invalid scan header: {reason}"),
            Self::BitstreamCorrupt(reason) => write!(f, "corrupt entropy-coded segment: {reason}"),
        }
    }
}

impl Display for DecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Error for DecodeErrors {}
