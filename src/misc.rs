//! Shared lookup tables and small value types used across the decode pipeline.

/// Maps a zig-zag (entropy-coded) coefficient index to its natural (row-major)
/// position inside an 8x8 block. A permutation of `0..64`.
#[rustfmt::skip]
pub const UN_ZIGZAG: [usize; 64] = [
    0,  1,  8,  16, 9,  2,  3, 10,
    17, 24, 32, 25, 18, 11, 4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13, 6,  7,  14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// The output colour space of a decoded frame.
///
/// Progressive and baseline frames alike end up here after the block pipeline;
/// `Luma` is a fast path for single-component (grayscale) frames that never run
/// chroma upsampling or colour conversion.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorSpace {
    /// Red, Green, Blue -- 3 bytes per pixel
    Rgb,
    /// Single luma channel, replicated to R=G=B by the caller if needed -- 1 byte per pixel
    Luma,
}

impl ColorSpace {
    /// Number of bytes this colour space stores per pixel.
    #[must_use]
    pub const fn num_components(self) -> usize {
        match self {
            ColorSpace::Rgb => 3,
            ColorSpace::Luma => 1,
        }
    }
}

/// Frame encoding scheme, carried in `ImageInfo` once SOF has been parsed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameKind {
    /// SOF0: baseline sequential DCT, Huffman coding
    Baseline,
    /// SOF2: progressive DCT, Huffman coding
    Progressive,
}

/// Knobs a caller can set before decoding: small, `Copy`, and defaulted
/// sanely.
#[derive(Debug, Copy, Clone)]
pub struct DecoderOptions {
    pub(crate) strict_mode: bool,
    pub(crate) max_pixels: u32,
    pub(crate) output_colorspace: ColorSpace,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            strict_mode: false,
            // 1 << 26 pixels is ~67 megapixels, generous enough for any real photo
            // while still catching a corrupt/adversarial SOF's width*height.
            max_pixels: 1 << 26,
            output_colorspace: ColorSpace::Rgb,
        }
    }
}

impl DecoderOptions {
    /// Create a new options value with the defaults above.
    #[must_use]
    pub fn new() -> Self {
        DecoderOptions::default()
    }

    /// When set, extra bytes between a marker's segment and the next marker are
    /// treated as a format error instead of being silently skipped over.
    #[must_use]
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Reject frames whose `width * height` exceeds this many pixels.
    #[must_use]
    pub fn with_max_pixels(mut self, max_pixels: u32) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Force the output colour space. Only meaningful as a downgrade: asking for
    /// `Luma` on a multi-component frame still decodes all components (tables must
    /// still be resolved) but only the luma plane is emitted.
    #[must_use]
    pub fn with_output_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.output_colorspace = colorspace;
        self
    }
}
