//! The public `Decoder` API: orchestrates header parsing, scan decoding, and
//! the block pipeline into a finished `RgbImage`.
use std::fs;
use std::path::Path;

use crate::byte_reader::ByteSource;
use crate::color_convert::ycbcr_to_rgb;
use crate::components::ComponentId;
use crate::entropy;
use crate::errors::DecodeErrors;
use crate::frame::Frame;
use crate::headers;
use crate::misc::{ColorSpace, DecoderOptions, FrameKind};
use crate::pipeline;

/// Dimensions and encoding scheme of a frame, available once its header has
/// been parsed (via `Decoder::read_headers` or after a full decode).
#[derive(Debug, Copy, Clone)]
pub struct ImageInfo {
    pub width: u16,
    pub height: u16,
    pub frame_kind: FrameKind,
    pub component_count: usize,
}

/// A decoded raster: `width * height * colorspace.num_components()` bytes,
/// row-major, no padding between rows.
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub width: u16,
    pub height: u16,
    pub colorspace: ColorSpace,
    pub pixels: Vec<u8>,
}

/// A baseline or progressive JPEG decoder. Not `Sync`: each decode call owns
/// its `Frame` for the duration of the call; decoding runs on a single
/// thread.
pub struct Decoder {
    options: DecoderOptions,
    frame: Option<Frame>,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Decoder {
        Decoder {
            options: DecoderOptions::default(),
            frame: None,
        }
    }

    #[must_use]
    pub fn new_with_options(options: DecoderOptions) -> Decoder {
        Decoder { options, frame: None }
    }

    /// Parse only as far as the frame header, populating `info()` without
    /// touching any entropy-coded data.
    pub fn read_headers(&mut self, data: &[u8]) -> Result<(), DecodeErrors> {
        let mut source = ByteSource::new(data.to_vec());
        let mut frame = Frame::default();
        headers::parse_until_frame_header(&mut source, &mut frame)?;
        self.frame = Some(frame);
        Ok(())
    }

    /// Decode a whole file from disk.
    pub fn decode_file(&mut self, path: impl AsRef<Path>) -> Result<RgbImage, DecodeErrors> {
        let data = fs::read(path).map_err(|_| DecodeErrors::UnexpectedEof)?;
        self.decode_buffer(data)
    }

    /// Decode an owned, fully-buffered JPEG byte stream.
    pub fn decode_buffer(&mut self, data: Vec<u8>) -> Result<RgbImage, DecodeErrors> {
        info!("decoding a {} byte buffer", data.len());
        let mut source = ByteSource::new(data);
        let mut frame = Frame::default();

        headers::parse_headers(&mut source, &mut frame, |source, frame| entropy::decode_scan(source, frame))?;

        if frame.components.is_empty() {
            return Err(DecodeErrors::InvalidScan("no frame header was ever seen".to_string()));
        }

        let pixels = u32::from(frame.width) * u32::from(frame.height);
        if pixels > self.options.max_pixels {
            return Err(DecodeErrors::InvalidScan(format!(
                "{}x{} ({pixels} pixels) exceeds the configured limit of {} pixels",
                frame.width, frame.height, self.options.max_pixels
            )));
        }

        let image = render(&frame, self.options.output_colorspace)?;
        info!("decoded {}x{} image, {} bytes of pixel data", image.width, image.height, image.pixels.len());
        self.frame = Some(frame);
        Ok(image)
    }

    #[must_use]
    pub fn info(&self) -> Option<ImageInfo> {
        self.frame.as_ref().map(|frame| ImageInfo {
            width: frame.width,
            height: frame.height,
            frame_kind: frame.frame_kind,
            component_count: frame.components.len(),
        })
    }

    #[must_use]
    pub fn width(&self) -> Option<u16> {
        self.frame.as_ref().map(|f| f.width)
    }

    #[must_use]
    pub fn height(&self) -> Option<u16> {
        self.frame.as_ref().map(|f| f.height)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

/// Render every component's plane and combine them per the requested output
/// colorspace, cropping the MCU-padded planes down to the frame's declared
/// `width`/`height` (MCU padding is never exposed to callers).
fn render(frame: &Frame, colorspace: ColorSpace) -> Result<RgbImage, DecodeErrors> {
    let (full_width, _full_height) = pipeline::full_resolution(frame);
    let width = usize::from(frame.width);
    let height = usize::from(frame.height);

    match colorspace {
        ColorSpace::Luma => {
            let y_index = frame
                .component_index_by_scan_order(ComponentId::Y)
                .ok_or_else(|| DecodeErrors::InvalidScan("frame has no luma component".to_string()))?;
            let plane = pipeline::render_component_plane(frame, y_index)?;
            let pixels = crop(&plane, full_width, width, height);
            Ok(RgbImage {
                width: frame.width,
                height: frame.height,
                colorspace: ColorSpace::Luma,
                pixels,
            })
        }
        ColorSpace::Rgb if frame.components.len() == 1 => {
            let plane = pipeline::render_component_plane(frame, 0)?;
            let gray = crop(&plane, full_width, width, height);
            let mut pixels = vec![0u8; width * height * 3];
            for (i, &value) in gray.iter().enumerate() {
                pixels[i * 3] = value;
                pixels[i * 3 + 1] = value;
                pixels[i * 3 + 2] = value;
            }
            Ok(RgbImage {
                width: frame.width,
                height: frame.height,
                colorspace: ColorSpace::Rgb,
                pixels,
            })
        }
        ColorSpace::Rgb => {
            if frame.components.len() != 3 {
                return Err(DecodeErrors::UnsupportedFormat(
                    crate::errors::UnsupportedFeature::Hierarchical,
                ));
            }
            let y_idx = frame.component_index_by_scan_order(ComponentId::Y).unwrap();
            let cb_idx = frame.component_index_by_scan_order(ComponentId::Cb).unwrap();
            let cr_idx = frame.component_index_by_scan_order(ComponentId::Cr).unwrap();

            let y_plane = pipeline::render_component_plane(frame, y_idx)?;
            let cb_plane = pipeline::render_component_plane(frame, cb_idx)?;
            let cr_plane = pipeline::render_component_plane(frame, cr_idx)?;

            let mut pixels = vec![0u8; width * height * 3];
            for row in 0..height {
                for col in 0..width {
                    let src = row * full_width + col;
                    let (r, g, b) = ycbcr_to_rgb(y_plane[src], cb_plane[src], cr_plane[src]);
                    let dst = (row * width + col) * 3;
                    pixels[dst] = r;
                    pixels[dst + 1] = g;
                    pixels[dst + 2] = b;
                }
            }
            Ok(RgbImage {
                width: frame.width,
                height: frame.height,
                colorspace: ColorSpace::Rgb,
                pixels,
            })
        }
    }
}

fn crop(plane: &[u8], plane_width: usize, width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * height);
    for row in 0..height {
        out.extend_from_slice(&plane[row * plane_width..row * plane_width + width]);
    }
    out
}
