//! A baseline and progressive JPEG decoder producing an RGB (or luma) pixel
//! raster from a complete in-memory byte stream.
//!
//! ```no_run
//! use jpegcore::Decoder;
//!
//! let mut decoder = Decoder::new();
//! let image = decoder.decode_file("photo.jpg").unwrap();
//! println!("{}x{}, {} bytes", image.width, image.height, image.pixels.len());
//! ```
#![allow(clippy::needless_return, clippy::similar_names, clippy::inline_always)]
#![warn(clippy::correctness, clippy::perf, clippy::pedantic)]
#[macro_use]
extern crate log;

pub use crate::components::ComponentId;
pub use crate::decoder::{Decoder, ImageInfo, RgbImage};
pub use crate::errors::{DecodeErrors, UnsupportedFeature};
pub use crate::misc::{ColorSpace, DecoderOptions, FrameKind};

mod bitstream;
mod byte_reader;
mod color_convert;
mod components;
mod decoder;
mod entropy;
mod errors;
mod frame;
mod headers;
mod huffman;
mod idct;
mod marker;
mod misc;
mod pipeline;
mod upsampler;
