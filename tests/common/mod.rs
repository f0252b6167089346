//! A tiny, purpose-built baseline JPEG encoder used only to produce synthetic
//! fixtures for the integration tests below -- no binary `.jpg` files are
//! checked in: properties over fixed inputs, not golden-file grids.
use jpegcore::Decoder;

/// The standard JPEG zig-zag scan order, duplicated here (rather than reused
/// from the crate) so the test encoder doesn't depend on a private
/// implementation detail.
#[rustfmt::skip]
const ZIGZAG: [usize; 64] = [
    0,  1,  8,  16, 9,  2,  3, 10,
    17, 24, 32, 25, 18, 11, 4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13, 6,  7,  14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter { bytes: Vec::new(), acc: 0, bits: 0 }
    }

    fn push(&mut self, value: u32, n: u32) {
        for i in (0..n).rev() {
            let bit = (value >> i) & 1;
            self.acc = (self.acc << 1) | bit;
            self.bits += 1;
            if self.bits == 8 {
                let byte = self.acc as u8;
                self.bytes.push(byte);
                if byte == 0xFF {
                    self.bytes.push(0x00);
                }
                self.acc = 0;
                self.bits = 0;
            }
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            let pad = 8 - self.bits;
            self.push(0xFF, pad); // pad with 1 bits, as the standard recommends
        }
        self.bytes
    }
}

/// A fixed, tiny canonical Huffman table: every one of the 12 DC categories
/// (0..=11) and a handful of common AC symbols, with short codes so synthetic
/// test images stay small.
struct TestHuffman {
    counts: [u8; 16],
    symbols: Vec<u8>,
    codes: Vec<(u16, u8)>,
}

impl TestHuffman {
    fn dc() -> Self {
        // One code per category 0..=11, all length 4 except the last two
        // (keeps the table canonical: 12 symbols need at least 4 bits).
        let symbols: Vec<u8> = (0..=11).collect();
        let mut counts = [0u8; 16];
        counts[3] = 12; // all 12 codes at length 4: 0000..1011
        let codes = symbols.iter().enumerate().map(|(i, _)| (i as u16, 4u8)).collect();
        TestHuffman { counts, symbols, codes }
    }

    fn ac() -> Self {
        // Symbols: EOB(0x00), ZRL(0xF0), and (run=0,size=1..6) pairs.
        let symbols: Vec<u8> = vec![0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0xF0];
        let mut counts = [0u8; 16];
        counts[2] = symbols.len() as u8; // all length 3: 000..111
        let codes = symbols.iter().enumerate().map(|(i, _)| (i as u16, 3u8)).collect();
        TestHuffman { counts, symbols, codes }
    }

    fn code_for(&self, symbol: u8) -> (u16, u8) {
        let pos = self.symbols.iter().position(|&s| s == symbol).unwrap();
        self.codes[pos]
    }
}

fn category_and_bits(value: i32) -> (u8, u32, u8) {
    if value == 0 {
        return (0, 0, 0);
    }
    let magnitude = value.unsigned_abs();
    let size = 32 - magnitude.leading_zeros();
    let mask = (1u32 << size) - 1;
    let bits = if value > 0 { magnitude } else { mask - magnitude };
    (size as u8, bits, size)
}

fn write_block(writer: &mut BitWriter, dc: &TestHuffman, ac: &TestHuffman, coeffs_zigzag: &[i32; 64], dc_pred: &mut i32) {
    let diff = coeffs_zigzag[0] - *dc_pred;
    *dc_pred = coeffs_zigzag[0];
    let (size, bits, _) = category_and_bits(diff);
    let (code, len) = dc.code_for(size);
    writer.push(u32::from(code), u32::from(len));
    if size > 0 {
        writer.push(bits, u32::from(size));
    }

    let mut k = 1;
    while k < 64 {
        if coeffs_zigzag[k] == 0 {
            // Emit EOB for the remainder (test fixtures never exercise runs >1 zero).
            let (code, len) = ac.code_for(0x00);
            writer.push(u32::from(code), u32::from(len));
            return;
        }
        let (size, bits, _) = category_and_bits(coeffs_zigzag[k]);
        debug_assert!(size <= 6, "test fixtures only use small AC magnitudes");
        let (code, len) = ac.code_for(size);
        writer.push(u32::from(code), u32::from(len));
        writer.push(bits, u32::from(size));
        k += 1;
    }
}

/// Build a minimal single-component (grayscale) baseline JPEG, `width`x
/// `height` (must each be a multiple of 8 for this helper), with one
/// zig-zag-ordered block per entry of `blocks` (row-major) and an optional
/// restart interval (emitting `RSTn` markers and resetting the DC predictor
/// exactly as `restart_interval` blocks are written).
pub fn encode_grayscale_baseline(width: u16, height: u16, blocks: &[[i32; 64]], restart_interval: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xFF, 0xD8]); // SOI

    // DQT: table 0, all-ones (identity) so the IDCT sees the raw coefficients.
    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    out.extend_from_slice(&[1u8; 64]);

    // DHT DC
    let dc = TestHuffman::dc();
    out.extend_from_slice(&[0xFF, 0xC4]);
    let dc_len = 2 + 1 + 16 + dc.symbols.len();
    out.extend_from_slice(&(dc_len as u16).to_be_bytes());
    out.push(0x00);
    out.extend_from_slice(&dc.counts);
    out.extend_from_slice(&dc.symbols);

    // DHT AC
    let ac = TestHuffman::ac();
    out.extend_from_slice(&[0xFF, 0xC4]);
    let ac_len = 2 + 1 + 16 + ac.symbols.len();
    out.extend_from_slice(&(ac_len as u16).to_be_bytes());
    out.push(0x10);
    out.extend_from_slice(&ac.counts);
    out.extend_from_slice(&ac.symbols);

    if restart_interval > 0 {
        out.extend_from_slice(&[0xFF, 0xDD, 0x00, 0x04]);
        out.extend_from_slice(&restart_interval.to_be_bytes());
    }

    // SOF0: 1 component, sampling 1x1
    out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08]);
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.push(0x01);
    out.extend_from_slice(&[0x01, 0x11, 0x00]);

    // SOS
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);

    let blocks_x = usize::from(width) / 8;
    let blocks_y = usize::from(height) / 8;
    assert_eq!(blocks.len(), blocks_x * blocks_y, "one block entry per 8x8 block");

    let mut writer = BitWriter::new();
    let mut dc_pred = 0i32;
    let mut restart_counter = 0u16;
    let mut next_rst = 0u8;
    for block in blocks {
        write_block(&mut writer, &dc, &ac, block, &mut dc_pred);
        restart_counter += 1;
        if restart_interval > 0 && restart_counter == restart_interval {
            let pending = std::mem::replace(&mut writer, BitWriter::new());
            out.extend_from_slice(&pending.finish());
            out.extend_from_slice(&[0xFF, 0xD0 + next_rst]);
            next_rst = (next_rst + 1) % 8;
            dc_pred = 0;
            restart_counter = 0;
        }
    }
    out.extend_from_slice(&writer.finish());

    out.extend_from_slice(&[0xFF, 0xD9]); // EOI
    out
}

/// A single 8x8-block baseline JPEG, identical to `encode_grayscale_baseline`
/// except the component declares SOF/SOS id 0 instead of the conventional 1 --
/// some encoders number components from 0, and the SOS selector must still
/// resolve against whatever id SOF actually declared.
pub fn encode_grayscale_baseline_zero_based_id(dc_value: i32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xFF, 0xD8]); // SOI

    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    out.extend_from_slice(&[1u8; 64]);

    let dc = TestHuffman::dc();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + dc.symbols.len()) as u16).to_be_bytes());
    out.push(0x00);
    out.extend_from_slice(&dc.counts);
    out.extend_from_slice(&dc.symbols);

    let ac = TestHuffman::ac();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + ac.symbols.len()) as u16).to_be_bytes());
    out.push(0x10);
    out.extend_from_slice(&ac.counts);
    out.extend_from_slice(&ac.symbols);

    // SOF0: 1 component, id 0, sampling 1x1.
    out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01]);
    out.extend_from_slice(&[0x00, 0x11, 0x00]);

    // SOS: selector 0, matching the id SOF declared.
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x00, 0x00, 0x00, 0x3F, 0x00]);

    let (size, bits, _) = category_and_bits(dc_value);
    let (code, len) = dc.code_for(size);
    let mut writer = BitWriter::new();
    writer.push(u32::from(code), u32::from(len));
    if size > 0 {
        writer.push(bits, u32::from(size));
    }
    let (eob_code, eob_len) = ac.code_for(0x00);
    writer.push(u32::from(eob_code), u32::from(eob_len));
    out.extend_from_slice(&writer.finish());

    out.extend_from_slice(&[0xFF, 0xD9]); // EOI
    out
}

/// A two-scan progressive JPEG over one 8x8 luma block: a DC-first scan
/// carrying `dc_value`, followed by an AC-first scan (`Ss=1..=63`) that emits
/// an immediate end-of-band for the whole spectral range.
pub fn encode_progressive_two_scan(dc_value: i32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xFF, 0xD8]); // SOI

    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    out.extend_from_slice(&[1u8; 64]);

    let dc = TestHuffman::dc();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + dc.symbols.len()) as u16).to_be_bytes());
    out.push(0x00);
    out.extend_from_slice(&dc.counts);
    out.extend_from_slice(&dc.symbols);

    let ac = TestHuffman::ac();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + ac.symbols.len()) as u16).to_be_bytes());
    out.push(0x10);
    out.extend_from_slice(&ac.counts);
    out.extend_from_slice(&ac.symbols);

    // SOF2: progressive, 1 component, 8x8
    out.extend_from_slice(&[0xFF, 0xC2, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00]);

    // Scan 1: DC first, Ss=0 Se=0 Ah=0 Al=0.
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00]);
    let (size, bits, _) = category_and_bits(dc_value);
    let (code, len) = dc.code_for(size);
    let mut writer = BitWriter::new();
    writer.push(u32::from(code), u32::from(len));
    if size > 0 {
        writer.push(bits, u32::from(size));
    }
    out.extend_from_slice(&writer.finish());

    // Scan 2: AC first, Ss=1 Se=63 Ah=0 Al=0, immediate EOB (run=0).
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x01, 0x3F, 0x00]);
    let (eob_code, eob_len) = ac.code_for(0x00);
    let mut writer = BitWriter::new();
    writer.push(u32::from(eob_code), u32::from(eob_len));
    out.extend_from_slice(&writer.finish());

    out.extend_from_slice(&[0xFF, 0xD9]); // EOI
    out
}

/// A two-scan progressive JPEG exercising AC refinement on one 8x8 luma
/// block: DC first/refine establish a DC of 80, then an AC-first scan places
/// a single category-1 coefficient at zig-zag position 1, and a final
/// AC-refine scan sends one correction bit for it. `correction_bit` controls
/// whether that bit is set, letting a test observe its effect on the output.
pub fn encode_progressive_ac_refine(correction_bit: u8) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xFF, 0xD8]); // SOI

    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    out.extend_from_slice(&[1u8; 64]);

    let dc = TestHuffman::dc();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + dc.symbols.len()) as u16).to_be_bytes());
    out.push(0x00);
    out.extend_from_slice(&dc.counts);
    out.extend_from_slice(&dc.symbols);

    let ac = TestHuffman::ac();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + ac.symbols.len()) as u16).to_be_bytes());
    out.push(0x10);
    out.extend_from_slice(&ac.counts);
    out.extend_from_slice(&ac.symbols);

    // SOF2: progressive, 1 component, 8x8.
    out.extend_from_slice(&[0xFF, 0xC2, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00]);

    // Scan 1: DC first, Ss=0 Se=0 Ah=0 Al=1. Predictor 40 shifted left by 1
    // gives a full-precision DC of 80.
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x00, 0x01]);
    {
        let (size, bits, _) = category_and_bits(40);
        let (code, len) = dc.code_for(size);
        let mut writer = BitWriter::new();
        writer.push(u32::from(code), u32::from(len));
        if size > 0 {
            writer.push(bits, u32::from(size));
        }
        out.extend_from_slice(&writer.finish());
    }

    // Scan 2: DC refine, Ah=1 Al=0, correction bit 0 (DC stays at 80).
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x00, 0x10]);
    {
        let mut writer = BitWriter::new();
        writer.push(0, 1);
        out.extend_from_slice(&writer.finish());
    }

    // Scan 3: AC first, Ss=1 Se=63 Ah=0 Al=1. Category-1 coefficient (positive
    // sign) at position 1, followed by an immediate EOB for the rest.
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x01, 0x3F, 0x01]);
    {
        let mut writer = BitWriter::new();
        let (code, len) = ac.code_for(0x01); // run=0, size=1
        writer.push(u32::from(code), u32::from(len));
        writer.push(1, 1); // positive sign
        let (eob_code, eob_len) = ac.code_for(0x00);
        writer.push(u32::from(eob_code), u32::from(eob_len));
        out.extend_from_slice(&writer.finish());
    }

    // Scan 4: AC refine, Ah=1 Al=0. A single EOBn(run=0) symbol refines every
    // remaining already-nonzero coefficient (just position 1) with one
    // correction bit.
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x01, 0x3F, 0x10]);
    {
        let mut writer = BitWriter::new();
        let (eob_code, eob_len) = ac.code_for(0x00);
        writer.push(u32::from(eob_code), u32::from(eob_len));
        writer.push(u32::from(correction_bit), 1);
        out.extend_from_slice(&writer.finish());
    }

    out.extend_from_slice(&[0xFF, 0xD9]); // EOI
    out
}

/// A 16x16, 3-component 4:2:0 baseline JPEG (Y sampled 2x2, Cb/Cr 1x1),
/// exercising the interleaved-MCU decode path, chroma upsampling, and colour
/// conversion together. `y_blocks` are the four luma blocks in MCU traversal
/// order (top-left, top-right, bottom-left, bottom-right); `cb_block`/
/// `cr_block` are each the single chroma block covering the whole image.
pub fn encode_ycbcr_420_baseline(y_blocks: [[i32; 64]; 4], cb_block: [i32; 64], cr_block: [i32; 64]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0xFF, 0xD8]); // SOI

    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    out.extend_from_slice(&[1u8; 64]);

    let dc = TestHuffman::dc();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + dc.symbols.len()) as u16).to_be_bytes());
    out.push(0x00);
    out.extend_from_slice(&dc.counts);
    out.extend_from_slice(&dc.symbols);

    let ac = TestHuffman::ac();
    out.extend_from_slice(&[0xFF, 0xC4]);
    out.extend_from_slice(&((2 + 1 + 16 + ac.symbols.len()) as u16).to_be_bytes());
    out.push(0x10);
    out.extend_from_slice(&ac.counts);
    out.extend_from_slice(&ac.symbols);

    // SOF0: 3 components, Y sampled 2x2, Cb/Cr 1x1, all referencing table 0.
    out.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    out.extend_from_slice(&16u16.to_be_bytes()); // height
    out.extend_from_slice(&16u16.to_be_bytes()); // width
    out.push(0x03);
    out.extend_from_slice(&[0x01, 0x22, 0x00]); // Y
    out.extend_from_slice(&[0x02, 0x11, 0x00]); // Cb
    out.extend_from_slice(&[0x03, 0x11, 0x00]); // Cr

    // SOS: all three components interleaved, spanning the full band.
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x0C, 0x03]);
    out.extend_from_slice(&[0x01, 0x00, 0x02, 0x00, 0x03, 0x00]);
    out.extend_from_slice(&[0x00, 0x3F, 0x00]);

    let mut writer = BitWriter::new();
    let mut y_pred = 0i32;
    // MCU traversal visits Y's (by, bx) pairs row-major before moving to Cb
    // then Cr, so the four Y blocks must appear here in that same order.
    for block in &y_blocks {
        write_block(&mut writer, &dc, &ac, block, &mut y_pred);
    }
    let mut cb_pred = 0i32;
    write_block(&mut writer, &dc, &ac, &cb_block, &mut cb_pred);
    let mut cr_pred = 0i32;
    write_block(&mut writer, &dc, &ac, &cr_block, &mut cr_pred);
    out.extend_from_slice(&writer.finish());

    out.extend_from_slice(&[0xFF, 0xD9]); // EOI
    out
}

pub fn zigzag_of(natural: &[i32; 64]) -> [i32; 64] {
    let mut out = [0i32; 64];
    for (zz, &nat_index) in ZIGZAG.iter().enumerate() {
        out[zz] = natural[nat_index];
    }
    out
}

#[allow(dead_code)]
pub fn decode(bytes: Vec<u8>) -> jpegcore::RgbImage {
    Decoder::new().decode_buffer(bytes).expect("synthetic fixture should decode cleanly")
}
