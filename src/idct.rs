//! The AAN-factored inverse 8x8 DCT, applied columns-then-rows.
use crate::frame::Block;

const FIX_1_082392200: f32 = 1.082_392_2;
const FIX_1_414213562: f32 = 1.414_213_6;
const FIX_1_847759065: f32 = 1.847_759_1;
const FIX_2_613125930: f32 = 2.613_126;

/// One 1D AAN inverse DCT pass over 8 samples, applied first to columns then
/// to rows to build the separable 2D IDCT.
fn aan_1d(v: &mut [f32; 8]) {
    let (s0, s1, s2, s3, s4, s5, s6, s7) = (v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7]);

    // Even part.
    let tmp10 = s0 + s4;
    let tmp11 = s0 - s4;
    let tmp13 = s2 + s6;
    let tmp12 = (s2 - s6) * FIX_1_414213562 - tmp13;

    let e0 = tmp10 + tmp13;
    let e3 = tmp10 - tmp13;
    let e1 = tmp11 + tmp12;
    let e2 = tmp11 - tmp12;

    // Odd part.
    let z13 = s5 + s3;
    let z10 = s5 - s3;
    let z11 = s1 + s7;
    let z12 = s1 - s7;

    let o_b = z11 + z13;
    let o_a = (z11 - z13) * FIX_1_414213562;

    let z5 = (z10 + z12) * FIX_1_847759065;
    let o_c = FIX_1_082392200 * z12 - z5;
    let o_d = -FIX_2_613125930 * z10 + z5;

    let o_e = o_d - o_b;
    let o_f = o_a - o_e;
    let o_g = o_c + o_f;

    v[0] = e0 + o_b;
    v[7] = e0 - o_b;
    v[1] = e1 + o_e;
    v[6] = e1 - o_e;
    v[2] = e2 + o_f;
    v[5] = e2 - o_f;
    v[3] = e3 + o_g;
    v[4] = e3 - o_g;
}

/// In-place inverse DCT of one natural-order 8x8 block of already-dequantized
/// coefficients, columns then rows. JPEG's normalization (the overall 1/4
/// scale and each DC basis function's 1/sqrt(2) factor) works out to dividing
/// the two-pass result by 8.
pub(crate) fn idct_aan(block: &mut Block) {
    let mut scratch = [0f32; 64];
    for (dst, &src) in scratch.iter_mut().zip(block.iter()) {
        *dst = src as f32;
    }

    for col in 0..8 {
        let mut column = [
            scratch[col],
            scratch[8 + col],
            scratch[16 + col],
            scratch[24 + col],
            scratch[32 + col],
            scratch[40 + col],
            scratch[48 + col],
            scratch[56 + col],
        ];
        aan_1d(&mut column);
        for (row, value) in column.into_iter().enumerate() {
            scratch[row * 8 + col] = value;
        }
    }

    for row in 0..8 {
        let mut line: [f32; 8] = scratch[row * 8..row * 8 + 8].try_into().unwrap();
        aan_1d(&mut line);
        scratch[row * 8..row * 8 + 8].copy_from_slice(&line);
    }

    for (dst, &src) in block.iter_mut().zip(scratch.iter()) {
        *dst = (src / 8.0).round() as i32;
    }
}
