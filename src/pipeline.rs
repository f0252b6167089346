//! The block pipeline: dequantize -> IDCT -> level shift -> upsample, turning
//! a `Frame`'s decoded coefficient grids into full-resolution sample planes
//! ready for colour conversion. One plane per component, assembled block by
//! block, on the calling thread.
use crate::frame::{Block, Frame};
use crate::idct::idct_aan;
use crate::upsampler::upsample_nearest;

/// The padded resolution every component's plane is upsampled to before
/// cropping: `mcu_cols*8*h_max` by `mcu_rows*8*v_max`.
pub(crate) fn full_resolution(frame: &Frame) -> (usize, usize) {
    (
        frame.mcu_cols * 8 * usize::from(frame.h_max),
        frame.mcu_rows * 8 * usize::from(frame.v_max),
    )
}

fn dequantize(block: &Block, quant_table: &[i32; 64]) -> Block {
    let mut out = [0i32; 64];
    for i in 0..64 {
        out[i] = block[i] * quant_table[i];
    }
    out
}

/// Render one component's decoded blocks into a full-MCU-resolution, level-
/// shifted sample plane (`mcu_cols*8*h_max` by `mcu_rows*8*v_max`), upsampled
/// to that resolution if the component is chroma-subsampled.
pub(crate) fn render_component_plane(frame: &Frame, component_idx: usize) -> Result<Vec<u8>, crate::errors::DecodeErrors> {
    let component = &frame.components[component_idx];
    let quant_table = frame.quant_table(component.quant_table_id)?;

    let plane_width = component.blocks_per_row * 8;
    let plane_height = component.blocks_per_column * 8;
    let mut plane = vec![0u8; plane_width * plane_height];

    for block_row in 0..component.blocks_per_column {
        for block_col in 0..component.blocks_per_row {
            let block_index = block_row * component.blocks_per_row + block_col;
            let mut spatial = dequantize(&frame.blocks[component_idx][block_index], quant_table);
            idct_aan(&mut spatial);

            for y in 0..8 {
                for x in 0..8 {
                    let sample = spatial[y * 8 + x] + 128;
                    let px = block_col * 8 + x;
                    let py = block_row * 8 + y;
                    plane[py * plane_width + px] = sample.clamp(0, 255) as u8;
                }
            }
        }
    }

    let h_scale = usize::from(frame.h_max / component.h_sampling);
    let v_scale = usize::from(frame.v_max / component.v_sampling);
    Ok(upsample_nearest(&plane, plane_width, plane_height, h_scale, v_scale))
}
