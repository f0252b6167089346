//! Chroma upsampling: nearest-neighbor block replication from one plane into
//! another, scaled by an integer factor per axis.
/// Replicate `plane` (`src_width` x `src_height`, row-major) by `h_scale`
/// horizontally and `v_scale` vertically, producing a
/// `src_width*h_scale` x `src_height*v_scale` plane. `h_scale`/`v_scale` are
/// always 1 or 2 for the sampling factors this core accepts.
pub(crate) fn upsample_nearest(plane: &[u8], src_width: usize, src_height: usize, h_scale: usize, v_scale: usize) -> Vec<u8> {
    if h_scale == 1 && v_scale == 1 {
        return plane.to_vec();
    }

    let dst_width = src_width * h_scale;
    let dst_height = src_height * v_scale;
    let mut out = vec![0u8; dst_width * dst_height];

    for y in 0..dst_height {
        let src_row = y / v_scale;
        for x in 0..dst_width {
            let src_col = x / h_scale;
            out[y * dst_width + x] = plane[src_row * src_width + src_col];
        }
    }

    out
}
