//! Per-component metadata extracted from the SOF header.
use crate::errors::DecodeErrors;

/// The three channels this core understands. CMYK/YCCK 4-component frames are
/// not supported.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ComponentId {
    /// Luminance, always the first declared component
    Y,
    /// Blue-difference chroma
    Cb,
    /// Red-difference chroma
    Cr,
}

/// A single colour component (channel) of the frame, as declared in SOF and
/// bound to tables per-scan in SOS.
#[derive(Clone)]
pub(crate) struct Component {
    pub(crate) id: ComponentId,
    /// The component identifier as declared in SOF, normalized to the 1-based
    /// convention (`headers::parse_sof` adds 1 when the frame uses 0-based
    /// ids). SOS selectors are matched against this, not against position.
    pub(crate) declared_id: u8,
    pub(crate) h_sampling: u8,
    pub(crate) v_sampling: u8,
    pub(crate) quant_table_id: u8,
    /// Active scan bindings, rewritten by `parse_sos` on every scan.
    pub(crate) dc_huff_id: u8,
    pub(crate) ac_huff_id: u8,
    pub(crate) in_current_scan: bool,
    /// DC predictor, reset to 0 at scan start and at every restart.
    pub(crate) dc_predictor: i32,
    /// Progressive AC-first/refinement EOB skip-run counter, independent per
    /// component, reset alongside the DC predictor.
    pub(crate) eob_run: u32,
    /// Column/row counts of this component's (possibly sub-sampled) block grid,
    /// computed once at SOF time from the frame's MCU geometry.
    pub(crate) blocks_per_row: usize,
    pub(crate) blocks_per_column: usize,
}

impl Component {
    pub(crate) fn from_sof_bytes(bytes: [u8; 3], declared_index: usize) -> Result<Component, DecodeErrors> {
        let raw_id = bytes[0];
        let id = match (raw_id, declared_index) {
            // Components are identified positionally (luma is always the first
            // declared component), but we sanity-check the common id
            // conventions (1/2/3, or the 0-based variant the header parser
            // normalizes before calling us) rather than trusting position alone.
            (_, 0) => ComponentId::Y,
            (_, 1) => ComponentId::Cb,
            (_, 2) => ComponentId::Cr,
            _ => {
                return Err(DecodeErrors::InvalidScan(format!(
                    "frame declares more than 3 components (component id {raw_id} at index {declared_index})"
                )))
            }
        };

        let h_sampling = bytes[1] >> 4;
        let v_sampling = bytes[1] & 0x0F;
        let quant_table_id = bytes[2];

        if !matches!(h_sampling, 1 | 2) || !matches!(v_sampling, 1 | 2) {
            return Err(DecodeErrors::UnsupportedFormat(
                crate::errors::UnsupportedFeature::Precision(8),
            ));
        }
        if quant_table_id > 3 {
            return Err(DecodeErrors::InvalidTable(format!(
                "component references quantization table {quant_table_id}, only 0..=3 exist"
            )));
        }

        Ok(Component {
            id,
            declared_id: raw_id,
            h_sampling,
            v_sampling,
            quant_table_id,
            dc_huff_id: 0,
            ac_huff_id: 0,
            in_current_scan: false,
            dc_predictor: 0,
            eob_run: 0,
            blocks_per_row: 0,
            blocks_per_column: 0,
        })
    }

    pub(crate) fn reset_dc_state(&mut self) {
        self.dc_predictor = 0;
        self.eob_run = 0;
    }
}
