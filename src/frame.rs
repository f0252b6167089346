//! The `Frame` data model: geometry, components, and the block grid that
//! scans write into and the block pipeline later reads from. Owned by the
//! `Decoder` for the duration of a decode; nothing downstream holds a back
//! reference to it.
use crate::components::Component;
use crate::errors::DecodeErrors;
use crate::huffman::HuffmanTable;
use crate::misc::FrameKind;

pub(crate) const MAX_COMPONENTS: usize = 3;
pub(crate) const MAX_TABLES: usize = 4;

/// One 8x8 block of coefficients, row-major natural order.
pub(crate) type Block = [i32; 64];

/// Everything learned from SOF/DQT/DHT/SOS, plus the block storage every scan
/// writes into. Allocated once at SOF time (component block grids) and mutated
/// in place by every subsequent scan -- progressive scans never reallocate.
pub(crate) struct Frame {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) frame_kind: FrameKind,
    pub(crate) components: Vec<Component>,
    pub(crate) h_max: u8,
    pub(crate) v_max: u8,
    pub(crate) mcu_cols: usize,
    pub(crate) mcu_rows: usize,
    pub(crate) restart_interval: usize,

    pub(crate) quant_tables: [Option<[i32; 64]>; MAX_TABLES],
    pub(crate) dc_tables: [Option<HuffmanTable>; MAX_TABLES],
    pub(crate) ac_tables: [Option<HuffmanTable>; MAX_TABLES],

    /// One block grid per component, row-major, sized
    /// `blocks_per_column * blocks_per_row` each.
    pub(crate) blocks: Vec<Vec<Block>>,

    // Active scan state, valid only while a scan is being decoded.
    pub(crate) spec_start: u8,
    pub(crate) spec_end: u8,
    pub(crate) succ_high: u8,
    pub(crate) succ_low: u8,
}

impl Frame {
    pub(crate) fn block_cols(width: u16) -> usize {
        (usize::from(width) + 7) / 8
    }

    pub(crate) fn block_rows(height: u16) -> usize {
        (usize::from(height) + 7) / 8
    }

    /// Finish geometry derivation once all SOF components are known, and
    /// allocate each component's (padded) block grid.
    pub(crate) fn finish_geometry(&mut self) -> Result<(), DecodeErrors> {
        self.h_max = self.components.iter().map(|c| c.h_sampling).max().unwrap_or(1);
        self.v_max = self.components.iter().map(|c| c.v_sampling).max().unwrap_or(1);

        let mcu_width_px = usize::from(self.h_max) * 8;
        let mcu_height_px = usize::from(self.v_max) * 8;

        self.mcu_cols = (usize::from(self.width) + mcu_width_px - 1) / mcu_width_px;
        self.mcu_rows = (usize::from(self.height) + mcu_height_px - 1) / mcu_height_px;

        for component in &mut self.components {
            let blocks_per_row = self.mcu_cols * usize::from(component.h_sampling);
            let blocks_per_column = self.mcu_rows * usize::from(component.v_sampling);
            component.blocks_per_row = blocks_per_row;
            component.blocks_per_column = blocks_per_column;
        }

        self.blocks = self
            .components
            .iter()
            .map(|c| vec![[0i32; 64]; c.blocks_per_row * c.blocks_per_column])
            .collect();

        Ok(())
    }

    pub(crate) fn component_index_by_scan_order(&self, id: crate::components::ComponentId) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    pub(crate) fn reset_dc_predictors(&mut self) {
        for component in &mut self.components {
            component.reset_dc_state();
        }
    }

    pub(crate) fn quant_table(&self, id: u8) -> Result<&[i32; 64], DecodeErrors> {
        self.quant_tables[usize::from(id)]
            .as_ref()
            .ok_or_else(|| DecodeErrors::InvalidTable(format!("no quantization table loaded for id {id}")))
    }

    pub(crate) fn dc_table(&self, id: u8) -> Result<&HuffmanTable, DecodeErrors> {
        self.dc_tables[usize::from(id)]
            .as_ref()
            .ok_or_else(|| DecodeErrors::InvalidScan(format!("no DC Huffman table bound for id {id}")))
    }

    pub(crate) fn ac_table(&self, id: u8) -> Result<&HuffmanTable, DecodeErrors> {
        self.ac_tables[usize::from(id)]
            .as_ref()
            .ok_or_else(|| DecodeErrors::InvalidScan(format!("no AC Huffman table bound for id {id}")))
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            width: 0,
            height: 0,
            frame_kind: FrameKind::Baseline,
            components: Vec::new(),
            h_max: 1,
            v_max: 1,
            mcu_cols: 0,
            mcu_rows: 0,
            restart_interval: 0,
            quant_tables: [None, None, None, None],
            dc_tables: [None, None, None, None],
            ac_tables: [None, None, None, None],
            blocks: Vec::new(),
            spec_start: 0,
            spec_end: 0,
            succ_high: 0,
            succ_low: 0,
        }
    }
}
