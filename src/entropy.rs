//! Entropy-coded segment assembly and MCU decoding: byte/bit unstuffing,
//! restart-interval handling, and the four progressive scan cases plus the
//! single baseline case. MCU traversal is component-major, then `Vi x Hi`
//! data units per component, for interleaved scans. The four progressive
//! cases follow T.81 Annex G's reference decoding procedure.
use crate::bitstream::{BitReader, BitResult};
use crate::byte_reader::ByteSource;
use crate::errors::DecodeErrors;
use crate::frame::{Block, Frame};
use crate::marker::Marker;
use crate::misc::{FrameKind, UN_ZIGZAG};

fn pull_bit(reader: &mut BitReader) -> Result<u8, DecodeErrors> {
    match reader.read_bit() {
        BitResult::Value(bit) => Ok(bit),
        BitResult::Exhausted => Err(DecodeErrors::BitstreamCorrupt(
            "ran out of bits mid-block".to_string(),
        )),
    }
}

fn pull_bits(reader: &mut BitReader, n: u8) -> Result<u32, DecodeErrors> {
    match reader.read_bits(n) {
        BitResult::Value(value) => Ok(value),
        BitResult::Exhausted => Err(DecodeErrors::BitstreamCorrupt(
            "ran out of bits mid-block".to_string(),
        )),
    }
}

/// T.81 Annex F.2.2.1 `EXTEND`: recover a signed value from its magnitude bits
/// and category.
fn huff_extend(bits: u32, size: u8) -> i32 {
    if size == 0 {
        return 0;
    }
    let half = 1i32 << (size - 1);
    let value = bits as i32;
    if value < half {
        value - ((1 << size) - 1)
    } else {
        value
    }
}

/// Drain entropy-coded bytes up to (but not consuming) the next marker,
/// unescaping `0xFF 0x00` to a literal `0xFF` along the way. Returns the
/// unstuffed bytes, the marker that ended the run, and the source position of
/// that marker's leading `0xFF` (so a non-restart marker can be un-consumed).
fn next_ecs_chunk(source: &mut ByteSource) -> Result<(Vec<u8>, Marker, usize), DecodeErrors> {
    let mut bytes = Vec::new();
    loop {
        let before = source.position();
        let byte = source.next()?;
        if byte != 0xFF {
            bytes.push(byte);
            continue;
        }

        let mut marker_byte = source.next()?;
        while marker_byte == 0xFF {
            marker_byte = source.next()?;
        }
        if marker_byte == 0x00 {
            bytes.push(0xFF);
            continue;
        }

        let marker = Marker::from_u8(marker_byte).ok_or(DecodeErrors::InvalidMarker(marker_byte))?;
        return Ok((bytes, marker, before));
    }
}

/// Decode the scan whose header was just parsed (`frame`'s `in_current_scan`
/// flags and spectral/successive-approximation fields are already set).
pub(crate) fn decode_scan(source: &mut ByteSource, frame: &mut Frame) -> Result<(), DecodeErrors> {
    let scan_components: Vec<usize> = frame
        .components
        .iter()
        .enumerate()
        .filter(|(_, c)| c.in_current_scan)
        .map(|(i, _)| i)
        .collect();

    if scan_components.is_empty() {
        return Err(DecodeErrors::InvalidScan("scan selects no components".to_string()));
    }

    let interleaved = scan_components.len() > 1;
    if interleaved && frame.frame_kind == FrameKind::Progressive && frame.spec_start > 0 {
        return Err(DecodeErrors::InvalidScan(
            "progressive AC scans must select exactly one component".to_string(),
        ));
    }

    let total_units = if interleaved {
        frame.mcu_cols * frame.mcu_rows
    } else {
        let idx = scan_components[0];
        frame.components[idx].blocks_per_row * frame.components[idx].blocks_per_column
    };

    let mut units_done = 0usize;
    let mut expected_rst = 0u8;

    loop {
        let (chunk, marker, before) = next_ecs_chunk(source)?;
        let mut reader = BitReader::new(&chunk);

        let segment_units = if frame.restart_interval > 0 {
            frame.restart_interval.min(total_units - units_done)
        } else {
            total_units - units_done
        };

        for unit in units_done..units_done + segment_units {
            if interleaved {
                decode_interleaved_unit(&mut reader, frame, &scan_components, unit)?;
            } else {
                decode_noninterleaved_unit(&mut reader, frame, scan_components[0], unit)?;
            }
        }
        units_done += segment_units;

        match marker {
            Marker::RST(n) => {
                if units_done >= total_units {
                    // A trailing restart marker with nothing left to decode is
                    // tolerated: some encoders emit one before EOI.
                }
                if n != expected_rst {
                    return Err(DecodeErrors::BitstreamCorrupt(format!(
                        "expected restart marker {expected_rst} but found {n}"
                    )));
                }
                expected_rst = (expected_rst + 1) % 8;
                for &idx in &scan_components {
                    frame.components[idx].reset_dc_state();
                }
                continue;
            }
            _ => {
                source.rewind_to(before);
                return Ok(());
            }
        }
    }
}

fn decode_interleaved_unit(
    reader: &mut BitReader, frame: &mut Frame, scan_components: &[usize], mcu_index: usize,
) -> Result<(), DecodeErrors> {
    let mcu_row = mcu_index / frame.mcu_cols;
    let mcu_col = mcu_index % frame.mcu_cols;

    for &component_idx in scan_components {
        let (h, v, blocks_per_row) = {
            let c = &frame.components[component_idx];
            (c.h_sampling, c.v_sampling, c.blocks_per_row)
        };
        for by in 0..v {
            for bx in 0..h {
                let block_row = mcu_row * usize::from(v) + usize::from(by);
                let block_col = mcu_col * usize::from(h) + usize::from(bx);
                let block_index = block_row * blocks_per_row + block_col;
                decode_one_block(reader, frame, component_idx, block_index)?;
            }
        }
    }
    Ok(())
}

fn decode_noninterleaved_unit(
    reader: &mut BitReader, frame: &mut Frame, component_idx: usize, unit_index: usize,
) -> Result<(), DecodeErrors> {
    decode_one_block(reader, frame, component_idx, unit_index)
}

#[allow(clippy::too_many_arguments)]
fn decode_one_block(
    reader: &mut BitReader, frame: &mut Frame, component_idx: usize, block_index: usize,
) -> Result<(), DecodeErrors> {
    let frame_kind = frame.frame_kind;
    let spec_start = frame.spec_start;
    let spec_end = frame.spec_end;
    let succ_high = frame.succ_high;
    let succ_low = frame.succ_low;

    let dc_id = frame.components[component_idx].dc_huff_id;
    let ac_id = frame.components[component_idx].ac_huff_id;
    let dc_table = frame.dc_tables[usize::from(dc_id)].as_ref();
    let ac_table = frame.ac_tables[usize::from(ac_id)].as_ref();

    let component = &mut frame.components[component_idx];
    let block: &mut Block = &mut frame.blocks[component_idx][block_index];

    match frame_kind {
        FrameKind::Baseline => {
            let dc_table = dc_table
                .ok_or_else(|| DecodeErrors::InvalidScan(format!("no DC Huffman table bound for id {dc_id}")))?;
            let ac_table = ac_table
                .ok_or_else(|| DecodeErrors::InvalidScan(format!("no AC Huffman table bound for id {ac_id}")))?;
            decode_block_baseline(reader, block, component, dc_table, ac_table)
        }
        FrameKind::Progressive => {
            if spec_start == 0 {
                if succ_high == 0 {
                    let dc_table = dc_table.ok_or_else(|| {
                        DecodeErrors::InvalidScan(format!("no DC Huffman table bound for id {dc_id}"))
                    })?;
                    decode_dc_first(reader, block, component, dc_table, succ_low)
                } else {
                    decode_dc_refine(reader, block, succ_low)
                }
            } else if succ_high == 0 {
                let ac_table = ac_table.ok_or_else(|| {
                    DecodeErrors::InvalidScan(format!("no AC Huffman table bound for id {ac_id}"))
                })?;
                decode_ac_first(reader, block, component, ac_table, spec_start, spec_end, succ_low)
            } else {
                let ac_table = ac_table.ok_or_else(|| {
                    DecodeErrors::InvalidScan(format!("no AC Huffman table bound for id {ac_id}"))
                })?;
                decode_ac_refine(reader, block, component, ac_table, spec_start, spec_end, succ_low)
            }
        }
    }
}

fn decode_block_baseline(
    reader: &mut BitReader, block: &mut Block, component: &mut crate::components::Component,
    dc_table: &crate::huffman::HuffmanTable, ac_table: &crate::huffman::HuffmanTable,
) -> Result<(), DecodeErrors> {
    let size = dc_table.decode(reader)?;
    if size > 11 {
        return Err(DecodeErrors::BitstreamCorrupt(format!(
            "DC coefficient size category {size} exceeds the 11-bit baseline limit"
        )));
    }
    let bits = if size > 0 { pull_bits(reader, size)? } else { 0 };
    component.dc_predictor += huff_extend(bits, size);
    block[0] = component.dc_predictor;

    let mut k = 1usize;
    while k < 64 {
        let symbol = ac_table.decode(reader)?;
        let run = symbol >> 4;
        let size = symbol & 0x0F;

        if size == 0 {
            if run == 15 {
                k += 16;
                continue;
            }
            break; // EOB: remaining coefficients stay zero.
        }

        k += usize::from(run);
        if k >= 64 {
            return Err(DecodeErrors::BitstreamCorrupt(
                "AC run length advanced past the 64th coefficient".to_string(),
            ));
        }
        let bits = pull_bits(reader, size)?;
        block[UN_ZIGZAG[k]] = huff_extend(bits, size);
        k += 1;
    }

    Ok(())
}

fn decode_dc_first(
    reader: &mut BitReader, block: &mut Block, component: &mut crate::components::Component,
    dc_table: &crate::huffman::HuffmanTable, succ_low: u8,
) -> Result<(), DecodeErrors> {
    let size = dc_table.decode(reader)?;
    let bits = if size > 0 { pull_bits(reader, size)? } else { 0 };
    component.dc_predictor += huff_extend(bits, size);
    block[0] = component.dc_predictor << succ_low;
    Ok(())
}

fn decode_dc_refine(reader: &mut BitReader, block: &mut Block, succ_low: u8) -> Result<(), DecodeErrors> {
    let bit = pull_bit(reader)?;
    block[0] |= i32::from(bit) << succ_low;
    Ok(())
}

fn decode_ac_first(
    reader: &mut BitReader, block: &mut Block, component: &mut crate::components::Component,
    ac_table: &crate::huffman::HuffmanTable, spec_start: u8, spec_end: u8, succ_low: u8,
) -> Result<(), DecodeErrors> {
    if component.eob_run > 0 {
        component.eob_run -= 1;
        return Ok(());
    }

    let mut k = usize::from(spec_start);
    let end = usize::from(spec_end);

    while k <= end {
        let symbol = ac_table.decode(reader)?;
        let run = symbol >> 4;
        let size = symbol & 0x0F;

        if size == 0 {
            if run < 15 {
                let mut eob_run = (1u32 << run).saturating_sub(1);
                if run > 0 {
                    eob_run += pull_bits(reader, run)?;
                }
                component.eob_run = eob_run;
                break;
            }
            k += 16; // ZRL
            continue;
        }

        k += usize::from(run);
        if k > end {
            return Err(DecodeErrors::BitstreamCorrupt(
                "AC run length advanced past the scan's spectral band".to_string(),
            ));
        }
        let bits = pull_bits(reader, size)?;
        block[UN_ZIGZAG[k]] = huff_extend(bits, size) << succ_low;
        k += 1;
    }

    Ok(())
}

/// T.81 Annex G.1.2.3: successive-approximation AC refinement. `p1`/`m1` are
/// the bit values a newly-nonzero coefficient takes depending on its decoded
/// sign; already-nonzero coefficients receive a correction bit only.
fn decode_ac_refine(
    reader: &mut BitReader, block: &mut Block, component: &mut crate::components::Component,
    ac_table: &crate::huffman::HuffmanTable, spec_start: u8, spec_end: u8, succ_low: u8,
) -> Result<(), DecodeErrors> {
    let p1 = 1i32 << succ_low;
    let m1 = -1i32 << succ_low;
    let end = usize::from(spec_end);
    let mut k = usize::from(spec_start);

    if component.eob_run == 0 {
        while k <= end {
            let symbol = ac_table.decode(reader)?;
            let mut run = symbol >> 4;
            let size = symbol & 0x0F;
            let mut value = 0i32;

            if size == 0 {
                if run != 15 {
                    // `eob_run` below counts this block plus every future block
                    // the run covers; this block's own already-nonzero
                    // coefficients from `k` onward still get a correction bit
                    // in the same pass, so only the *count of future* blocks
                    // is left for `component.eob_run`.
                    let mut eob_run = 1u32 << run;
                    if run > 0 {
                        eob_run += pull_bits(reader, run)?;
                    }
                    component.eob_run = eob_run - 1;
                    while k <= end {
                        let natural_index = UN_ZIGZAG[k];
                        if block[natural_index] != 0
                            && pull_bit(reader)? != 0
                            && (block[natural_index] & p1) == 0
                        {
                            block[natural_index] += if block[natural_index] >= 0 { p1 } else { m1 };
                        }
                        k += 1;
                    }
                    return Ok(());
                }
                // run == 15: ZRL, fall through to the skip-and-correct loop below.
            } else if size == 1 {
                value = if pull_bit(reader)? != 0 { p1 } else { m1 };
            } else {
                return Err(DecodeErrors::InvalidScan(format!(
                    "AC refinement symbol has category {size}, only 0 or 1 is valid"
                )));
            }

            loop {
                if k > end {
                    return Err(DecodeErrors::BitstreamCorrupt(
                        "AC refinement run advanced past the scan's spectral band".to_string(),
                    ));
                }
                let natural_index = UN_ZIGZAG[k];
                if block[natural_index] != 0 {
                    if pull_bit(reader)? != 0 && (block[natural_index] & p1) == 0 {
                        block[natural_index] += if block[natural_index] >= 0 { p1 } else { m1 };
                    }
                } else {
                    if run == 0 {
                        if value != 0 {
                            block[natural_index] = value;
                        }
                        k += 1;
                        break;
                    }
                    run -= 1;
                }
                k += 1;
            }
        }
        return Ok(());
    }

    // Continuation block of an EOB run announced by an earlier block's scan:
    // only already-nonzero coefficients receive a correction bit here.
    while k <= end {
        let natural_index = UN_ZIGZAG[k];
        if block[natural_index] != 0 && pull_bit(reader)? != 0 && (block[natural_index] & p1) == 0 {
            block[natural_index] += if block[natural_index] >= 0 { p1 } else { m1 };
        }
        k += 1;
    }
    component.eob_run -= 1;

    Ok(())
}
