//! The marker-segment parser: a state machine over the JPEG byte stream that
//! populates `Frame`'s geometry, quantization tables, Huffman tables, and
//! per-scan bindings.
use crate::byte_reader::ByteSource;
use crate::components::Component;
use crate::errors::{DecodeErrors, UnsupportedFeature};
use crate::frame::{Frame, MAX_COMPONENTS};
use crate::huffman::{HuffmanTable, MAX_CODE_LENGTH};
use crate::marker::Marker;
use crate::misc::{FrameKind, UN_ZIGZAG};

/// Parser state. `Done` is reached once EOI follows the final scan.
#[derive(Copy, Clone, Eq, PartialEq)]
pub(crate) enum ParserState {
    ExpectSoi,
    TablesMisc,
    FrameHeaderSeen,
    BetweenScans,
    Done,
}

/// Drive the marker state machine from right after `SOI` up to (but not
/// including) the entropy-coded data that follows each `SOS`.
///
/// Returns `Ok(Some(()))`-shaped control via the `on_scan` callback: every time
/// an `SOS` is parsed, `on_scan` is invoked with the byte source positioned at
/// the start of that scan's ECS; it is expected to assemble and decode the
/// scan and leave the source positioned at the marker that terminated the ECS.
pub(crate) fn parse_headers<F>(
    source: &mut ByteSource, frame: &mut Frame, mut on_scan: F,
) -> Result<(), DecodeErrors>
where
    F: FnMut(&mut ByteSource, &mut Frame) -> Result<(), DecodeErrors>,
{
    let mut state = ParserState::ExpectSoi;

    loop {
        match state {
            ParserState::ExpectSoi => {
                let marker = next_marker(source)?;
                if marker != Marker::SOI {
                    return Err(DecodeErrors::InvalidMarker(0xD8));
                }
                state = ParserState::TablesMisc;
            }
            ParserState::Done => return Ok(()),
            ParserState::TablesMisc | ParserState::FrameHeaderSeen | ParserState::BetweenScans => {
                let marker = next_marker(source)?;
                state = dispatch(marker, source, frame, state, &mut on_scan)?;
            }
        }
    }
}

/// Parse only as far as the frame header (SOF), for callers that only need
/// dimensions/colorspace and don't want the entropy-coded data touched.
pub(crate) fn parse_until_frame_header(source: &mut ByteSource, frame: &mut Frame) -> Result<(), DecodeErrors> {
    if next_marker(source)? != Marker::SOI {
        return Err(DecodeErrors::InvalidMarker(0xD8));
    }

    loop {
        match next_marker(source)? {
            Marker::APP(_) | Marker::JPG(_) | Marker::COM | Marker::DNL | Marker::DHP | Marker::EXP => {
                skip_segment(source)?;
            }
            Marker::TEM => {}
            Marker::DQT => parse_dqt(source, frame)?,
            Marker::DHT => parse_dht(source, frame)?,
            Marker::DRI => parse_dri(source, frame)?,
            Marker::SOF(0) => return parse_sof(source, frame, FrameKind::Baseline),
            Marker::SOF(2) => return parse_sof(source, frame, FrameKind::Progressive),
            Marker::SOF(1) => {
                return Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::ExtendedSequentialHuffman))
            }
            Marker::SOF(3) => return Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::LosslessHuffman)),
            other => {
                return Err(DecodeErrors::InvalidScan(format!(
                    "unexpected marker before a frame header was seen: {:#x}",
                    marker_debug_byte(other)
                )))
            }
        }
    }
}

fn marker_debug_byte(marker: Marker) -> u8 {
    match marker {
        Marker::SOF(n) => 0xC0 + n,
        Marker::RST(n) => 0xD0 + n,
        Marker::APP(n) => 0xE0 + n,
        Marker::JPG(n) => 0xF0 + n,
        Marker::SOI => 0xD8,
        Marker::EOI => 0xD9,
        Marker::SOS => 0xDA,
        Marker::DQT => 0xDB,
        Marker::DHT => 0xC4,
        Marker::DRI => 0xDD,
        Marker::DAC => 0xCC,
        Marker::DNL => 0xDC,
        Marker::DHP => 0xDE,
        Marker::EXP => 0xDF,
        Marker::COM => 0xFE,
        Marker::TEM => 0x01,
    }
}

fn next_marker(source: &mut ByteSource) -> Result<Marker, DecodeErrors> {
    loop {
        let byte = source.next()?;
        if byte != 0xFF {
            continue;
        }
        // Skip fill bytes (multiple consecutive 0xFF before the real marker byte).
        let mut marker_byte = source.next()?;
        while marker_byte == 0xFF {
            marker_byte = source.next()?;
        }
        if marker_byte == 0x00 {
            // Byte-stuffed literal 0xFF outside an ECS: desynchronized stream.
            return Err(DecodeErrors::InvalidMarker(marker_byte));
        }
        return Marker::from_u8(marker_byte).ok_or(DecodeErrors::InvalidMarker(marker_byte));
    }
}

#[allow(clippy::too_many_lines)]
fn dispatch<F>(
    marker: Marker, source: &mut ByteSource, frame: &mut Frame, state: ParserState, on_scan: &mut F,
) -> Result<ParserState, DecodeErrors>
where
    F: FnMut(&mut ByteSource, &mut Frame) -> Result<(), DecodeErrors>,
{
    match marker {
        Marker::SOI => Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::Hierarchical)),
        Marker::APP(_) | Marker::JPG(_) | Marker::COM | Marker::DNL | Marker::DHP | Marker::EXP => {
            let length = skip_segment(source)?;
            trace!("skipping {length} byte segment for marker we don't interpret");
            Ok(state)
        }
        Marker::TEM => Ok(state),
        Marker::DQT => {
            parse_dqt(source, frame)?;
            Ok(state)
        }
        Marker::DHT => {
            parse_dht(source, frame)?;
            Ok(state)
        }
        Marker::DRI => {
            parse_dri(source, frame)?;
            Ok(state)
        }
        Marker::DAC => Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::ArithmeticCoding)),
        Marker::SOF(0) => {
            parse_sof(source, frame, FrameKind::Baseline)?;
            Ok(ParserState::FrameHeaderSeen)
        }
        Marker::SOF(2) => {
            parse_sof(source, frame, FrameKind::Progressive)?;
            Ok(ParserState::FrameHeaderSeen)
        }
        Marker::SOF(1) => Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::ExtendedSequentialHuffman)),
        Marker::SOF(3) => Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::LosslessHuffman)),
        Marker::SOF(_) => Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::Hierarchical)),
        Marker::SOS => {
            if state != ParserState::FrameHeaderSeen && state != ParserState::BetweenScans {
                return Err(DecodeErrors::InvalidScan(
                    "SOS encountered before a frame header".to_string(),
                ));
            }
            parse_sos(source, frame)?;
            on_scan(source, frame)?;
            Ok(ParserState::BetweenScans)
        }
        Marker::EOI => Ok(ParserState::Done),
        Marker::RST(_) => {
            // A restart marker should never be seen outside an ECS; the entropy
            // decoder is responsible for consuming these during scan decode.
            Err(DecodeErrors::InvalidMarker(0xD0))
        }
    }
}

fn skip_segment(source: &mut ByteSource) -> Result<usize, DecodeErrors> {
    let length = source.next_u16_be()?;
    if length < 2 {
        return Err(DecodeErrors::InvalidMarker(0));
    }
    source.skip(usize::from(length) - 2)?;
    Ok(usize::from(length) - 2)
}

/// **B.2.4.1 Quantization table-specification syntax.**
fn parse_dqt(source: &mut ByteSource, frame: &mut Frame) -> Result<(), DecodeErrors> {
    let length = source.next_u16_be()?;
    let mut read = 2u16;

    while read < length {
        let info = source.next()?;
        read += 1;
        let table_id = info & 0x0F;
        let precision = info >> 4;

        if table_id > 3 {
            return Err(DecodeErrors::InvalidTable(format!(
                "quantization table id {table_id} is out of range 0..=3"
            )));
        }

        let mut zigzag = [0u16; 64];
        match precision {
            0 => {
                for slot in &mut zigzag {
                    *slot = u16::from(source.next()?);
                }
                read += 64;
            }
            1 => {
                for slot in &mut zigzag {
                    *slot = source.next_u16_be()?;
                }
                read += 128;
            }
            _ => {
                return Err(DecodeErrors::InvalidTable(format!(
                    "quantization table precision nibble {precision} is neither 8-bit (0) nor 16-bit (1)"
                )))
            }
        }

        if frame.quant_tables[usize::from(table_id)].is_some() && frame.components.is_empty() {
            // A redefinition before any frame header is a duplicate within the
            // same "DQT scope"; progressive scans legitimately redefine tables
            // between scans, so only flag it pre-SOF.
            return Err(DecodeErrors::InvalidTable(format!(
                "quantization table {table_id} defined twice before SOF"
            )));
        }

        let mut natural = [0i32; 64];
        for (zz_index, &value) in zigzag.iter().enumerate() {
            natural[UN_ZIGZAG[zz_index]] = i32::from(value);
        }
        frame.quant_tables[usize::from(table_id)] = Some(natural);
    }

    Ok(())
}

/// **B.2.4.2 Huffman table-specification syntax.**
fn parse_dht(source: &mut ByteSource, frame: &mut Frame) -> Result<(), DecodeErrors> {
    let length = source.next_u16_be()?;
    let mut read = 2u16;

    while read < length {
        let info = source.next()?;
        read += 1;
        let is_ac = (info >> 4) & 0x01 == 1;
        let table_id = info & 0x0F;
        if table_id > 3 {
            return Err(DecodeErrors::InvalidTable(format!(
                "Huffman table id {table_id} is out of range 0..=3"
            )));
        }

        let mut counts = [0u8; MAX_CODE_LENGTH];
        for slot in &mut counts {
            *slot = source.next()?;
        }
        read += MAX_CODE_LENGTH as u16;

        let symbol_count: u16 = counts.iter().map(|&c| u16::from(c)).sum();
        let mut symbols = vec![0u8; usize::from(symbol_count)];
        for slot in &mut symbols {
            *slot = source.next()?;
        }
        read += symbol_count;

        let table = HuffmanTable::new(counts, symbols)?;
        if is_ac {
            frame.ac_tables[usize::from(table_id)] = Some(table);
        } else {
            frame.dc_tables[usize::from(table_id)] = Some(table);
        }
    }

    Ok(())
}

fn parse_dri(source: &mut ByteSource, frame: &mut Frame) -> Result<(), DecodeErrors> {
    let length = source.next_u16_be()?;
    if length != 4 {
        return Err(DecodeErrors::InvalidScan("DRI segment length must be 4".to_string()));
    }
    frame.restart_interval = usize::from(source.next_u16_be()?);
    debug!("restart interval set to {} MCUs", frame.restart_interval);
    Ok(())
}

/// **B.2.2 Frame header syntax.**
fn parse_sof(source: &mut ByteSource, frame: &mut Frame, kind: FrameKind) -> Result<(), DecodeErrors> {
    let length = source.next_u16_be()?;
    let precision = source.next()?;
    if precision != 8 {
        return Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::Precision(precision)));
    }

    // T.81 orders height before width after the precision byte.
    let height = source.next_u16_be()?;
    let width = source.next_u16_be()?;
    if width == 0 || height == 0 {
        return Err(DecodeErrors::InvalidScan("frame width or height is zero".to_string()));
    }

    let component_count = source.next()?;
    if component_count == 0 || usize::from(component_count) > MAX_COMPONENTS {
        return Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::Hierarchical));
    }
    let expected_length = 8 + 3 * u16::from(component_count);
    if length != expected_length {
        return Err(DecodeErrors::InvalidScan(format!(
            "SOF length {length} does not match {expected_length} expected for {component_count} components"
        )));
    }

    let mut raw_ids = [0u8; MAX_COMPONENTS];
    let mut components = Vec::with_capacity(usize::from(component_count));
    for i in 0..usize::from(component_count) {
        let mut bytes = [0u8; 3];
        for slot in &mut bytes {
            *slot = source.next()?;
        }
        raw_ids[i] = bytes[0];
        components.push(Component::from_sof_bytes(bytes, i)?);
    }

    // Some encoders declare component ids starting at 0 instead of 1; detect
    // that and shift every id up by one so SOS selectors (which always use
    // the 1-based convention) can be matched against `declared_id` below.
    let zero_based = raw_ids[..usize::from(component_count)].contains(&0);
    if zero_based {
        for component in &mut components {
            component.declared_id += 1;
        }
    }

    for component in &components {
        if frame.quant_tables[usize::from(component.quant_table_id)].is_none() {
            return Err(DecodeErrors::InvalidTable(format!(
                "component references quantization table {} which was never defined",
                component.quant_table_id
            )));
        }
    }

    // Chroma components must be (1,1) in this core; only luma may sub-sample.
    for component in components.iter().skip(1) {
        if component.h_sampling != 1 || component.v_sampling != 1 {
            return Err(DecodeErrors::UnsupportedFormat(UnsupportedFeature::Precision(8)));
        }
    }

    frame.width = width;
    frame.height = height;
    frame.frame_kind = kind;
    frame.components = components;
    frame.finish_geometry()?;

    info!(
        "frame header: {width}x{height}, {component_count} components, {:?}, max sampling {}x{}",
        kind, frame.h_max, frame.v_max
    );

    Ok(())
}

/// Parse a Start-Of-Scan header, binding each scan component's DC/AC table ids
/// and (for progressive frames) its spectral band and successive-approximation
/// parameters.
fn parse_sos(source: &mut ByteSource, frame: &mut Frame) -> Result<(), DecodeErrors> {
    let length = source.next_u16_be()?;
    let scan_component_count = source.next()?;
    if scan_component_count == 0 || usize::from(scan_component_count) > MAX_COMPONENTS {
        return Err(DecodeErrors::InvalidScan(format!(
            "scan declares {scan_component_count} components, expected 1..=3"
        )));
    }
    let expected_length = 6 + 2 * u16::from(scan_component_count);
    if length != expected_length {
        return Err(DecodeErrors::InvalidScan(format!(
            "SOS length {length} does not match {expected_length} expected for {scan_component_count} components"
        )));
    }

    for component in &mut frame.components {
        component.in_current_scan = false;
    }

    for _ in 0..scan_component_count {
        let selector = source.next()?;
        let tables = source.next()?;

        // `selector` must match one of the frame's declared (and normalized)
        // component ids -- not a hardcoded 1/2/3 position -- so frames that
        // legitimately declare ids outside that range still resolve.
        let component = frame
            .components
            .iter_mut()
            .find(|c| c.declared_id == selector)
            .ok_or_else(|| {
                DecodeErrors::InvalidScan(format!("scan references component selector {selector} with no matching SOF component"))
            })?;

        component.dc_huff_id = tables >> 4;
        component.ac_huff_id = tables & 0x0F;
        component.in_current_scan = true;
    }

    if frame.frame_kind == FrameKind::Progressive {
        let spec_start = source.next()? & 63;
        let spec_end = source.next()? & 63;
        if spec_start > spec_end {
            return Err(DecodeErrors::InvalidScan(
                "spectral selection start is greater than end".to_string(),
            ));
        }
        let approx = source.next()?;
        let succ_high = approx >> 4;
        let succ_low = approx & 0x0F;
        if succ_high != 0 && succ_high != succ_low + 1 {
            return Err(DecodeErrors::InvalidScan(
                "successive approximation Ah must be 0 or Al+1".to_string(),
            ));
        }
        frame.spec_start = spec_start;
        frame.spec_end = spec_end;
        frame.succ_high = succ_high;
        frame.succ_low = succ_low;
    } else {
        source.skip(3)?;
        frame.spec_start = 0;
        frame.spec_end = 63;
        frame.succ_high = 0;
        frame.succ_low = 0;
    }

    frame.reset_dc_predictors();

    Ok(())
}
