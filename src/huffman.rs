//! Canonical Huffman table construction and symbol decoding. Code generation
//! follows the usual canonical rule (start at 0 for length 1, increment then
//! shift on every length change); decoding tracks, per code length, the
//! largest code assigned (`max_code`) and the first symbol's table offset
//! (`first_symbol_offset`), rather than a direct lookup table.
use crate::errors::DecodeErrors;

pub(crate) const MAX_CODE_LENGTH: usize = 16;

/// A DC or AC Huffman table, identified externally by `(class, id)`.
pub(crate) struct HuffmanTable {
    /// Number of codes of each length `1..=16`, indexed `0..16`.
    counts: [u8; MAX_CODE_LENGTH],
    /// Symbols in order of increasing code length, then increasing code value.
    symbols: Vec<u8>,
    /// Canonical MSB-first code for each entry in `symbols`, same order.
    codes: Vec<u16>,
    /// For each length `1..=16`: the largest code assigned to that length, or
    /// `None` if no code of that length exists.
    max_code: [Option<u16>; MAX_CODE_LENGTH + 1],
    /// For each length `1..=16`: index into `symbols`/`codes` of the first code
    /// of that length.
    first_index: [usize; MAX_CODE_LENGTH + 1],
}

impl HuffmanTable {
    /// Build a table from a DHT segment's `counts[1..=16]` and its flat
    /// `symbols` list.
    pub(crate) fn new(counts: [u8; MAX_CODE_LENGTH], symbols: Vec<u8>) -> Result<HuffmanTable, DecodeErrors> {
        let total: usize = counts.iter().map(|&c| usize::from(c)).sum();
        if total == 0 {
            return Err(DecodeErrors::InvalidTable(
                "Huffman table defines zero symbols".to_string(),
            ));
        }
        if total != symbols.len() {
            return Err(DecodeErrors::InvalidTable(format!(
                "Huffman table declares {total} symbols but {} were supplied",
                symbols.len()
            )));
        }

        let mut codes = Vec::with_capacity(symbols.len());
        let mut max_code = [None; MAX_CODE_LENGTH + 1];
        let mut first_index = [0usize; MAX_CODE_LENGTH + 1];

        let mut code: u16 = 0;
        let mut index = 0usize;

        for length in 1..=MAX_CODE_LENGTH {
            first_index[length] = index;
            let count = usize::from(counts[length - 1]);

            for _ in 0..count {
                codes.push(code);
                code = code
                    .checked_add(1)
                    .ok_or_else(|| DecodeErrors::InvalidTable("Huffman code overflow".to_string()))?;
                index += 1;
            }

            if count > 0 {
                max_code[length] = Some(code - 1);
            }

            code <<= 1;
        }

        Ok(HuffmanTable {
            counts,
            symbols,
            codes,
            max_code,
            first_index,
        })
    }

    /// Decode one symbol from `reader`, walking code lengths `1..=16` until a
    /// canonical code matches. `BitstreamCorrupt` if all 16 lengths are
    /// exhausted with no match.
    pub(crate) fn decode(&self, reader: &mut crate::bitstream::BitReader) -> Result<u8, DecodeErrors> {
        use crate::bitstream::BitResult;

        let mut code: u16 = 0;

        for length in 1..=MAX_CODE_LENGTH {
            code = match reader.read_bit() {
                BitResult::Value(bit) => (code << 1) | u16::from(bit),
                BitResult::Exhausted => {
                    return Err(DecodeErrors::BitstreamCorrupt(
                        "ran out of bits while decoding a Huffman symbol".to_string(),
                    ))
                }
            };

            if let Some(max) = self.max_code[length] {
                if code <= max {
                    let first_code_of_length = max - (u16::from(self.counts[length - 1]) - 1);
                    let offset = (code - first_code_of_length) as usize;
                    let symbol_index = self.first_index[length] + offset;
                    return Ok(self.symbols[symbol_index]);
                }
            }
        }

        Err(DecodeErrors::BitstreamCorrupt(
            "no Huffman code matched after 16 bits".to_string(),
        ))
    }

    #[cfg(test)]
    pub(crate) fn code_of(&self, symbol: u8) -> Option<(u16, u8)> {
        let pos = self.symbols.iter().position(|&s| s == symbol)?;
        let code = self.codes[pos];
        // recover the bit length this code was assigned
        for length in 1..=MAX_CODE_LENGTH {
            let start = self.first_index[length];
            let count = usize::from(self.counts[length - 1]);
            if pos >= start && pos < start + count {
                return Some((code, length as u8));
            }
        }
        None
    }
}
