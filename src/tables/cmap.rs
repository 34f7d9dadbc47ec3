//! `cmap` — character to glyph index mapping (spec §4.3). Supports subtable
//! formats 0, 4, 6, and 12, selecting the best encoding record by the
//! priority spec.md lists: Microsoft Unicode full (3,10), Microsoft Unicode
//! BMP (3,1), then any Unicode platform-0 encoding.

use crate::error::Result;
use crate::reader::Reader;

#[derive(Clone, Debug)]
enum Subtable {
    Format0 { glyph_ids: [u16; 256] },
    Format4 {
        end_code: Vec<u16>,
        start_code: Vec<u16>,
        id_delta: Vec<i16>,
        id_range_offset: Vec<u16>,
        glyph_indices: Vec<u16>,
        range_offset_base: usize,
    },
    Format6 { first_code: u16, glyph_indices: Vec<u16> },
    Format12 { groups: Vec<(u32, u32, u32)> },
}

#[derive(Clone, Debug, Default)]
pub struct CmapTable {
    subtable: Option<Subtable>,
}

impl CmapTable {
    pub fn parse(r: &mut Reader, table_offset: usize) -> Result<CmapTable> {
        r.seek(table_offset)?;
        let _version = r.u16()?;
        let num_tables = r.u16()?;

        let mut best: Option<(i32, usize)> = None; // (priority, subtable offset)
        for _ in 0..num_tables {
            let platform_id = r.u16()?;
            let encoding_id = r.u16()?;
            let offset = r.u32()? as usize;
            let priority = match (platform_id, encoding_id) {
                (3, 10) => 3,
                (3, 1) => 2,
                (0, _) => 1,
                _ => 0,
            };
            if priority > 0 && best.map(|(p, _)| priority > p).unwrap_or(true) {
                best = Some((priority, table_offset + offset));
            }
        }

        let subtable = match best {
            Some((_, off)) => Some(Self::parse_subtable(r, off)?),
            None => None,
        };
        Ok(CmapTable { subtable })
    }

    fn parse_subtable(r: &mut Reader, offset: usize) -> Result<Subtable> {
        r.seek(offset)?;
        let format = r.u16()?;
        match format {
            0 => {
                r.skip(4)?; // length, language
                let mut glyph_ids = [0u16; 256];
                for slot in glyph_ids.iter_mut() {
                    *slot = r.u8()? as u16;
                }
                Ok(Subtable::Format0 { glyph_ids })
            }
            4 => {
                r.skip(4)?; // length, language
                let seg_count = (r.u16()? / 2) as usize;
                r.skip(6)?; // searchRange, entrySelector, rangeShift
                let mut end_code = Vec::with_capacity(seg_count);
                for _ in 0..seg_count {
                    end_code.push(r.u16()?);
                }
                r.skip(2)?; // reservedPad
                let mut start_code = Vec::with_capacity(seg_count);
                for _ in 0..seg_count {
                    start_code.push(r.u16()?);
                }
                let mut id_delta = Vec::with_capacity(seg_count);
                for _ in 0..seg_count {
                    id_delta.push(r.i16()?);
                }
                let range_offset_base = r.tell();
                let mut id_range_offset = Vec::with_capacity(seg_count);
                for _ in 0..seg_count {
                    id_range_offset.push(r.u16()?);
                }
                let glyph_array_start = r.tell();
                let remaining_words = r.remaining() / 2;
                let mut glyph_indices = Vec::with_capacity(remaining_words);
                for _ in 0..remaining_words {
                    glyph_indices.push(r.u16()?);
                }
                let _ = glyph_array_start;
                Ok(Subtable::Format4 { end_code, start_code, id_delta, id_range_offset, glyph_indices, range_offset_base })
            }
            6 => {
                r.skip(4)?; // length, language
                let first_code = r.u16()?;
                let entry_count = r.u16()?;
                let mut glyph_indices = Vec::with_capacity(entry_count as usize);
                for _ in 0..entry_count {
                    glyph_indices.push(r.u16()?);
                }
                Ok(Subtable::Format6 { first_code, glyph_indices })
            }
            12 => {
                r.skip(2)?; // reserved
                r.skip(8)?; // length, language
                let num_groups = r.u32()?;
                let mut groups = Vec::with_capacity(num_groups as usize);
                for _ in 0..num_groups {
                    let start_char = r.u32()?;
                    let end_char = r.u32()?;
                    let start_glyph = r.u32()?;
                    groups.push((start_char, end_char, start_glyph));
                }
                Ok(Subtable::Format12 { groups })
            }
            other => Err(crate::error::Error::InvalidTable {
                tag: crate::tables::TAG_CMAP,
                reason: match other {
                    2 => "format 2 (high-byte mapping) is not supported",
                    _ => "unknown cmap subtable format",
                },
            }),
        }
    }

    /// Resolve a Unicode code point to a glyph index. Code points outside
    /// the table (or when no usable subtable was found) return 0
    /// (`.notdef`), per spec §4.3.
    pub fn lookup(&self, code_point: u32) -> u16 {
        match &self.subtable {
            None => 0,
            Some(Subtable::Format0 { glyph_ids }) => {
                if code_point < 256 {
                    glyph_ids[code_point as usize]
                } else {
                    0
                }
            }
            Some(Subtable::Format6 { first_code, glyph_indices }) => {
                let first = *first_code as u32;
                if code_point >= first && (code_point - first) < glyph_indices.len() as u32 {
                    glyph_indices[(code_point - first) as usize]
                } else {
                    0
                }
            }
            Some(Subtable::Format12 { groups }) => {
                for &(start, end, start_glyph) in groups {
                    if code_point >= start && code_point <= end {
                        return (start_glyph + (code_point - start)) as u16;
                    }
                }
                0
            }
            Some(Subtable::Format4 { end_code, start_code, id_delta, id_range_offset, glyph_indices, range_offset_base }) => {
                if code_point > 0xFFFF {
                    return 0;
                }
                let cp = code_point as u16;
                for seg in 0..end_code.len() {
                    if cp <= end_code[seg] {
                        if cp < start_code[seg] {
                            return 0;
                        }
                        if id_range_offset[seg] == 0 {
                            return (cp as i32 + id_delta[seg] as i32) as u16;
                        }
                        // glyphIndexAddress = &idRangeOffset[seg] + idRangeOffset[seg] + 2*(c - startCode[seg])
                        let offset_in_table = range_offset_base + seg * 2 + id_range_offset[seg] as usize + 2 * (cp - start_code[seg]) as usize;
                        let glyph_array_byte_start = range_offset_base + end_code.len() * 2;
                        if offset_in_table < glyph_array_byte_start {
                            return 0;
                        }
                        let index = (offset_in_table - glyph_array_byte_start) / 2;
                        let raw = glyph_indices.get(index).copied().unwrap_or(0);
                        if raw == 0 {
                            return 0;
                        }
                        return (raw as i32 + id_delta[seg] as i32) as u16;
                    }
                }
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_format0_cmap() -> Vec<u8> {
        let mut glyph_ids = [0u8; 256];
        glyph_ids[b'A' as usize] = 5;

        let mut sub = Vec::new();
        sub.extend_from_slice(&0u16.to_be_bytes()); // format
        sub.extend_from_slice(&262u16.to_be_bytes()); // length
        sub.extend_from_slice(&0u16.to_be_bytes()); // language
        sub.extend_from_slice(&glyph_ids);

        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_be_bytes()); // cmap version
        data.extend_from_slice(&1u16.to_be_bytes()); // num tables
        data.extend_from_slice(&0u16.to_be_bytes()); // platform 0 (Unicode)
        data.extend_from_slice(&3u16.to_be_bytes()); // encoding
        let sub_offset = 4 + 8;
        data.extend_from_slice(&(sub_offset as u32).to_be_bytes());
        data.extend_from_slice(&sub);
        data
    }

    #[test]
    fn format0_lookup() {
        let data = build_format0_cmap();
        let mut r = Reader::new(&data);
        let cmap = CmapTable::parse(&mut r, 0).unwrap();
        assert_eq!(cmap.lookup('A' as u32), 5);
        assert_eq!(cmap.lookup('B' as u32), 0);
    }

    #[test]
    fn format12_lookup_outside_astral_bmp() {
        let mut sub = Vec::new();
        sub.extend_from_slice(&12u16.to_be_bytes());
        sub.extend_from_slice(&0u16.to_be_bytes()); // reserved
        sub.extend_from_slice(&24u32.to_be_bytes()); // length
        sub.extend_from_slice(&0u32.to_be_bytes()); // language
        sub.extend_from_slice(&1u32.to_be_bytes()); // num groups
        sub.extend_from_slice(&0x1F600u32.to_be_bytes()); // startCharCode
        sub.extend_from_slice(&0x1F600u32.to_be_bytes()); // endCharCode
        sub.extend_from_slice(&9u32.to_be_bytes()); // startGlyphID

        let mut data = Vec::new();
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes()); // platform 3
        data.extend_from_slice(&10u16.to_be_bytes()); // encoding 10: full unicode
        let sub_offset = 4 + 8;
        data.extend_from_slice(&(sub_offset as u32).to_be_bytes());
        data.extend_from_slice(&sub);

        let mut r = Reader::new(&data);
        let cmap = CmapTable::parse(&mut r, 0).unwrap();
        assert_eq!(cmap.lookup(0x1F600), 9);
        assert_eq!(cmap.lookup(0x1F601), 0);
    }

    #[test]
    fn no_usable_subtable_returns_notdef() {
        let cmap = CmapTable::default();
        assert_eq!(cmap.lookup(65), 0);
    }
}
