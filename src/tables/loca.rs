//! `loca` — glyph location index (spec §4.3), grounded in the teacher's
//! `LocationTable::from_binary`.

use crate::error::Result;
use crate::reader::Reader;

#[derive(Clone, Debug)]
pub struct LocaTable {
    pub offsets: Vec<u32>,
}

impl LocaTable {
    pub fn parse(r: &mut Reader, num_glyphs: u16, long_format: bool) -> Result<LocaTable> {
        let mut offsets = Vec::with_capacity(num_glyphs as usize + 1);
        for _ in 0..=num_glyphs {
            offsets.push(if long_format { r.u32()? } else { (r.u16()? as u32) << 1 });
        }
        Ok(LocaTable { offsets })
    }

    /// `(offset, length)` of glyph `i` in the `glyf` table, or `None` if the
    /// entry is empty (spec §4.4: `loca[i] == loca[i+1]`).
    pub fn glyph_range(&self, glyph_index: u16) -> Option<(u32, u32)> {
        let i = glyph_index as usize;
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        if end <= start {
            None
        } else {
            Some((start, end - start))
        }
    }
}
