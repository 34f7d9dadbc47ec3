//! `hhea`/`vhea` — horizontal/vertical header (spec §4.3). Both tables share
//! the same layout after the version field, so one parser serves both.

use crate::error::Result;
use crate::reader::Reader;

#[derive(Copy, Clone, Debug)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub num_metrics: u16,
}

impl HheaTable {
    pub fn parse(r: &mut Reader) -> Result<HheaTable> {
        r.skip(4)?; // version
        let ascender = r.i16()?;
        let descender = r.i16()?;
        let line_gap = r.i16()?;
        r.skip(24)?; // advanceWidthMax..metricDataFormat
        let num_metrics = r.u16()?;
        Ok(HheaTable { ascender, descender, line_gap, num_metrics })
    }
}
