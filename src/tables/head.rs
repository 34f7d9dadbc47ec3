//! `head` — font header (spec §4.3).

use crate::error::Result;
use crate::reader::Reader;

#[derive(Copy, Clone, Debug)]
pub struct HeadTable {
    pub flags: u16,
    pub units_per_em: u16,
    /// 0 = short `loca` entries, 1 = long.
    pub index_to_loc_format: i16,
}

impl HeadTable {
    pub fn parse(r: &mut Reader) -> Result<HeadTable> {
        r.skip(16)?; // version, fontRevision, checkSumAdjustment, magicNumber
        let flags = r.u16()?;
        let units_per_em = r.u16()?;
        r.skip(30)?; // created, modified, xMin/yMin/xMax/yMax, macStyle, lowestRecPPEM, fontDirectionHint
        let index_to_loc_format = r.i16()?;
        Ok(HeadTable { flags, units_per_em, index_to_loc_format })
    }

    pub fn integer_ppem(&self) -> bool {
        self.flags & 0x0008 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::builder::head_table;

    #[test]
    fn parses_units_per_em_and_loca_format() {
        let data = head_table(2048, 1);
        let mut r = Reader::new(&data);
        let head = HeadTable::parse(&mut r).unwrap();
        assert_eq!(head.units_per_em, 2048);
        assert_eq!(head.index_to_loc_format, 1);
    }
}
