//! `kern` — pairwise kerning (spec §4.3). Only format-0 subtables are
//! required; lookup returns 0 for absent pairs or when no format-0
//! subtable is present.

use std::collections::HashMap;

use crate::error::Result;
use crate::reader::Reader;

#[derive(Clone, Debug, Default)]
pub struct KernTable {
    pairs: HashMap<(u16, u16), i16>,
}

impl KernTable {
    pub fn parse(r: &mut Reader) -> Result<KernTable> {
        let _version = r.u16()?;
        let num_subtables = r.u16()?;
        let mut pairs = HashMap::new();
        for _ in 0..num_subtables {
            let _sub_version = r.u16()?;
            let length = r.u16()? as usize;
            let coverage = r.u16()?;
            let format = coverage >> 8;
            let sub_start = r.tell();
            if format == 0 {
                let num_pairs = r.u16()?;
                r.skip(6)?; // searchRange, entrySelector, rangeShift
                for _ in 0..num_pairs {
                    let left = r.u16()?;
                    let right = r.u16()?;
                    let value = r.i16()?;
                    pairs.insert((left, right), value);
                }
            }
            r.seek(sub_start + length.saturating_sub(6))?;
        }
        Ok(KernTable { pairs })
    }

    pub fn get(&self, left: u16, right: u16) -> i16 {
        self.pairs.get(&(left, right)).copied().unwrap_or(0)
    }
}
