//! `cvt ` — Control Value Table (spec §4.3): an array of signed 16-bit
//! font-unit entries referenced by the bytecode interpreter's `RCVT`/`WCVTP`.

use crate::error::Result;
use crate::reader::Reader;

pub fn parse(r: &mut Reader, length: usize) -> Result<Vec<i16>> {
    let count = length / 2;
    let mut v = Vec::with_capacity(count);
    for _ in 0..count {
        v.push(r.i16()?);
    }
    Ok(v)
}
