//! `fpgm`/`prep` — raw bytecode streams (spec §4.3), executed respectively
//! at face load and at each new ppem (spec §4.7).

use crate::error::Result;
use crate::reader::Reader;

pub fn parse(r: &mut Reader, length: usize) -> Result<Vec<u8>> {
    Ok(r.bytes(length)?.to_vec())
}
