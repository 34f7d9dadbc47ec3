//! `maxp` — maximum profile (spec §4.3), grounded in the teacher's
//! `MaxProfileTable` (`truetype_loader/mod.rs`), generalized with the
//! >32767 glyph-count rejection spec.md requires.

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::tables::TAG_MAXP;

#[derive(Copy, Clone, Debug)]
pub struct MaxpTable {
    pub num_glyphs: u16,
    pub max_points: u16,
    pub max_contours: u16,
    pub max_component_points: u16,
    pub max_component_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

impl MaxpTable {
    pub fn parse(r: &mut Reader) -> Result<MaxpTable> {
        r.skip(4)?; // version
        let num_glyphs = r.u16()?;
        if num_glyphs > 32767 {
            return Err(Error::InvalidTable { tag: TAG_MAXP, reason: "glyph count exceeds 32767" });
        }
        Ok(MaxpTable {
            num_glyphs,
            max_points: r.u16()?,
            max_contours: r.u16()?,
            max_component_points: r.u16()?,
            max_component_contours: r.u16()?,
            max_zones: r.u16()?,
            max_twilight_points: r.u16()?,
            max_storage: r.u16()?,
            max_function_defs: r.u16()?,
            max_instruction_defs: r.u16()?,
            max_stack_elements: r.u16()?,
            max_size_of_instructions: r.u16()?,
            max_component_elements: r.u16()?,
            max_component_depth: r.u16()?,
        })
    }
}
