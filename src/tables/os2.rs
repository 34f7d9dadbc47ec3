//! `OS/2` — Windows/OS2-specific metrics (spec §4.3).

use crate::error::Result;
use crate::reader::Reader;

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug)]
    pub struct FsSelection: u16 {
        const ITALIC           = 0x0001;
        const BOLD              = 0x0020;
        const REGULAR            = 0x0040;
        const USE_TYPO_METRICS  = 0x0080;
        const WWS                = 0x0100;
        const OBLIQUE            = 0x0200;
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Os2Table {
    pub weight_class: u16,
    pub stretch_class: u16,
    pub strikeout_size: i16,
    pub strikeout_position: i16,
    pub fs_selection: FsSelection,
    pub typo_ascender: i16,
    pub typo_descender: i16,
    pub typo_line_gap: i16,
    pub win_ascent: u16,
    pub win_descent: u16,
    pub x_height: i16,
    pub cap_height: i16,
}

impl Os2Table {
    pub fn parse(r: &mut Reader) -> Result<Os2Table> {
        r.skip(4)?; // version, xAvgCharWidth... (version field only; weight follows immediately)
        let weight_class = r.u16()?;
        let stretch_class = r.u16()?;
        r.skip(18)?; // fsType..ySubscript/ySuperscript metrics
        let strikeout_size = r.i16()?;
        let strikeout_position = r.i16()?;
        r.skip(32)?; // sFamilyClass, panose[10], ulUnicodeRange[4], achVendID
        let fs_selection = FsSelection::from_bits_truncate(r.u16()?);
        r.skip(4)?; // usFirstCharIndex, usLastCharIndex
        let typo_ascender = r.i16()?;
        let typo_descender = r.i16()?;
        let typo_line_gap = r.i16()?;
        let win_ascent = r.u16()?;
        let win_descent = r.u16()?;
        r.skip(8)?; // ulCodePageRange1/2
        let x_height = r.i16()?;
        let cap_height = r.i16()?;
        Ok(Os2Table {
            weight_class,
            stretch_class,
            strikeout_size,
            strikeout_position,
            fs_selection,
            typo_ascender,
            typo_descender,
            typo_line_gap,
            win_ascent,
            win_descent,
            x_height,
            cap_height,
        })
    }
}
