//! `post` — PostScript information (spec §4.3). Only the header fields this
//! crate needs are decoded; glyph name tables (formats 2.0) are not parsed.

use crate::error::Result;
use crate::reader::Reader;

#[derive(Copy, Clone, Debug)]
pub struct PostTable {
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: bool,
}

impl PostTable {
    pub fn parse(r: &mut Reader) -> Result<PostTable> {
        r.skip(8)?; // version, italicAngle
        let underline_position = r.i16()?;
        let underline_thickness = r.i16()?;
        let is_fixed_pitch = r.u32()? != 0;
        Ok(PostTable { underline_position, underline_thickness, is_fixed_pitch })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_underline_metrics() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&(-100i16).to_be_bytes());
        data.extend_from_slice(&50i16.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        let mut r = Reader::new(&data);
        let post = PostTable::parse(&mut r).unwrap();
        assert_eq!(post.underline_position, -100);
        assert_eq!(post.underline_thickness, 50);
        assert!(post.is_fixed_pitch);
    }
}
