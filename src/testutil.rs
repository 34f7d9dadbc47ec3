//! In-memory SFNT construction helpers for unit tests. The teacher's tests
//! opened `C:\Windows\Fonts\arial.ttf` directly (`truetype_loader/mod.rs`,
//! `truetype_file.rs`); this crate's tests build minimal synthetic fonts
//! instead so they run in any environment without a bundled font fixture.
#![cfg(test)]

use crate::error::Tag;

pub mod builder {
    use super::*;

    fn pad4(buf: &mut Vec<u8>) {
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
    }

    pub struct SfntBuilder {
        tables: Vec<(Tag, Vec<u8>)>,
    }

    impl SfntBuilder {
        pub fn new() -> SfntBuilder {
            SfntBuilder { tables: Vec::new() }
        }

        pub fn table(mut self, tag: Tag, data: Vec<u8>) -> Self {
            self.tables.retain(|(t, _)| *t != tag);
            self.tables.push((tag, data));
            self
        }

        pub fn build(self) -> Vec<u8> {
            let mut out = Vec::new();
            out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
            out.extend_from_slice(&(self.tables.len() as u16).to_be_bytes());
            out.extend_from_slice(&[0u8; 6]); // searchRange/entrySelector/rangeShift

            let header_len = 12 + 16 * self.tables.len();
            let mut body = Vec::new();
            let mut records = Vec::new();
            for (tag, data) in &self.tables {
                let offset = header_len + body.len();
                records.push((*tag, offset as u32, data.len() as u32));
                body.extend_from_slice(data);
                pad4(&mut body);
            }
            for (tag, offset, length) in records {
                out.extend_from_slice(&tag.0);
                out.extend_from_slice(&0u32.to_be_bytes()); // checksum, unused by the decoder
                out.extend_from_slice(&offset.to_be_bytes());
                out.extend_from_slice(&length.to_be_bytes());
            }
            out.extend_from_slice(&body);
            out
        }

        /// head/maxp/hhea/hmtx/OS2, one empty glyph, no cmap/glyf — enough
        /// to exercise the table directory and required-table checks.
        pub fn minimal() -> SfntBuilder {
            SfntBuilder::new()
                .table(Tag::new(b'h', b'e', b'a', b'd'), head_table(1000, 0))
                .table(Tag::new(b'm', b'a', b'x', b'p'), maxp_table(1))
                .table(Tag::new(b'h', b'h', b'e', b'a'), hhea_table(800, -200, 0, 1))
                .table(Tag::new(b'h', b'm', b't', b'x'), hmtx_table(&[(500, 0)]))
                .table(Tag::new(b'O', b'S', b'/', b'2'), os2_table(400, 5, 0, 800, 200))
        }
    }

    pub fn head_table(units_per_em: u16, index_to_loc_format: i16) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&[0u8; 16]); // version, fontRevision, checkSumAdjustment
        v.extend_from_slice(&[0u8; 2]); // flags
        v.extend_from_slice(&units_per_em.to_be_bytes());
        v.extend_from_slice(&[0u8; 30]); // created, modified, bbox, styling hints
        v.extend_from_slice(&index_to_loc_format.to_be_bytes());
        v
    }

    pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        v.extend_from_slice(&num_glyphs.to_be_bytes());
        // the teacher's maxp struct reads the remaining ~26 bytes of the v1.0 table
        v.extend_from_slice(&[0u8; 26]);
        v
    }

    pub fn hhea_table(ascender: i16, descender: i16, line_gap: i16, metric_count: u16) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&[0u8; 4]); // version
        v.extend_from_slice(&ascender.to_be_bytes());
        v.extend_from_slice(&descender.to_be_bytes());
        v.extend_from_slice(&line_gap.to_be_bytes());
        v.extend_from_slice(&[0u8; 24]);
        v.extend_from_slice(&metric_count.to_be_bytes());
        v
    }

    pub fn hmtx_table(entries: &[(u16, i16)]) -> Vec<u8> {
        let mut v = Vec::new();
        for &(advance, lsb) in entries {
            v.extend_from_slice(&advance.to_be_bytes());
            v.extend_from_slice(&lsb.to_be_bytes());
        }
        v
    }

    pub fn os2_table(typo_ascender: i16, typo_descender: i16, typo_line_gap: i16, win_ascent: u16, win_descent: u16) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&[0u8; 4]);
        v.extend_from_slice(&400u16.to_be_bytes()); // weight
        v.extend_from_slice(&5u16.to_be_bytes()); // stretch
        v.extend_from_slice(&[0u8; 18]);
        v.extend_from_slice(&0u16.to_be_bytes()); // strikeout size
        v.extend_from_slice(&0u16.to_be_bytes()); // strikeout position
        v.extend_from_slice(&[0u8; 32]);
        v.extend_from_slice(&0x0040u16.to_be_bytes()); // fsSelection: regular
        v.extend_from_slice(&[0u8; 4]);
        v.extend_from_slice(&typo_ascender.to_be_bytes());
        v.extend_from_slice(&typo_descender.to_be_bytes());
        v.extend_from_slice(&typo_line_gap.to_be_bytes());
        v.extend_from_slice(&win_ascent.to_be_bytes());
        v.extend_from_slice(&win_descent.to_be_bytes());
        v.extend_from_slice(&[0u8; 8]);
        v.extend_from_slice(&0i16.to_be_bytes()); // x-height
        v.extend_from_slice(&0i16.to_be_bytes()); // cap-height
        v
    }
}
