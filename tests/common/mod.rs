//! Synthetic in-memory SFNT construction shared by the integration tests.
//!
//! Integration tests link against the compiled (non-`#[cfg(test)]`) crate,
//! so `src/testutil.rs`'s builder isn't reachable from here; this mirrors
//! its table layouts independently, the same way the teacher's own tests
//! built fixtures per test binary rather than sharing a crate-internal
//! helper.

#![allow(dead_code)]

use grid_fit::error::Tag;

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
        out.extend_from_slice(&[0u8; 6]);

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
            out.extend_from_slice(&0u32.to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&length.to_be_bytes());
        }
        out.extend_from_slice(&body);
        out
    }
}

pub fn head_table(units_per_em: u16, index_to_loc_format: i16) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&[0u8; 16]);
    v.extend_from_slice(&[0u8; 2]); // flags
    v.extend_from_slice(&units_per_em.to_be_bytes());
    v.extend_from_slice(&[0u8; 30]);
    v.extend_from_slice(&index_to_loc_format.to_be_bytes());
    v
}

pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    v.extend_from_slice(&num_glyphs.to_be_bytes());
    v.extend_from_slice(&[0u8; 26]);
    v
}

pub fn hhea_table(ascender: i16, descender: i16, line_gap: i16, metric_count: u16) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&[0u8; 4]);
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
    v.extend_from_slice(&400u16.to_be_bytes());
    v.extend_from_slice(&5u16.to_be_bytes());
    v.extend_from_slice(&[0u8; 18]);
    v.extend_from_slice(&0u16.to_be_bytes());
    v.extend_from_slice(&0u16.to_be_bytes());
    v.extend_from_slice(&[0u8; 32]);
    v.extend_from_slice(&0x0040u16.to_be_bytes()); // fsSelection: regular
    v.extend_from_slice(&[0u8; 4]);
    v.extend_from_slice(&typo_ascender.to_be_bytes());
    v.extend_from_slice(&typo_descender.to_be_bytes());
    v.extend_from_slice(&typo_line_gap.to_be_bytes());
    v.extend_from_slice(&win_ascent.to_be_bytes());
    v.extend_from_slice(&win_descent.to_be_bytes());
    v.extend_from_slice(&[0u8; 8]);
    v.extend_from_slice(&0i16.to_be_bytes());
    v.extend_from_slice(&0i16.to_be_bytes());
    v
}

/// A single-contour right triangle glyph, on-curve points only, at
/// `(0,0)`, `(side,0)`, `(side,side)` in font units.
pub fn triangle_glyph_bytes(side: i16) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&1i16.to_be_bytes()); // numberOfContours
    data.extend_from_slice(&0i16.to_be_bytes());
    data.extend_from_slice(&0i16.to_be_bytes());
    data.extend_from_slice(&side.to_be_bytes());
    data.extend_from_slice(&side.to_be_bytes());
    data.extend_from_slice(&2u16.to_be_bytes()); // endPtsOfContours[0]
    data.extend_from_slice(&0u16.to_be_bytes()); // instructionLength
    let flag = 0x01 | 0x02 | 0x04 | 0x10 | 0x20u8; // on-curve, short x/y, positive x/y
    data.extend_from_slice(&[flag, flag, flag]);
    let delta = side as u8;
    data.extend_from_slice(&[0u8, delta, 0]); // x deltas: 0, +side, 0
    data.extend_from_slice(&[0u8, 0, delta]); // y deltas: 0, 0, +side
    data
}

/// Format-0 `cmap` table mapping each `(char, glyph)` pair given; all other
/// code points below 256 resolve to glyph 0.
pub fn format0_cmap(mappings: &[(u8, u8)]) -> Vec<u8> {
    let mut glyph_ids = [0u8; 256];
    for &(ch, gid) in mappings {
        glyph_ids[ch as usize] = gid;
    }
    let mut data = Vec::new();
    data.extend_from_slice(&0u16.to_be_bytes()); // cmap version
    data.extend_from_slice(&1u16.to_be_bytes()); // num tables
    data.extend_from_slice(&3u16.to_be_bytes()); // platform 3 (Microsoft)
    data.extend_from_slice(&1u16.to_be_bytes()); // encoding 1 (Unicode BMP)
    let sub_offset = 4 + 8;
    data.extend_from_slice(&(sub_offset as u32).to_be_bytes());
    data.extend_from_slice(&0u16.to_be_bytes()); // format
    data.extend_from_slice(&262u16.to_be_bytes()); // length
    data.extend_from_slice(&0u16.to_be_bytes()); // language
    data.extend_from_slice(&glyph_ids);
    data
}

/// Long-format `loca`: raw offsets, one per glyph plus a trailing total length.
pub fn long_loca(offsets: &[u32]) -> Vec<u8> {
    let mut v = Vec::new();
    for &o in offsets {
        v.extend_from_slice(&o.to_be_bytes());
    }
    v
}

/// A minimal two-glyph font: glyph 0 is an empty `.notdef`, glyph 1 is a
/// `side`-FUnit right triangle mapped from `'A'`. `units_per_em` and the
/// hhea/OS2 vertical extents are caller-supplied so tests can exercise
/// different scales.
pub fn two_glyph_font(units_per_em: u16, side: i16, advance: u16) -> Vec<u8> {
    let triangle = triangle_glyph_bytes(side);
    let loca = long_loca(&[0, 0, triangle.len() as u32]);
    let cmap = format0_cmap(&[(b'A', 1)]);

    SfntBuilder::new()
        .table(Tag::new(b'h', b'e', b'a', b'd'), head_table(units_per_em, 1))
        .table(Tag::new(b'm', b'a', b'x', b'p'), maxp_table(2))
        .table(Tag::new(b'h', b'h', b'e', b'a'), hhea_table(side * 2, -(side / 2), 0, 2))
        .table(Tag::new(b'h', b'm', b't', b'x'), hmtx_table(&[(0, 0), (advance, 0)]))
        .table(Tag::new(b'O', b'S', b'/', b'2'), os2_table(side * 2, -(side / 2), 0, (side * 2) as u16, (side / 2) as u16))
        .table(Tag::new(b'g', b'l', b'y', b'f'), triangle)
        .table(Tag::new(b'l', b'o', b'c', b'a'), loca)
        .table(Tag::new(b'c', b'm', b'a', b'p'), cmap)
        .build()
}
