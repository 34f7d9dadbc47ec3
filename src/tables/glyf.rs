//! `glyf` — glyph outline data (spec §4.4), grounded in the teacher's
//! `GlyphDescription::from_binary` (`truetype_loader/glyph_data_table.rs`)
//! but with corrected coordinate-delta decoding and full composite subglyph
//! parsing (the teacher read a composite's transform bytes and then
//! discarded them instead of recursing).

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::glyph::{Glyph, Point, PointKind, SubglyphArgs, SubglyphFlags, Subglyph, Transform2x2};
use crate::reader::Reader;

bitflags! {
    struct SimpleFlags: u8 {
        const ON_CURVE              = 0x01;
        const X_SHORT_VECTOR        = 0x02;
        const Y_SHORT_VECTOR        = 0x04;
        const REPEAT                = 0x08;
        const X_SAME_OR_POSITIVE    = 0x10;
        const Y_SAME_OR_POSITIVE    = 0x20;
        const OVERLAP_SIMPLE        = 0x40;
    }
}

bitflags! {
    struct ComponentFlags: u16 {
        const ARGS_ARE_WORDS          = 0x0001;
        const ARGS_ARE_XY_VALUES      = 0x0002;
        const ROUND_XY_TO_GRID        = 0x0004;
        const WE_HAVE_A_SCALE         = 0x0008;
        const MORE_COMPONENTS         = 0x0020;
        const WE_HAVE_XY_SCALE        = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO    = 0x0080;
        const WE_HAVE_INSTRUCTIONS    = 0x0100;
        const USE_MY_METRICS          = 0x0200;
        const OVERLAP_COMPOUND        = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// Parse a single glyph record from `glyf[offset..offset+length]`. Does not
/// recurse into composite subglyphs — the geometry composer resolves those
/// (spec §4.5).
pub fn parse_glyph(r: &mut Reader, offset: u32, length: u32) -> Result<Glyph> {
    if length == 0 {
        return Ok(Glyph::empty());
    }
    r.seek(offset as usize)?;
    let num_contours = r.i16()?;
    let x_min = r.i16()?;
    let y_min = r.i16()?;
    let x_max = r.i16()?;
    let y_max = r.i16()?;
    let bbox = (x_min, y_min, x_max, y_max);

    if (1..=256).contains(&num_contours) {
        parse_simple(r, num_contours as usize, bbox)
    } else if num_contours == -1 {
        parse_composite(r)
    } else {
        Err(Error::InvalidTable { tag: crate::tables::TAG_GLYF, reason: "contour count out of [-1, 256]" })
    }
}

fn parse_simple(r: &mut Reader, num_contours: usize, bbox: (i16, i16, i16, i16)) -> Result<Glyph> {
    let mut contour_ends = Vec::with_capacity(num_contours);
    for _ in 0..num_contours {
        contour_ends.push(r.u16()?);
    }
    if !contour_ends.windows(2).all(|w| w[0] < w[1]) {
        return Err(Error::InvalidTable { tag: crate::tables::TAG_GLYF, reason: "unordered contour endpoints" });
    }
    let num_points = contour_ends.last().map(|&e| e as usize + 1).unwrap_or(0);

    let instruction_length = r.u16()? as usize;
    let instructions = r.bytes(instruction_length)?.to_vec();

    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let f = SimpleFlags::from_bits_truncate(r.u8()?);
        flags.push(f);
        if f.contains(SimpleFlags::REPEAT) {
            let repeat_count = r.u8()?;
            for _ in 0..repeat_count {
                if flags.len() >= num_points {
                    break;
                }
                flags.push(f);
            }
        }
    }

    let mut xs = Vec::with_capacity(num_points);
    let mut x = 0i32;
    for f in &flags {
        let dx = if f.contains(SimpleFlags::X_SHORT_VECTOR) {
            let v = r.u8()? as i32;
            if f.contains(SimpleFlags::X_SAME_OR_POSITIVE) { v } else { -v }
        } else if f.contains(SimpleFlags::X_SAME_OR_POSITIVE) {
            0
        } else {
            r.i16()? as i32
        };
        x += dx;
        xs.push(x);
    }

    let mut ys = Vec::with_capacity(num_points);
    let mut y = 0i32;
    for f in &flags {
        let dy = if f.contains(SimpleFlags::Y_SHORT_VECTOR) {
            let v = r.u8()? as i32;
            if f.contains(SimpleFlags::Y_SAME_OR_POSITIVE) { v } else { -v }
        } else if f.contains(SimpleFlags::Y_SAME_OR_POSITIVE) {
            0
        } else {
            r.i16()? as i32
        };
        y += dy;
        ys.push(y);
    }

    let points = flags
        .iter()
        .zip(xs.iter().zip(ys.iter()))
        .map(|(f, (&px, &py))| {
            let kind = if f.contains(SimpleFlags::ON_CURVE) { PointKind::OnCurve } else { PointKind::OffCurveQuadratic };
            Point::new(px as f64, py as f64, kind)
        })
        .collect();

    Ok(Glyph::Simple { points, contour_ends, instructions, bbox })
}

fn parse_composite(r: &mut Reader) -> Result<Glyph> {
    let mut subglyphs = Vec::new();
    let mut has_instructions = false;
    loop {
        let flags = ComponentFlags::from_bits_truncate(r.u16()?);
        let glyph_index = r.u16()?;

        let (arg1, arg2) = if flags.contains(ComponentFlags::ARGS_ARE_WORDS) {
            (r.i16()? as i32, r.i16()? as i32)
        } else {
            (r.i8()? as i32, r.i8()? as i32)
        };

        let transform = if flags.contains(ComponentFlags::WE_HAVE_A_TWO_BY_TWO) {
            let xx = r.i16()?;
            let xy = r.i16()?;
            let yx = r.i16()?;
            let yy = r.i16()?;
            Transform2x2 {
                xx: f2dot14(xx),
                xy: f2dot14(xy),
                yx: f2dot14(yx),
                yy: f2dot14(yy),
            }
        } else if flags.contains(ComponentFlags::WE_HAVE_XY_SCALE) {
            let sx = r.i16()?;
            let sy = r.i16()?;
            Transform2x2 { xx: f2dot14(sx), xy: 0.0, yx: 0.0, yy: f2dot14(sy) }
        } else if flags.contains(ComponentFlags::WE_HAVE_A_SCALE) {
            let s = r.i16()?;
            Transform2x2::uniform_scale(f2dot14(s))
        } else {
            Transform2x2::IDENTITY
        };

        if flags.contains(ComponentFlags::WE_HAVE_INSTRUCTIONS) {
            has_instructions = true;
        }

        subglyphs.push(Subglyph {
            glyph_index,
            args: SubglyphArgs { arg1, arg2 },
            transform,
            flags: SubglyphFlags {
                args_are_xy_values: flags.contains(ComponentFlags::ARGS_ARE_XY_VALUES),
                round_xy_to_grid: flags.contains(ComponentFlags::ROUND_XY_TO_GRID),
                scaled_component_offset: flags.contains(ComponentFlags::SCALED_COMPONENT_OFFSET),
                unscaled_component_offset: flags.contains(ComponentFlags::UNSCALED_COMPONENT_OFFSET),
                use_my_metrics: flags.contains(ComponentFlags::USE_MY_METRICS),
            },
        });

        if !flags.contains(ComponentFlags::MORE_COMPONENTS) {
            break;
        }
    }

    let instructions = if has_instructions {
        let len = r.u16()? as usize;
        r.bytes(len)?.to_vec()
    } else {
        Vec::new()
    };

    Ok(Glyph::Composite { subglyphs, instructions })
}

fn f2dot14(raw: i16) -> f64 {
    raw as f64 / 16384.0
}
