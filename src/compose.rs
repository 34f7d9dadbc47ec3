//! Geometry composer (spec §4.5) and phantom-point synthesis (spec §4.6).
//!
//! No teacher counterpart exists for this module: the teacher's
//! `GlyphDescription` parser read composite transform bytes but never
//! composed or recursed into subglyphs. Grounded directly on spec.md's own
//! algorithm description, written in the teacher's error-propagation style
//! (`Result`-returning, `?`-chained).

use crate::error::{Error, Result};
use crate::glyph::{Glyph, Point, Transform2x2};
use crate::tables::glyf;
use crate::tables::hhea::HheaTable;
use crate::tables::hmtx::MetricsTable;
use crate::tables::loca::LocaTable;
use crate::tables::os2::Os2Table;
use crate::reader::Reader;

const MAX_COMPOSITE_DEPTH: u32 = 128;

/// A fully-composed outline: caller-space points plus per-contour endpoint
/// indices, ready for phantom-point append and interpreter hinting.
#[derive(Clone, Debug, Default)]
pub struct ComposedOutline {
    pub points: Vec<Point>,
    pub contour_ends: Vec<u16>,
}

/// Recursively resolve `glyph_index` under `outer` into `out`, per spec §4.5.
/// `glyf_data`/`loca` locate each subglyph's record; `depth` bounds recursion.
pub fn compose_glyph(
    glyf_data: &[u8],
    loca: &LocaTable,
    glyph_index: u16,
    outer: &Transform2x2,
    depth: u32,
    out: &mut ComposedOutline,
) -> Result<()> {
    if depth > MAX_COMPOSITE_DEPTH {
        return Err(Error::InvalidTable {
            tag: crate::tables::TAG_GLYF,
            reason: "composite recursion depth exceeds 128",
        });
    }

    let glyph = load_one(glyf_data, loca, glyph_index)?;
    match glyph {
        Glyph::Simple { points, contour_ends, .. } => {
            let start_index = out.points.len() as u16;
            for p in &points {
                let (x, y) = outer.apply(p.x, p.y);
                out.points.push(Point::new(x, y, p.kind));
            }
            for end in contour_ends {
                out.contour_ends.push(end + start_index);
            }
        }
        Glyph::Composite { subglyphs, .. } => {
            for sub in &subglyphs {
                let has_scale = sub.transform.xx != 1.0
                    || sub.transform.xy != 0.0
                    || sub.transform.yx != 0.0
                    || sub.transform.yy != 1.0;
                let local = if has_scale {
                    Transform2x2::compose(outer, &sub.transform)
                } else {
                    *outer
                };

                let start_index = out.points.len() as u16;
                compose_glyph(glyf_data, loca, sub.glyph_index, &local, depth + 1, out)?;
                let points_added = out.points.len() as u16 - start_index;

                let (offset_x, offset_y) = if sub.flags.args_are_xy_values {
                    let dx = sub.args.arg1 as f64;
                    let dy = sub.args.arg2 as f64;
                    let transform_to_use = if sub.flags.scaled_component_offset && has_scale { &local } else { outer };
                    let (mut ox, mut oy) = transform_to_use.apply(dx, dy);
                    if sub.flags.round_xy_to_grid {
                        ox = ox.round();
                        oy = oy.round();
                    }
                    (ox, oy)
                } else {
                    // Point-matching offsets: arg1 indexes the base outline
                    // built so far, arg2 indexes the newly-appended points.
                    let base_idx = sub.args.arg1 as usize;
                    let new_idx = start_index as usize + sub.args.arg2 as usize;
                    let base_pt = out.points.get(base_idx).copied();
                    let new_pt = out.points.get(new_idx).copied();
                    match (base_pt, new_pt) {
                        (Some(b), Some(n)) => (b.x - n.x, b.y - n.y),
                        _ => (0.0, 0.0),
                    }
                };

                for p in out.points[start_index as usize..start_index as usize + points_added as usize].iter_mut() {
                    p.x += offset_x;
                    p.y += offset_y;
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn load_one(glyf_data: &[u8], loca: &LocaTable, glyph_index: u16) -> Result<Glyph> {
    match loca.glyph_range(glyph_index) {
        None => Ok(Glyph::empty()),
        Some((offset, length)) => {
            let mut r = Reader::new(glyf_data);
            glyf::parse_glyph(&mut r, offset, length)
        }
    }
}

/// Horizontal/vertical side-bearing and advance, resolved per-glyph (spec §4.6).
pub struct PhantomMetrics {
    pub h_front_side_bearing: f64,
    pub h_advance: f64,
    pub v_front_side_bearing: f64,
    pub v_advance: f64,
}

/// Resolve the four metrics phantom points need, synthesizing the vertical
/// metric from `OS/2` typographic ascender/descender when `vmtx` is absent.
pub fn resolve_phantom_metrics(
    glyph_index: u16,
    hmtx: &MetricsTable,
    vmtx: Option<(&HheaTable, &MetricsTable)>,
    os2: &Os2Table,
    max_y: f64,
) -> PhantomMetrics {
    let h = hmtx.get(glyph_index);
    let (v_front_side_bearing, v_advance) = match vmtx {
        Some((_, vmetrics)) => {
            let m = vmetrics.get(glyph_index);
            (m.side_bearing as f64, m.advance as f64)
        }
        None => (
            os2.typo_ascender as f64 - max_y,
            (os2.typo_ascender as f64) - (os2.typo_descender as f64),
        ),
    };
    PhantomMetrics {
        h_front_side_bearing: h.side_bearing as f64,
        h_advance: h.advance as f64,
        v_front_side_bearing,
        v_advance,
    }
}

/// Append the four phantom points (spec §4.6) to a composed outline, already
/// in the same pixel-space scale as `outline`'s points. `min_x`/`max_y` are
/// the composed outline's own (unscaled) bounding extents, pre-scale.
pub fn append_phantom_points(outline: &mut ComposedOutline, metrics: &PhantomMetrics, min_x: f64, max_y: f64, scale: f64) {
    let pp1_x = (min_x - metrics.h_front_side_bearing) * scale;
    let pp2_x = pp1_x + metrics.h_advance * scale;
    let pp3_y = (max_y + metrics.v_front_side_bearing) * scale;
    let pp4_y = pp3_y - metrics.v_advance * scale;

    outline.points.push(Point::on_curve(pp1_x, 0.0));
    outline.points.push(Point::on_curve(pp2_x, 0.0));
    outline.points.push(Point::on_curve(0.0, pp3_y));
    outline.points.push(Point::on_curve(0.0, pp4_y));
}
