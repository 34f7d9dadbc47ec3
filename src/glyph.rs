//! Glyph data model (spec §3): the tagged `Glyph` variant, `Point`, and the
//! composite subglyph record. Grounded in the teacher's `GlyphDescription`
//! (`truetype_loader/glyph_data_table.rs`), generalized per DESIGN.md.

/// What a decomposed outline point represents. Cubic points are retained so
/// that the rasterizer can recognize and reject them (spec §9 open question).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointKind {
    OnCurve,
    OffCurveQuadratic,
    OffCurveCubic,
}

/// A point in either font units (straight out of `glyf`) or pixel-space
/// subpixel fixed point (after the geometry composer has scaled it).
#[derive(Copy, Clone, Debug)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub kind: PointKind,
}

impl Point {
    pub fn new(x: f64, y: f64, kind: PointKind) -> Point {
        Point { x, y, kind }
    }

    pub fn on_curve(x: f64, y: f64) -> Point {
        Point::new(x, y, PointKind::OnCurve)
    }

    pub fn is_on_curve(&self) -> bool {
        self.kind == PointKind::OnCurve
    }
}

/// A 2x2 transform plus translation, composed through subglyph recursion
/// (spec §4.5). Stored as plain `f64`s: the spec's note on projection math
/// ("Converting unit vectors to floats once ... simplifies the state
/// machine") applies equally well here, and the teacher's
/// `ComponentGlyphDescription::transform` already stored 2.14 values that
/// get converted to float before first use.
#[derive(Copy, Clone, Debug)]
pub struct Transform2x2 {
    pub xx: f64,
    pub xy: f64,
    pub yx: f64,
    pub yy: f64,
}

impl Transform2x2 {
    pub const IDENTITY: Transform2x2 = Transform2x2 { xx: 1.0, xy: 0.0, yx: 0.0, yy: 1.0 };

    /// Apply as a direction (no translation) — used throughout spec §4.5.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.xx * x + self.yx * y, self.xy * x + self.yy * y)
    }

    /// `local = outer x subglyph.transform` (spec §4.5 step 1): compose as
    /// 2x2 matrix multiplication, outer applied after subglyph.
    pub fn compose(outer: &Transform2x2, inner: &Transform2x2) -> Transform2x2 {
        Transform2x2 {
            xx: outer.xx * inner.xx + outer.yx * inner.xy,
            xy: outer.xy * inner.xx + outer.yy * inner.xy,
            yx: outer.xx * inner.yx + outer.yx * inner.yy,
            yy: outer.xy * inner.yx + outer.yy * inner.yy,
        }
    }

    pub fn uniform_scale(s: f64) -> Transform2x2 {
        Transform2x2 { xx: s, xy: 0.0, yx: 0.0, yy: s }
    }
}

/// How a composite subglyph's two arguments should be interpreted, and how
/// its transform was encoded (spec §4.4).
#[derive(Copy, Clone, Debug, Default)]
pub struct SubglyphFlags {
    pub args_are_xy_values: bool,
    pub round_xy_to_grid: bool,
    pub scaled_component_offset: bool,
    pub unscaled_component_offset: bool,
    pub use_my_metrics: bool,
}

#[derive(Copy, Clone, Debug)]
pub struct SubglyphArgs {
    pub arg1: i32,
    pub arg2: i32,
}

#[derive(Clone, Debug)]
pub struct Subglyph {
    pub glyph_index: u16,
    pub args: SubglyphArgs,
    pub transform: Transform2x2,
    pub flags: SubglyphFlags,
}

/// A tagged glyph variant (spec §9 design note: algebraic enum, not a class
/// hierarchy), matching the teacher's `GlyphDescription` shape but with
/// correct composite support and no placeholder `None` arm — an empty glyph
/// is represented as `Simple` with zero points (spec §4.4).
#[derive(Clone, Debug)]
pub enum Glyph {
    Simple {
        points: Vec<Point>,
        contour_ends: Vec<u16>,
        instructions: Vec<u8>,
        bbox: (i16, i16, i16, i16),
    },
    Composite {
        subglyphs: Vec<Subglyph>,
        instructions: Vec<u8>,
    },
}

impl Glyph {
    pub fn instructions(&self) -> &[u8] {
        match self {
            Glyph::Simple { instructions, .. } => instructions,
            Glyph::Composite { instructions, .. } => instructions,
        }
    }

    pub fn empty() -> Glyph {
        Glyph::Simple { points: Vec::new(), contour_ends: Vec::new(), instructions: Vec::new(), bbox: (0, 0, 0, 0) }
    }
}
