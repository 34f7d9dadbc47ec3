//! AGG-style analytic antialiased rasterizer (spec §4.8) and contour
//! decomposition (spec §4.9). No teacher counterpart exists — the teacher
//! never rendered anything — so this module is grounded directly on
//! spec.md's own cell/scanline algorithm description (itself a restatement
//! of the classic signed-area coverage rasterizer), written in this
//! crate's style: `Result`-returning where fallible, plain structs with
//! `F24Dot8`-typed public entry points elsewhere.

use crate::error::{Error, Result};
use crate::glyph::{Point, PointKind};
use crate::numerics::{divmod, F24Dot8};

const ONE_PIXEL: i32 = 256;

#[derive(Copy, Clone, Debug)]
struct Cell {
    x: i32,
    area: i64,
    cover: i64,
    next: i32,
}

/// Cell-based coverage accumulator for one glyph render (spec §4.8). Reused
/// across renders on the same face; `reset` clears the cell buffer without
/// releasing its capacity.
pub struct Rasterizer {
    cells: Vec<Cell>,
    scanlines: Vec<i32>,
    x_min: i32,
    y_min: i32,
    width: i32,

    cur_x: i32,
    cur_y: i32,
    start_x: i32,
    start_y: i32,

    active_ex: i32,
    active_ey: i32,
    active_area: i64,
    active_cover: i64,
    has_active: bool,
}

impl Rasterizer {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Rasterizer {
        let width = (x_max - x_min).max(0);
        let height = (y_max - y_min).max(0);
        Rasterizer {
            cells: Vec::new(),
            scanlines: vec![-1; height as usize],
            x_min,
            y_min,
            width,
            cur_x: 0,
            cur_y: 0,
            start_x: 0,
            start_y: 0,
            active_ex: 0,
            active_ey: 0,
            active_area: 0,
            active_cover: 0,
            has_active: false,
        }
    }

    pub fn reset(&mut self) {
        self.cells.clear();
        for s in self.scanlines.iter_mut() {
            *s = -1;
        }
        self.has_active = false;
    }

    pub fn move_to(&mut self, x: F24Dot8, y: F24Dot8) {
        self.finish();
        self.cur_x = x.0;
        self.cur_y = y.0;
        self.start_x = x.0;
        self.start_y = y.0;
    }

    /// Close the current contour back to its start point (spec §4.9: "If
    /// the loop ends without closing via a curve, emit LineTo(start)").
    pub fn close(&mut self) {
        self.line_to(F24Dot8(self.start_x), F24Dot8(self.start_y));
    }

    fn set_cell(&mut self, ex: i32, ey: i32) {
        if !self.has_active || ex != self.active_ex || ey != self.active_ey {
            self.record_cell();
            self.active_ex = ex;
            self.active_ey = ey;
            self.active_area = 0;
            self.active_cover = 0;
            self.has_active = true;
        }
    }

    fn record_cell(&mut self) {
        if self.has_active && (self.active_area != 0 || self.active_cover != 0) {
            self.add_cell(self.active_ex, self.active_ey, self.active_area, self.active_cover);
        }
    }

    fn finish(&mut self) {
        self.record_cell();
        self.has_active = false;
    }

    fn add_cell(&mut self, x: i32, y: i32, area: i64, cover: i64) {
        let row = y - self.y_min;
        if row < 0 || row as usize >= self.scanlines.len() {
            return;
        }
        let row = row as usize;
        let mut idx = self.scanlines[row];
        let mut prev: i32 = -1;
        while idx != -1 {
            let cell_x = self.cells[idx as usize].x;
            if cell_x == x {
                self.cells[idx as usize].area += area;
                self.cells[idx as usize].cover += cover;
                return;
            }
            if cell_x > x {
                break;
            }
            prev = idx;
            idx = self.cells[idx as usize].next;
        }
        let new_idx = self.cells.len() as i32;
        self.cells.push(Cell { x, area, cover, next: idx });
        if prev == -1 {
            self.scanlines[row] = new_idx;
        } else {
            self.cells[prev as usize].next = new_idx;
        }
    }

    /// Distribute area/coverage for a segment confined to one scanline row
    /// `ey`, from `(x1, fy1)` to `(x2, fy2)` (subpixel x, fractional y in
    /// `0..=256`), stepping across whichever pixel columns it crosses.
    fn render_scanline(&mut self, ey: i32, x1: i32, fy1: i32, x2: i32, fy2: i32) {
        let ex1 = x1 >> 8;
        let ex2 = x2 >> 8;
        let fx1 = x1 & 0xFF;
        let fx2 = x2 & 0xFF;
        let dy = (fy2 - fy1) as i64;

        self.set_cell(ex1, ey);

        if ex1 == ex2 {
            self.active_area += (fx1 + fx2) as i64 * dy;
            self.active_cover += dy;
            return;
        }

        let dx = x2 - x1;
        let (first, incr) = if dx > 0 { (ONE_PIXEL, 1) } else { (0, -1) };
        let dx_abs = dx.unsigned_abs() as i64;
        let p0 = (first - fx1) as i64 * dy;
        let (mut delta, mut rem) = divmod(p0, dx_abs);

        self.active_area += (fx1 + first) as i64 * delta;
        self.active_cover += delta;

        let mut ex = ex1 + incr;
        self.set_cell(ex, ey);
        let mut y = fy1 as i64 + delta;

        if ex != ex2 {
            let p_full = ONE_PIXEL as i64 * dy;
            let (lift, rem_full) = divmod(p_full, dx_abs);
            rem -= dx_abs;
            loop {
                delta = lift;
                rem += rem_full;
                if rem >= 0 {
                    rem -= dx_abs;
                    delta += 1;
                }
                self.active_area += ONE_PIXEL as i64 * delta;
                self.active_cover += delta;
                y += delta;
                ex += incr;
                self.set_cell(ex, ey);
                if ex == ex2 {
                    break;
                }
            }
        }

        let dy_last = fy2 as i64 - y;
        self.active_area += (fx2 + ONE_PIXEL - first) as i64 * dy_last;
        self.active_cover += dy_last;
    }

    /// Render a signed run of scanlines from the current point to `(x, y)`
    /// (spec §4.8 LineTo): horizontal, vertical, and general cases.
    pub fn line_to(&mut self, x: F24Dot8, y: F24Dot8) {
        let x2 = x.0;
        let y2 = y.0;
        let x1 = self.cur_x;
        let y1 = self.cur_y;

        let ey1 = y1 >> 8;
        let ey2 = y2 >> 8;
        let fy1 = y1 & 0xFF;
        let fy2 = y2 & 0xFF;

        if ey1 == ey2 {
            self.render_scanline(ey1, x1, fy1, x2, fy2);
            self.cur_x = x2;
            self.cur_y = y2;
            return;
        }

        let dx = x2 - x1;
        let dy = y2 - y1;

        if dx == 0 {
            let ex = x1 >> 8;
            let two_fx = (x1 & 0xFF) as i64 * 2;
            let incr = if dy > 0 { 1 } else { -1 };
            let first = if dy > 0 { ONE_PIXEL } else { 0 };

            self.set_cell(ex, ey1);
            let mut delta = (first - fy1) as i64;
            self.active_area += two_fx * delta;
            self.active_cover += delta;

            let mut ey = ey1 + incr;
            self.set_cell(ex, ey);
            delta = (first + first - ONE_PIXEL) as i64;
            let area_step = two_fx * delta;
            while ey != ey2 {
                self.active_area += area_step;
                self.active_cover += delta;
                ey += incr;
                self.set_cell(ex, ey);
            }
            delta = fy2 as i64 - ONE_PIXEL as i64 + first as i64;
            self.active_area += two_fx * delta;
            self.active_cover += delta;

            self.cur_x = x2;
            self.cur_y = y2;
            return;
        }

        let (p, first, incr): (i64, i32, i32) = if dy > 0 {
            ((ONE_PIXEL - fy1) as i64 * dx as i64, ONE_PIXEL, 1)
        } else {
            (fy1 as i64 * dx as i64, 0, -1)
        };
        let dy_abs = dy.unsigned_abs() as i64;
        let (delta0, mut rem) = divmod(p, dy_abs);

        let mut xm = x1 + delta0 as i32;
        self.render_scanline(ey1, x1, fy1, xm, first);

        let mut ey = ey1 + incr;
        self.set_cell(xm >> 8, ey);

        if ey != ey2 {
            let p_full = ONE_PIXEL as i64 * dx as i64;
            let (lift, rem_full) = divmod(p_full, dy_abs);
            rem -= dy_abs;
            loop {
                let mut delta = lift;
                rem += rem_full;
                if rem >= 0 {
                    rem -= dy_abs;
                    delta += 1;
                }
                let x_next = xm + delta as i32;
                self.render_scanline(ey, xm, ONE_PIXEL - first, x_next, first);
                xm = x_next;
                ey += incr;
                self.set_cell(xm >> 8, ey);
                if ey == ey2 {
                    break;
                }
            }
        }

        self.render_scanline(ey2, xm, ONE_PIXEL - first, x2, fy2);

        self.cur_x = x2;
        self.cur_y = y2;
    }

    /// Tessellate a quadratic Bézier by recursive midpoint subdivision
    /// (spec §4.8 QuadraticCurveTo).
    pub fn quadratic_curve_to(&mut self, cx: F24Dot8, cy: F24Dot8, x: F24Dot8, y: F24Dot8) {
        let (ax, ay) = (self.cur_x, self.cur_y);
        let (bx, by) = (cx.0, cy.0);
        let (ex, ey) = (x.0, y.0);
        let level = Self::subdivision_level(ax, ay, bx, by, ex, ey);
        self.subdivide_quad(ax, ay, bx, by, ex, ey, level);
    }

    fn subdivision_level(ax: i32, ay: i32, bx: i32, by: i32, cx: i32, cy: i32) -> u32 {
        let mut dx = (ax + cx - 2 * bx).abs().max((ay + cy - 2 * by).abs());
        let mut level = 0u32;
        while dx > 64 {
            dx >>= 2;
            level += 1;
        }
        level
    }

    fn subdivide_quad(&mut self, ax: i32, ay: i32, bx: i32, by: i32, cx: i32, cy: i32, level: u32) {
        if level == 0 {
            self.line_to(F24Dot8(cx), F24Dot8(cy));
            return;
        }
        let abx = (ax + bx) / 2;
        let aby = (ay + by) / 2;
        let bcx = (bx + cx) / 2;
        let bcy = (by + cy) / 2;
        let midx = (abx + bcx) / 2;
        let midy = (aby + bcy) / 2;
        self.subdivide_quad(ax, ay, abx, aby, midx, midy, level - 1);
        self.subdivide_quad(midx, midy, bcx, bcy, cx, cy, level - 1);
    }

    /// Walk the sorted cell chain of every row, filling gaps with the
    /// running coverage and each cell's column with its trapezoidal wedge
    /// (spec §4.8 BlitTo), then writing through the non-zero winding rule.
    pub fn blit_to(&mut self, surface: &mut Surface) {
        self.finish();
        for row in 0..self.scanlines.len() {
            let y = self.y_min + row as i32;
            let mut cover: i64 = 0;
            let mut x = self.x_min;
            let mut idx = self.scanlines[row];
            while idx != -1 {
                let cell = self.cells[idx as usize];
                if cell.x > x {
                    if cover != 0 {
                        let value = Self::cover_to_byte(cover * 512);
                        for px in x..cell.x {
                            surface.set_pixel(px, y, value);
                        }
                    }
                    x = cell.x;
                }
                cover += cell.cover;
                let value = Self::cover_to_byte(cover * 512 - cell.area);
                surface.set_pixel(x, y, value);
                x += 1;
                idx = cell.next;
            }
            if cover != 0 {
                let value = Self::cover_to_byte(cover * 512);
                for px in x..self.x_min + self.width {
                    surface.set_pixel(px, y, value);
                }
            }
        }
    }

    fn cover_to_byte(v: i64) -> u8 {
        (v >> 9).unsigned_abs().min(255) as u8
    }
}

/// A caller-owned render target (spec §6): `pitch` is bytes per row and may
/// be negative for top-down storage (spec §9 open question — resolved here
/// by treating `y == 0` as the bottom row when `pitch >= 0` and as the row
/// addressed first in memory when `pitch < 0`).
pub struct Surface<'a> {
    pub bits: &'a mut [u8],
    pub width: i32,
    pub height: i32,
    pub pitch: i32,
}

impl<'a> Surface<'a> {
    pub fn new(bits: &'a mut [u8], width: i32, height: i32, pitch: i32) -> Surface<'a> {
        Surface { bits, width, height, pitch }
    }

    fn row_start(&self, y: i32) -> isize {
        if self.pitch >= 0 {
            (self.height as isize - 1 - y as isize) * self.pitch as isize
        } else {
            -(y as isize) * self.pitch as isize
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return;
        }
        let idx = self.row_start(y) + x as isize;
        if idx >= 0 {
            if let Some(slot) = self.bits.get_mut(idx as usize) {
                *slot = value;
            }
        }
    }
}

/// Decompose one contour (`points[start..=end]`) into rasterizer commands
/// (spec §4.9).
fn decompose_contour(points: &[Point], start: usize, end: usize, raster: &mut Rasterizer) -> Result<()> {
    if end < start {
        return Ok(());
    }
    if points[start].kind == PointKind::OffCurveCubic {
        return Err(Error::UnsupportedFeature { reason: "cubic point encountered during rasterization" });
    }

    let (start_x, start_y, remaining): (f64, f64, Vec<Point>) = if points[start].is_on_curve() {
        (points[start].x, points[start].y, points[start + 1..=end].to_vec())
    } else if points[end].is_on_curve() {
        (points[end].x, points[end].y, points[start..end].to_vec())
    } else {
        (
            (points[start].x + points[end].x) / 2.0,
            (points[start].y + points[end].y) / 2.0,
            points[start..=end].to_vec(),
        )
    };

    raster.move_to(F24Dot8::from_f64(start_x), F24Dot8::from_f64(start_y));

    let mut pending: Option<Point> = None;
    for p in &remaining {
        if p.kind == PointKind::OffCurveCubic {
            return Err(Error::UnsupportedFeature { reason: "cubic point encountered during rasterization" });
        }
        if p.is_on_curve() {
            match pending.take() {
                Some(ctrl) => raster.quadratic_curve_to(
                    F24Dot8::from_f64(ctrl.x),
                    F24Dot8::from_f64(ctrl.y),
                    F24Dot8::from_f64(p.x),
                    F24Dot8::from_f64(p.y),
                ),
                None => raster.line_to(F24Dot8::from_f64(p.x), F24Dot8::from_f64(p.y)),
            }
        } else {
            match pending.take() {
                Some(ctrl) => {
                    let mid_x = (ctrl.x + p.x) / 2.0;
                    let mid_y = (ctrl.y + p.y) / 2.0;
                    raster.quadratic_curve_to(
                        F24Dot8::from_f64(ctrl.x),
                        F24Dot8::from_f64(ctrl.y),
                        F24Dot8::from_f64(mid_x),
                        F24Dot8::from_f64(mid_y),
                    );
                    pending = Some(*p);
                }
                None => pending = Some(*p),
            }
        }
    }

    match pending {
        Some(ctrl) => raster.quadratic_curve_to(
            F24Dot8::from_f64(ctrl.x),
            F24Dot8::from_f64(ctrl.y),
            F24Dot8::from_f64(start_x),
            F24Dot8::from_f64(start_y),
        ),
        None => raster.line_to(F24Dot8::from_f64(start_x), F24Dot8::from_f64(start_y)),
    }
    Ok(())
}

/// Walk every contour of a composed outline through `decompose_contour`.
pub fn decompose_outline(points: &[Point], contour_ends: &[u16], raster: &mut Rasterizer) -> Result<()> {
    let mut start = 0usize;
    for &end in contour_ends {
        let end = end as usize;
        if end >= start {
            decompose_contour(points, start, end, raster)?;
        }
        start = end + 1;
    }
    Ok(())
}
