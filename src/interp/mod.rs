//! TrueType bytecode interpreter (spec §4.7), grounded in the teacher's
//! `InstructedGlyphScaler::scale_glyph` (`interp_instructor.rs`) — the same
//! giant opcode match, generalized from the teacher's ~60 stub arms (most
//! were empty `{ /* OPNAME */ }` comments) into full implementations of
//! every instruction class spec.md names, with real IF/ELSE/EIF control
//! flow and FDEF/CALL/LOOPCALL instead of the teacher's no-ops. Opcodes
//! outside the classes spec.md describes (MDAP, MDRP, IUP, SHC, SHZ,
//! MSIRP, ALIGNRP/ALIGNPTS, ISECT, UTP, IDEF, DELTA*) are deliberately
//! left as `InvalidBytecode("unknown opcode")`, matching §7's error design.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::numerics::F26Dot6;

const MAX_CALL_DEPTH: u32 = 128;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const X_AXIS: Vector = Vector { x: 1.0, y: 0.0 };
    pub const Y_AXIS: Vector = Vector { x: 0.0, y: 1.0 };

    pub fn normalize(x: f64, y: f64) -> Vector {
        let len = (x * x + y * y).sqrt();
        if len < 1e-9 {
            Vector::X_AXIS
        } else {
            Vector { x: x / len, y: y / len }
        }
    }

    pub fn dot(&self, dx: f64, dy: f64) -> f64 {
        self.x * dx + self.y * dy
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RoundMode {
    ToGrid,
    ToHalfGrid,
    ToDoubleGrid,
    DownToGrid,
    UpToGrid,
    Off,
    Super { period: f64, phase: f64, threshold: f64 },
}

impl RoundMode {
    fn decode_super(byte: u8, diagonal: bool) -> RoundMode {
        let base = if diagonal { std::f64::consts::FRAC_1_SQRT_2 } else { 1.0 };
        let period = match (byte >> 6) & 0x3 {
            0 => 0.5,
            1 => 1.0,
            2 => 2.0,
            _ => 1.0,
        } * base;
        let phase = match (byte >> 4) & 0x3 {
            0 => 0.0,
            1 => 0.25,
            2 => 0.5,
            _ => 0.75,
        } * period;
        let threshold_bits = (byte & 0xF) as f64;
        let threshold = if threshold_bits == 0.0 { period - 1.0 } else { (threshold_bits - 4.0) * period / 8.0 };
        RoundMode::Super { period, phase, threshold }
    }

    /// Apply this round mode to a pixel-space value (spec §4.7).
    pub fn round(&self, v: f64) -> f64 {
        let sign = if v < 0.0 { -1.0 } else { 1.0 };
        match *self {
            RoundMode::ToGrid => v.round(),
            RoundMode::ToHalfGrid => v.floor() + 0.5 * sign,
            RoundMode::ToDoubleGrid => (v * 2.0).round() / 2.0,
            RoundMode::DownToGrid => v.floor(),
            RoundMode::UpToGrid => v.ceil(),
            RoundMode::Off => v,
            RoundMode::Super { period, phase, threshold } => {
                let av = v.abs();
                let mut result = sign * (((av - phase + threshold) / period).trunc() * period + phase);
                if (result < 0.0) != (v < 0.0) && result != 0.0 {
                    result = 0.0; // clipped so zero cannot become of opposite sign
                }
                result
            }
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct GraphicsState {
    pub auto_flip: bool,
    pub cvt_cut_in: F26Dot6,
    pub delta_base: i32,
    pub delta_shift: i32,
    pub projection: Vector,
    pub freedom: Vector,
    pub dual_projection: Vector,
    pub zp: [i32; 3],
    pub loop_count: i32,
    pub min_distance: F26Dot6,
    pub round_mode: RoundMode,
    pub rp: [usize; 3],
    pub single_width_cut_in: F26Dot6,
    pub single_width_value: F26Dot6,
    pub instruct_control: u8,
    pub scan_control: bool,
}

impl Default for GraphicsState {
    fn default() -> GraphicsState {
        GraphicsState {
            auto_flip: true,
            cvt_cut_in: F26Dot6::from_f64(17.0 / 16.0),
            delta_base: 9,
            delta_shift: 3,
            projection: Vector::X_AXIS,
            freedom: Vector::X_AXIS,
            dual_projection: Vector::X_AXIS,
            zp: [1, 1, 1],
            loop_count: 1,
            min_distance: F26Dot6::from_int(1),
            round_mode: RoundMode::ToGrid,
            rp: [0, 0, 0],
            single_width_cut_in: F26Dot6::ZERO,
            single_width_value: F26Dot6::ZERO,
            instruct_control: 0,
            scan_control: false,
        }
    }
}

impl GraphicsState {
    fn fdotp(&self) -> f64 {
        let d = self.freedom.dot(self.projection.x, self.projection.y);
        if d.abs() < 1e-6 {
            1.0
        } else {
            d
        }
    }
}

/// One zone's point storage: `original` is the undeformed (scaled) position,
/// `current` is the mutable position the interpreter moves. Twilight's
/// `original` is writable; the glyph zone's is not (spec §4.7 zone selection).
#[derive(Clone, Debug, Default)]
pub struct Zone {
    pub original: Vec<(f64, f64)>,
    pub current: Vec<(f64, f64)>,
}

impl Zone {
    pub fn new(points: Vec<(f64, f64)>) -> Zone {
        Zone { original: points.clone(), current: points }
    }

    pub fn with_len(n: usize) -> Zone {
        Zone { original: vec![(0.0, 0.0); n], current: vec![(0.0, 0.0); n] }
    }
}

/// Persistent interpreter engine state: one instance per face, reused across
/// `fpgm`/`prep`/glyph-instruction executions (spec §5: a face owns its
/// interpreter and mutates it in place).
pub struct Interpreter {
    pub graphics: GraphicsState,
    pub stack: Vec<i32>,
    pub storage: Vec<i32>,
    pub cvt: Vec<F26Dot6>,
    pub twilight: Zone,
    pub ppem: f64,
    pub point_size: f64,
    functions: HashMap<i32, Vec<u8>>,
    max_stack: usize,
}

impl Interpreter {
    pub fn new(max_stack: usize, max_storage: usize, max_twilight_points: usize) -> Interpreter {
        Interpreter {
            graphics: GraphicsState::default(),
            stack: Vec::with_capacity(max_stack),
            storage: vec![0; max_storage],
            cvt: Vec::new(),
            twilight: Zone::with_len(max_twilight_points),
            ppem: 0.0,
            point_size: 0.0,
            functions: HashMap::new(),
            max_stack,
        }
    }

    /// Reload the CVT from font-unit values scaled to the current ppem
    /// (spec §4.7 "on each new pixel size"). Call before running `prep`.
    pub fn reload_cvt(&mut self, font_unit_cvt: &[i16], scale: f64) {
        self.cvt = font_unit_cvt.iter().map(|&v| F26Dot6::from_f64(v as f64 * scale)).collect();
    }

    /// Reset the graphics state to its program defaults, clear the stack,
    /// and execute `code` against `current` (spec §9 "reset-on-entry for
    /// the graphics-state defaults"). Used for `prep` and per-glyph
    /// instructions; functions and storage are untouched, since those
    /// persist across invocations for the same face.
    pub fn execute(&mut self, code: &[u8], current: &mut Zone) -> Result<()> {
        self.graphics = GraphicsState::default();
        self.stack.clear();
        self.run(code, current, 0)
    }

    /// Execute `fpgm`: only defines functions (FDEF/ENDF), so the graphics
    /// state is left untouched rather than reset.
    pub fn execute_fpgm(&mut self, code: &[u8]) -> Result<()> {
        self.stack.clear();
        let mut empty = Zone::default();
        self.run(code, &mut empty, 0)
    }

    fn run(&mut self, code: &[u8], current: &mut Zone, call_depth: u32) -> Result<()> {
        let mut pc = 0usize;
        while pc < code.len() {
            pc = self.step(code, pc, current, call_depth)?;
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<i32> {
        self.stack.pop().ok_or(Error::InvalidBytecode { pc: 0, reason: "stack underflow" })
    }

    fn push(&mut self, v: i32) -> Result<()> {
        if self.stack.len() >= self.max_stack {
            return Err(Error::InvalidBytecode { pc: 0, reason: "stack overflow" });
        }
        self.stack.push(v);
        Ok(())
    }

    fn pop_f26dot6(&mut self) -> Result<F26Dot6> {
        Ok(F26Dot6(self.pop()?))
    }

    fn push_f26dot6(&mut self, v: F26Dot6) -> Result<()> {
        self.push(v.0)
    }

    fn zone_current<'z>(&'z self, current: &'z Zone, selector: i32) -> Result<&'z Zone> {
        match selector {
            0 => Ok(&self.twilight),
            1 => Ok(current),
            _ => Err(Error::InvalidBytecode { pc: 0, reason: "zone selector out of range" }),
        }
    }

    fn get_current(&self, current: &Zone, selector: i32, idx: usize) -> Result<(f64, f64)> {
        self.zone_current(current, selector)?
            .current
            .get(idx)
            .copied()
            .ok_or(Error::InvalidBytecode { pc: 0, reason: "point index out of range" })
    }

    fn get_original(&self, current: &Zone, selector: i32, idx: usize) -> Result<(f64, f64)> {
        self.zone_current(current, selector)?
            .original
            .get(idx)
            .copied()
            .ok_or(Error::InvalidBytecode { pc: 0, reason: "point index out of range" })
    }

    fn set_current(&mut self, current: &mut Zone, selector: i32, idx: usize, p: (f64, f64)) -> Result<()> {
        let z = match selector {
            0 => &mut self.twilight,
            1 => current,
            _ => return Err(Error::InvalidBytecode { pc: 0, reason: "zone selector out of range" }),
        };
        *z.current.get_mut(idx).ok_or(Error::InvalidBytecode { pc: 0, reason: "point index out of range" })? = p;
        Ok(())
    }

    fn set_original(&mut self, selector: i32, idx: usize, p: (f64, f64)) -> Result<()> {
        if selector != 0 {
            return Err(Error::InvalidBytecode { pc: 0, reason: "original-point write outside twilight" });
        }
        *self.twilight.original.get_mut(idx).ok_or(Error::InvalidBytecode { pc: 0, reason: "point index out of range" })? = p;
        Ok(())
    }

    /// Byte length of the instruction at `code[pc]`, including immediate
    /// push operands (only NPUSHB/NPUSHW/PUSHB/PUSHW carry them).
    fn instruction_len(code: &[u8], pc: usize) -> Result<usize> {
        let op = *code.get(pc).ok_or(Error::InvalidBytecode { pc, reason: "truncated instruction stream" })?;
        Ok(match op {
            0x40 => 2 + *code.get(pc + 1).ok_or(Error::InvalidBytecode { pc, reason: "truncated NPUSHB" })? as usize,
            0x41 => 2 + 2 * *code.get(pc + 1).ok_or(Error::InvalidBytecode { pc, reason: "truncated NPUSHW" })? as usize,
            0xB0..=0xB7 => 1 + (op - 0xB0 + 1) as usize,
            0xB8..=0xBF => 1 + 2 * (op - 0xB8 + 1) as usize,
            _ => 1,
        })
    }

    fn find_if_blocks(code: &[u8], mut pc: usize) -> Result<(Option<usize>, usize)> {
        let mut depth = 0i32;
        let mut else_pos = None;
        loop {
            if pc >= code.len() {
                return Err(Error::InvalidBytecode { pc, reason: "IF without matching EIF" });
            }
            match code[pc] {
                0x58 => depth += 1,
                0x59 => {
                    if depth == 0 {
                        return Ok((else_pos, pc));
                    }
                    depth -= 1;
                }
                0x1B => {
                    if depth == 0 && else_pos.is_none() {
                        else_pos = Some(pc);
                    }
                }
                _ => {}
            }
            pc += Self::instruction_len(code, pc)?;
        }
    }

    fn skip_to_eif(code: &[u8], mut pc: usize) -> Result<usize> {
        let mut depth = 0i32;
        loop {
            if pc >= code.len() {
                return Err(Error::InvalidBytecode { pc, reason: "ELSE without matching EIF" });
            }
            match code[pc] {
                0x58 => depth += 1,
                0x59 => {
                    if depth == 0 {
                        return Ok(pc);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            pc += Self::instruction_len(code, pc)?;
        }
    }

    fn find_endf(code: &[u8], mut pc: usize) -> Result<usize> {
        loop {
            if pc >= code.len() {
                return Err(Error::InvalidBytecode { pc, reason: "FDEF without matching ENDF" });
            }
            if code[pc] == 0x2D {
                return Ok(pc);
            }
            pc += Self::instruction_len(code, pc)?;
        }
    }

    fn call_function(&mut self, fn_id: i32, current: &mut Zone, call_depth: u32) -> Result<()> {
        if call_depth >= MAX_CALL_DEPTH {
            return Err(Error::InvalidBytecode { pc: 0, reason: "call stack overflow" });
        }
        let body = self.functions.get(&fn_id).cloned().ok_or(Error::InvalidBytecode { pc: 0, reason: "CALL to undefined function" })?;
        self.run(&body, current, call_depth + 1)
    }

    /// Execute the instruction at `pc` and return the next `pc`.
    fn step(&mut self, code: &[u8], pc: usize, current: &mut Zone, call_depth: u32) -> Result<usize> {
        let op = code[pc];
        macro_rules! err {
            ($msg:expr) => {
                Error::InvalidBytecode { pc, reason: $msg }
            };
        }
        macro_rules! compare {
            ($f:expr) => {{
                let e2 = self.pop()?;
                let e1 = self.pop()?;
                self.push(if $f(e1, e2) { 1 } else { 0 })?;
            }};
        }

        match op {
            0x40 => {
                let n = *code.get(pc + 1).ok_or(err!("truncated NPUSHB"))? as usize;
                for i in 0..n {
                    self.push(*code.get(pc + 2 + i).ok_or(err!("truncated NPUSHB"))? as i32)?;
                }
                return Ok(pc + 2 + n);
            }
            0x41 => {
                let n = *code.get(pc + 1).ok_or(err!("truncated NPUSHW"))? as usize;
                for i in 0..n {
                    let hi = *code.get(pc + 2 + 2 * i).ok_or(err!("truncated NPUSHW"))?;
                    let lo = *code.get(pc + 3 + 2 * i).ok_or(err!("truncated NPUSHW"))?;
                    self.push((((hi as i16) << 8) | lo as i16) as i32)?;
                }
                return Ok(pc + 2 + 2 * n);
            }
            0xB0..=0xB7 => {
                let n = (op - 0xB0 + 1) as usize;
                for i in 0..n {
                    self.push(*code.get(pc + 1 + i).ok_or(err!("truncated PUSHB"))? as i32)?;
                }
                return Ok(pc + 1 + n);
            }
            0xB8..=0xBF => {
                let n = (op - 0xB8 + 1) as usize;
                for i in 0..n {
                    let hi = *code.get(pc + 1 + 2 * i).ok_or(err!("truncated PUSHW"))?;
                    let lo = *code.get(pc + 2 + 2 * i).ok_or(err!("truncated PUSHW"))?;
                    self.push((((hi as i16) << 8) | lo as i16) as i32)?;
                }
                return Ok(pc + 1 + 2 * n);
            }

            0x42 => { let idx = self.pop()? as usize; let v = self.pop()?; *self.storage.get_mut(idx).ok_or(err!("storage index out of range"))? = v; }
            0x43 => { let idx = self.pop()? as usize; let v = *self.storage.get(idx).ok_or(err!("storage index out of range"))?; self.push(v)?; }
            0x44 => { let idx = self.pop()? as usize; let v = self.pop_f26dot6()?; *self.cvt.get_mut(idx).ok_or(err!("cvt index out of range"))? = v; }
            0x70 => { let idx = self.pop()? as usize; let v = self.pop()?; *self.cvt.get_mut(idx).ok_or(err!("cvt index out of range"))? = F26Dot6::from_f64(v as f64); }
            0x45 => { let idx = self.pop()? as usize; let v = *self.cvt.get(idx).ok_or(err!("cvt index out of range"))?; self.push_f26dot6(v)?; }

            0x00 => { self.graphics.projection = Vector::Y_AXIS; self.graphics.freedom = Vector::Y_AXIS; }
            0x01 => { self.graphics.projection = Vector::X_AXIS; self.graphics.freedom = Vector::X_AXIS; }
            0x02 => { self.graphics.projection = Vector::Y_AXIS; }
            0x03 => { self.graphics.projection = Vector::X_AXIS; }
            0x04 => { self.graphics.freedom = Vector::Y_AXIS; }
            0x05 => { self.graphics.freedom = Vector::X_AXIS; }
            0x06 | 0x07 => {
                let p2 = self.pop()? as usize;
                let p1 = self.pop()? as usize;
                let (x1, y1) = self.get_current(current, self.graphics.zp[1], p1)?;
                let (x2, y2) = self.get_current(current, self.graphics.zp[2], p2)?;
                let (mut dx, mut dy) = (x2 - x1, y2 - y1);
                if op == 0x07 { let t = dx; dx = -dy; dy = t; }
                self.graphics.projection = Vector::normalize(dx, dy);
            }
            0x08 | 0x09 => {
                let p2 = self.pop()? as usize;
                let p1 = self.pop()? as usize;
                let (x1, y1) = self.get_current(current, self.graphics.zp[1], p1)?;
                let (x2, y2) = self.get_current(current, self.graphics.zp[2], p2)?;
                let (mut dx, mut dy) = (x2 - x1, y2 - y1);
                if op == 0x09 { let t = dx; dx = -dy; dy = t; }
                self.graphics.freedom = Vector::normalize(dx, dy);
            }
            0x0A => { let y = self.pop_f26dot6()?.to_f64(); let x = self.pop_f26dot6()?.to_f64(); self.graphics.projection = Vector::normalize(x, y); }
            0x0B => { let y = self.pop_f26dot6()?.to_f64(); let x = self.pop_f26dot6()?.to_f64(); self.graphics.freedom = Vector::normalize(x, y); }
            0x0C => { self.push((self.graphics.projection.x * 16384.0).round() as i32)?; self.push((self.graphics.projection.y * 16384.0).round() as i32)?; } // GPV, 2.14 scale
            0x0D => { self.push((self.graphics.freedom.x * 16384.0).round() as i32)?; self.push((self.graphics.freedom.y * 16384.0).round() as i32)?; } // GFV, 2.14 scale
            0x0E => { self.graphics.freedom = self.graphics.projection; }
            0x86 | 0x87 => {
                let p2 = self.pop()? as usize;
                let p1 = self.pop()? as usize;
                let (ox1, oy1) = self.get_original(current, self.graphics.zp[1], p1)?;
                let (ox2, oy2) = self.get_original(current, self.graphics.zp[2], p2)?;
                let (cx1, cy1) = self.get_current(current, self.graphics.zp[1], p1)?;
                let (cx2, cy2) = self.get_current(current, self.graphics.zp[2], p2)?;
                let (mut odx, mut ody) = (ox2 - ox1, oy2 - oy1);
                let (mut cdx, mut cdy) = (cx2 - cx1, cy2 - cy1);
                if op == 0x87 { let t = odx; odx = -ody; ody = t; let t2 = cdx; cdx = -cdy; cdy = t2; }
                self.graphics.dual_projection = Vector::normalize(odx, ody);
                self.graphics.projection = Vector::normalize(cdx, cdy);
            }

            0x10 => { self.graphics.rp[0] = self.pop()? as usize; }
            0x11 => { self.graphics.rp[1] = self.pop()? as usize; }
            0x12 => { self.graphics.rp[2] = self.pop()? as usize; }
            0x13 => { self.graphics.zp[0] = self.pop()?; }
            0x14 => { self.graphics.zp[1] = self.pop()?; }
            0x15 => { self.graphics.zp[2] = self.pop()?; }
            0x16 => { let z = self.pop()?; self.graphics.zp = [z, z, z]; }
            0x17 => { self.graphics.loop_count = self.pop()?; }
            0x18 => { self.graphics.round_mode = RoundMode::ToGrid; }
            0x19 => { self.graphics.round_mode = RoundMode::Super { period: 1.0, phase: 0.5, threshold: 0.5 }; } // RTHG
            0x3D => { self.graphics.round_mode = RoundMode::Super { period: std::f64::consts::FRAC_1_SQRT_2, phase: std::f64::consts::FRAC_1_SQRT_2 * 0.5, threshold: std::f64::consts::FRAC_1_SQRT_2 * 0.5 }; } // RTDG
            0x7C => { self.graphics.round_mode = RoundMode::UpToGrid; } // RUTG
            0x7D => { self.graphics.round_mode = RoundMode::DownToGrid; } // RDTG
            0x7A => { self.graphics.round_mode = RoundMode::Off; } // ROFF
            0x76 => { let b = self.pop()? as u8; self.graphics.round_mode = RoundMode::decode_super(b, false); } // SROUND
            0x77 => { let b = self.pop()? as u8; self.graphics.round_mode = RoundMode::decode_super(b, true); } // S45ROUND
            0x1A => { self.graphics.min_distance = self.pop_f26dot6()?; } // SMD
            0x1D => { self.graphics.cvt_cut_in = self.pop_f26dot6()?; } // SCVTCI
            0x1E => { self.graphics.single_width_cut_in = self.pop_f26dot6()?; } // SSWCI
            0x1F => { self.graphics.single_width_value = self.pop_f26dot6()?; } // SSW
            0x4D => { self.graphics.auto_flip = true; } // FLIPON
            0x4E => { self.graphics.auto_flip = false; } // FLIPOFF
            0x85 => { self.pop()?; } // SCANCTRL (consume, no-op)
            0x8D => { self.pop()?; } // SCANTYPE
            0x7E => { self.pop()?; } // SANGW
            0x8E => { // INSTCTRL
                let v = self.pop()?;
                let s = self.pop()?;
                if s == 1 { self.graphics.instruct_control = (self.graphics.instruct_control & !0x01) | (v as u8 & 0x01); }
                else if s == 2 { self.graphics.instruct_control = (self.graphics.instruct_control & !0x02) | (v as u8 & 0x02); }
            }

            0x20 => { let v = *self.stack.last().ok_or(err!("stack underflow"))?; self.push(v)?; } // DUP
            0x21 => { self.pop()?; } // POP
            0x22 => { self.stack.clear(); } // CLEAR
            0x23 => { let l = self.stack.len(); if l < 2 { return Err(err!("stack underflow")); } self.stack.swap(l - 1, l - 2); } // SWAP
            0x24 => { let d = self.stack.len() as i32; self.push(d)?; } // DEPTH
            0x25 => { // CINDEX
                let k = self.pop()? as usize;
                let l = self.stack.len();
                let v = *self.stack.get(l.wrapping_sub(k)).ok_or(err!("stack underflow"))?;
                self.push(v)?;
            }
            0x26 => { // MINDEX
                let k = self.pop()? as usize;
                let l = self.stack.len();
                if k == 0 || k > l { return Err(err!("stack underflow")); }
                let v = self.stack.remove(l - k);
                self.stack.push(v);
            }
            0x8A => { // ROLL: top three elements, a b c -> b c a (rotate)
                let l = self.stack.len();
                if l < 3 { return Err(err!("stack underflow")); }
                let v = self.stack.remove(l - 3);
                self.stack.push(v);
            }

            0x2A => { let fn_id = self.pop()?; let count = self.pop()?; for _ in 0..count { self.call_function(fn_id, current, call_depth)?; } } // LOOPCALL
            0x2B => { let fn_id = self.pop()?; self.call_function(fn_id, current, call_depth)?; } // CALL
            0x2C => { // FDEF
                if call_depth > 0 { return Err(err!("FDEF inside function")); }
                let fn_id = self.pop()?;
                let endf = Self::find_endf(code, pc + 1)?;
                self.functions.insert(fn_id, code[pc + 1..endf].to_vec());
                return Ok(endf + 1);
            }
            0x2D => { return Err(err!("ENDF without function")); }

            0x46 => { let p = self.pop()? as usize; let (x, y) = self.get_current(current, self.graphics.zp[1], p)?; self.push_f26dot6(F26Dot6::from_f64(self.graphics.projection.dot(x, y)))?; } // GC[0]
            0x47 => { let p = self.pop()? as usize; let (x, y) = self.get_original(current, self.graphics.zp[1], p)?; self.push_f26dot6(F26Dot6::from_f64(self.graphics.projection.dot(x, y)))?; } // GC[1]
            0x48 => { // SCFS
                let value = self.pop_f26dot6()?.to_f64();
                let p = self.pop()? as usize;
                let (x, y) = self.get_current(current, self.graphics.zp[2], p)?;
                let cur_proj = self.graphics.projection.dot(x, y);
                let disp = (value - cur_proj) / self.graphics.fdotp();
                let freedom = self.graphics.freedom;
                self.set_current(current, self.graphics.zp[2], p, (x + freedom.x * disp, y + freedom.y * disp))?;
            }
            0x49 => { let p2 = self.pop()? as usize; let p1 = self.pop()? as usize; let (x1, y1) = self.get_current(current, self.graphics.zp[0], p1)?; let (x2, y2) = self.get_current(current, self.graphics.zp[1], p2)?; let d = self.graphics.projection.dot(x2 - x1, y2 - y1); self.push_f26dot6(F26Dot6::from_f64(d))?; } // MD[0]
            0x4A => { let p2 = self.pop()? as usize; let p1 = self.pop()? as usize; let (x1, y1) = self.get_original(current, self.graphics.zp[0], p1)?; let (x2, y2) = self.get_original(current, self.graphics.zp[1], p2)?; let d = self.graphics.dual_projection.dot(x2 - x1, y2 - y1); self.push_f26dot6(F26Dot6::from_f64(d))?; } // MD[1]
            0x4B => { self.push(self.ppem.round() as i32)?; } // MPPEM
            0x4C => { self.push((self.point_size * 64.0).round() as i32)?; } // MPS

            0x80 => { // FLIPPT: toggle on/off curve flag -- geometry-only, no flags tracked here; no-op on position
                let _ = self.pop()?;
            }
            0x81 => { let _hi = self.pop()?; let _lo = self.pop()?; } // FLIPRGON
            0x82 => { let _hi = self.pop()?; let _lo = self.pop()?; } // FLIPRGOFF

            0x32 | 0x33 => { // SHP[a]: shift `loop` points by displacement of reference point along freedom
                let rp_idx = if op == 0x32 { self.graphics.rp[2] } else { self.graphics.rp[1] };
                let rp_zone = if op == 0x32 { self.graphics.zp[1] } else { self.graphics.zp[0] };
                let (ox, oy) = self.get_original(current, rp_zone, rp_idx)?;
                let (cx, cy) = self.get_current(current, rp_zone, rp_idx)?;
                let disp_x = cx - ox;
                let disp_y = cy - oy;
                let freedom = self.graphics.freedom;
                let along = self.graphics.projection.dot(disp_x, disp_y);
                for _ in 0..self.graphics.loop_count.max(1) {
                    let p = self.pop()? as usize;
                    let (px, py) = self.get_current(current, self.graphics.zp[2], p)?;
                    self.set_current(current, self.graphics.zp[2], p, (px + freedom.x * along, py + freedom.y * along))?;
                }
                self.graphics.loop_count = 1;
            }
            0x38 => { // SHPIX: shift `loop` points by explicit 26.6 amount along freedom
                let amount = self.pop_f26dot6()?.to_f64();
                let freedom = self.graphics.freedom;
                for _ in 0..self.graphics.loop_count.max(1) {
                    let p = self.pop()? as usize;
                    let (px, py) = self.get_current(current, self.graphics.zp[2], p)?;
                    self.set_current(current, self.graphics.zp[2], p, (px + freedom.x * amount, py + freedom.y * amount))?;
                }
                self.graphics.loop_count = 1;
            }
            0x39 => { // IP: interpolate `loop` points between rp1 (zp0) and rp2 (zp1)
                let (rp1o_x, rp1o_y) = self.get_original(current, self.graphics.zp[0], self.graphics.rp[1])?;
                let (rp2o_x, rp2o_y) = self.get_original(current, self.graphics.zp[1], self.graphics.rp[2])?;
                let (rp1c_x, rp1c_y) = self.get_current(current, self.graphics.zp[0], self.graphics.rp[1])?;
                let (rp2c_x, rp2c_y) = self.get_current(current, self.graphics.zp[1], self.graphics.rp[2])?;
                let proj = self.graphics.projection;
                let span_o = proj.dot(rp2o_x - rp1o_x, rp2o_y - rp1o_y);
                let span_c = proj.dot(rp2c_x - rp1c_x, rp2c_y - rp1c_y);
                let freedom = self.graphics.freedom;
                for _ in 0..self.graphics.loop_count.max(1) {
                    let p = self.pop()? as usize;
                    let (pox, poy) = self.get_original(current, self.graphics.zp[2], p)?;
                    let rel = proj.dot(pox - rp1o_x, poy - rp1o_y);
                    let t = if span_o.abs() < 1e-9 { 0.0 } else { rel / span_o };
                    let new_along = span_c * t;
                    let (pcx, pcy) = self.get_current(current, self.graphics.zp[2], p)?;
                    let cur_along = proj.dot(pcx - rp1c_x, pcy - rp1c_y);
                    let delta = new_along - cur_along;
                    self.set_current(current, self.graphics.zp[2], p, (pcx + freedom.x * delta, pcy + freedom.y * delta))?;
                }
                self.graphics.loop_count = 1;
            }
            0x3E | 0x3F => { // MIAP[a]
                let cvt_idx = self.pop()? as usize;
                let p = self.pop()? as usize;
                let mut d = self.cvt.get(cvt_idx).copied().ok_or(err!("cvt index out of range"))?.to_f64();
                let (px, py) = self.get_current(current, self.graphics.zp[1], p)?;
                let cur_dist = self.graphics.projection.dot(px, py);
                if op == 0x3F {
                    if (d - cur_dist).abs() > self.graphics.cvt_cut_in.to_f64() {
                        d = cur_dist;
                    }
                    d = self.graphics.round_mode.round(d);
                }
                let disp = (d - cur_dist) / self.graphics.fdotp();
                let freedom = self.graphics.freedom;
                let new_p = (px + freedom.x * disp, py + freedom.y * disp);
                self.set_current(current, self.graphics.zp[1], p, new_p)?;
                if self.graphics.zp[1] == 0 {
                    self.set_original(0, p, new_p)?;
                }
                self.graphics.rp[0] = p;
                self.graphics.rp[1] = p;
            }

            0xE0..=0xFF => { // MIRP[abcde]
                let flags = op & 0x1F;
                let cvt_idx = self.pop()? as usize;
                let p = self.pop()? as usize;
                let mut d = self.cvt.get(cvt_idx).copied().ok_or(err!("cvt index out of range"))?.to_f64();
                if (d - self.graphics.single_width_value.to_f64()).abs() < self.graphics.single_width_cut_in.to_f64() {
                    d = self.graphics.single_width_value.to_f64() * if d < 0.0 { -1.0 } else { 1.0 };
                }

                let zone0 = self.graphics.zp[0];
                let zone1 = self.graphics.zp[1];
                let rp0 = self.graphics.rp[0];

                if zone1 == 0 {
                    let (rx, ry) = self.get_current(current, zone0, rp0)?;
                    let freedom = self.graphics.freedom;
                    let init = (rx + freedom.x * d, ry + freedom.y * d);
                    self.set_current(current, zone1, p, init)?;
                    self.set_original(0, p, init)?;
                }

                let (rpox, rpoy) = self.get_original(current, zone0, rp0)?;
                let (pox, poy) = self.get_original(current, zone1, p)?;
                let original_distance = self.graphics.dual_projection.dot(pox - rpox, poy - rpoy);

                let (rpcx, rpcy) = self.get_current(current, zone0, rp0)?;
                let (pcx, pcy) = self.get_current(current, zone1, p)?;
                let current_distance = self.graphics.projection.dot(pcx - rpcx, pcy - rpcy);

                if self.graphics.auto_flip && (original_distance < 0.0) != (d < 0.0) {
                    d = -d;
                }

                if flags & 0x04 != 0 {
                    if zone0 == zone1 && (d - original_distance).abs() > self.graphics.cvt_cut_in.to_f64() {
                        d = original_distance;
                    }
                    d = self.graphics.round_mode.round(d);
                }

                if flags & 0x08 != 0 {
                    let min_d = self.graphics.min_distance.to_f64();
                    if d.abs() < min_d {
                        d = min_d * if original_distance < 0.0 { -1.0 } else { 1.0 };
                    }
                }

                let disp = (d - current_distance) / self.graphics.fdotp();
                let freedom = self.graphics.freedom;
                self.set_current(current, zone1, p, (pcx + freedom.x * disp, pcy + freedom.y * disp))?;

                self.graphics.rp[1] = rp0;
                self.graphics.rp[2] = p;
                if flags & 0x10 != 0 {
                    self.graphics.rp[0] = p;
                }
            }

            0x50 => compare!(|a, b| a < b),
            0x51 => compare!(|a, b| a <= b),
            0x52 => compare!(|a, b| a > b),
            0x53 => compare!(|a, b| a >= b),
            0x54 => compare!(|a, b| a == b),
            0x55 => compare!(|a, b| a != b),
            0x5A => { let b = self.pop()?; let a = self.pop()?; self.push(if a != 0 && b != 0 { 1 } else { 0 })?; }
            0x5B => { let b = self.pop()?; let a = self.pop()?; self.push(if a != 0 || b != 0 { 1 } else { 0 })?; }
            0x5C => { let a = self.pop()?; self.push(if a == 0 { 1 } else { 0 })?; }
            0x56 => { let v = self.pop_f26dot6()?; let rounded = self.graphics.round_mode.round(v.to_f64()); self.push(if (rounded as i64) % 2 != 0 { 1 } else { 0 })?; } // ODD
            0x57 => { let v = self.pop_f26dot6()?; let rounded = self.graphics.round_mode.round(v.to_f64()); self.push(if (rounded as i64) % 2 == 0 { 1 } else { 0 })?; } // EVEN

            0x58 => { // IF
                let cond = self.pop()?;
                if cond != 0 {
                    return Ok(pc + 1);
                }
                let (else_pos, eif_pos) = Self::find_if_blocks(code, pc + 1)?;
                return Ok(match else_pos { Some(e) => e + 1, None => eif_pos + 1 });
            }
            0x1B => { // ELSE (only reached when falling through a true IF branch)
                let eif = Self::skip_to_eif(code, pc + 1)?;
                return Ok(eif + 1);
            }
            0x59 => {} // EIF: no-op

            0x1C => { let offset = self.pop()?; return Ok(((pc as i64) + (offset as i64) - 1).max(0) as usize); } // JMPR
            0x78 => { let offset = self.pop()?; let e = self.pop()?; if e == 1 { return Ok(((pc as i64) + (offset as i64) - 1).max(0) as usize); } } // JROT
            0x79 => { let offset = self.pop()?; let e = self.pop()?; if e == 0 { return Ok(((pc as i64) + (offset as i64) - 1).max(0) as usize); } } // JROF

            0x60 => { let b = self.pop()?; let a = self.pop()?; self.push(a + b)?; }
            0x61 => { let b = self.pop()?; let a = self.pop()?; self.push(a - b)?; }
            0x62 => { let b = self.pop()? as i64; let a = self.pop()? as i64; if b == 0 { return Err(err!("division by zero")); } self.push(((a << 6) / b) as i32)?; }
            0x63 => { let b = self.pop()? as i64; let a = self.pop()? as i64; self.push(((a * b) >> 6) as i32)?; }
            0x64 => { let a = self.pop_f26dot6()?; self.push_f26dot6(a.abs())?; }
            0x65 => { let a = self.pop_f26dot6()?; self.push_f26dot6(-a)?; }
            0x66 => { let a = self.pop_f26dot6()?; self.push_f26dot6(a.floor())?; }
            0x67 => { let a = self.pop_f26dot6()?; self.push_f26dot6(a.ceil())?; }

            0x68..=0x6B => { let v = self.pop_f26dot6()?; let r = F26Dot6::from_f64(self.graphics.round_mode.round(v.to_f64())); self.push_f26dot6(r)?; } // ROUND[ab]
            0x6C..=0x6F => { let v = self.pop_f26dot6()?; self.push_f26dot6(v)?; } // NROUND[ab]: no-op

            0x88 => { // GETINFO
                let selector = self.pop()?;
                let mut result = 0i32;
                if selector & 0x01 != 0 { result |= 35; }
                if selector & 0x20 != 0 { result |= 0x1000; }
                self.push(result)?;
            }
            0x4F => { self.pop()?; } // DEBUG

            _ => return Err(err!("unknown opcode")),
        }
        Ok(pc + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_interp() -> Interpreter {
        Interpreter::new(64, 32, 4)
    }

    #[test]
    fn gfv_reports_x_axis_at_2dot14_scale() {
        let mut interp = new_interp();
        let mut zone = Zone::with_len(0);
        // SFVTCA[1] sets both projection and freedom to the x axis, then GFV pushes it back.
        let code = [0x01u8, 0x0Du8];
        interp.execute(&code, &mut zone).unwrap();
        assert_eq!(interp.stack, vec![16384, 0]);
    }

    #[test]
    fn gfv_reports_y_axis_at_2dot14_scale() {
        let mut interp = new_interp();
        let mut zone = Zone::with_len(0);
        let code = [0x00u8, 0x0Du8];
        interp.execute(&code, &mut zone).unwrap();
        assert_eq!(interp.stack, vec![0, 16384]);
    }

    #[test]
    fn execute_resets_graphics_state_between_runs() {
        let mut interp = new_interp();
        let mut zone = Zone::with_len(0);
        // FLIPOFF clears auto_flip; a later execute() call must not see it persist.
        interp.execute(&[0x4Eu8], &mut zone).unwrap();
        assert!(!interp.graphics.auto_flip);
        interp.execute(&[], &mut zone).unwrap();
        assert!(interp.graphics.auto_flip);
    }

    #[test]
    fn fpgm_defines_functions_without_resetting_graphics_state() {
        let mut interp = new_interp();
        interp.execute(&[0x4Eu8], &mut Zone::with_len(0)).unwrap();
        assert!(!interp.graphics.auto_flip);
        // PUSHB[0] 7, FDEF, ENDF: defines function #7 as a no-op.
        let fpgm = [0xB0u8, 0x07, 0x2C, 0x2D];
        interp.execute_fpgm(&fpgm).unwrap();
        assert!(!interp.graphics.auto_flip, "fpgm execution must not reset graphics state");
    }

    #[test]
    fn functions_persist_across_executions() {
        let mut interp = new_interp();
        // PUSHB[0] 1, FDEF, PUSHB[0] 42, ENDF: function #1 pushes 42.
        let fpgm = [0xB0u8, 0x01, 0x2C, 0xB0, 42, 0x2D];
        interp.execute_fpgm(&fpgm).unwrap();

        let mut zone = Zone::with_len(0);
        // PUSHB[0] 1, CALL
        interp.execute(&[0xB0, 0x01, 0x2B], &mut zone).unwrap();
        assert_eq!(interp.stack, vec![42]);
    }

    #[test]
    fn if_else_eif_selects_correct_branch() {
        let mut interp = new_interp();
        let mut zone = Zone::with_len(0);
        // PUSHB[0] 0, IF, PUSHB[0] 1, ELSE, PUSHB[0] 2, EIF
        let code = [0xB0u8, 0x00, 0x58, 0xB0, 1, 0x1B, 0xB0, 2, 0x59];
        interp.execute(&code, &mut zone).unwrap();
        assert_eq!(interp.stack, vec![2]);
    }

    #[test]
    fn call_stack_overflow_is_bounded() {
        let mut interp = new_interp();
        // function #0 calls itself forever
        let fpgm = [0xB0u8, 0x00, 0x2C, 0xB0, 0x00, 0x2B, 0x2D];
        interp.execute_fpgm(&fpgm).unwrap();
        let mut zone = Zone::with_len(0);
        let err = interp.execute(&[0xB0, 0x00, 0x2B], &mut zone).unwrap_err();
        assert!(matches!(err, Error::InvalidBytecode { .. }));
    }
}
