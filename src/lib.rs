//! `grid-fit` — an SFNT/TrueType font engine: container decoding, the
//! TrueType bytecode hinting interpreter, and an AGG-style analytic
//! antialiased rasterizer.
//!
//! The public entry point is [`FaceCollection`]: open a byte buffer holding
//! a `.ttf`/`.otf`/`.ttc` stream, read one [`Face`] out of it, and ask that
//! face for scaled metrics, hinted glyph outlines, and kerning.

#[macro_use]
extern crate bitflags;
extern crate byteorder;

pub mod compose;
pub mod error;
pub mod face;
pub mod glyph;
pub mod interp;
pub mod numerics;
pub mod raster;
pub mod reader;
pub mod tables;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
pub use face::{compute_pixel_size, Face, FaceCollection, FaceMetrics, Glyph};
pub use numerics::{divmod, F24Dot8, F26Dot6, Fixed, F2Dot14};
pub use raster::Surface;
