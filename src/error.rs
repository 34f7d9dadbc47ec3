//! Error types shared across the whole crate.

use std::fmt;

/// A 4-byte SFNT table tag (`cmap`, `glyf`, ...), printed like the teacher's
/// `TableTag` debug impl but stored as plain bytes instead of a transmuted enum.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Tag {
        Tag([a, b, c, d])
    }

    pub fn from_u32(v: u32) -> Tag {
        Tag(v.to_be_bytes())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}{}{}{}'", self.0[0] as char, self.0[1] as char, self.0[2] as char, self.0[3] as char)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Every error this crate can produce. Decoder errors are fatal to face
/// construction; interpreter errors abort only the glyph being rendered.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput { offset: usize, needed: usize, available: usize },

    #[error("seek to {offset} is out of bounds (length {length})")]
    OutOfBounds { offset: usize, length: usize },

    #[error("unsupported SFNT container: {reason}")]
    UnsupportedSfnt { reason: &'static str },

    #[error("missing required table {tag}")]
    MissingRequiredTable { tag: Tag },

    #[error("invalid table {tag}: {reason}")]
    InvalidTable { tag: Tag, reason: &'static str },

    #[error("invalid bytecode at pc={pc}: {reason}")]
    InvalidBytecode { pc: usize, reason: &'static str },

    #[error("unsupported feature: {reason}")]
    UnsupportedFeature { reason: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
