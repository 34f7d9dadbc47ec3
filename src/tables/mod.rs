//! SFNT/TrueType table decoder (spec §4.3). One submodule per table,
//! mirroring the teacher's per-table `from_binary` associated functions
//! (`truetype_loader/mod.rs`) but built on the shared `Reader` cursor and
//! returning typed `Error`s instead of raw `io::Error`.

pub mod cmap;
pub mod cvt;
pub mod fpgm_prep;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod kern;
pub mod loca;
pub mod maxp;
pub mod os2;
pub mod post;

use crate::error::{Error, Result, Tag};
use crate::reader::Reader;

pub const TAG_CMAP: Tag = Tag::new(b'c', b'm', b'a', b'p');
pub const TAG_GLYF: Tag = Tag::new(b'g', b'l', b'y', b'f');
pub const TAG_HEAD: Tag = Tag::new(b'h', b'e', b'a', b'd');
pub const TAG_HHEA: Tag = Tag::new(b'h', b'h', b'e', b'a');
pub const TAG_HMTX: Tag = Tag::new(b'h', b'm', b't', b'x');
pub const TAG_LOCA: Tag = Tag::new(b'l', b'o', b'c', b'a');
pub const TAG_MAXP: Tag = Tag::new(b'm', b'a', b'x', b'p');
pub const TAG_POST: Tag = Tag::new(b'p', b'o', b's', b't');
pub const TAG_OS2: Tag = Tag::new(b'O', b'S', b'/', b'2');
pub const TAG_CVT: Tag = Tag::new(b'c', b'v', b't', b' ');
pub const TAG_FPGM: Tag = Tag::new(b'f', b'p', b'g', b'm');
pub const TAG_PREP: Tag = Tag::new(b'p', b'r', b'e', b'p');
pub const TAG_KERN: Tag = Tag::new(b'k', b'e', b'r', b'n');
pub const TAG_VHEA: Tag = Tag::new(b'v', b'h', b'e', b'a');
pub const TAG_VMTX: Tag = Tag::new(b'v', b'm', b't', b'x');

pub const SFNT_TRUETYPE: u32 = 0x0001_0000;
pub const SFNT_TRUE: u32 = 0x7472_7565; // 'true'
pub const SFNT_OTTO: u32 = 0x4F54_544F; // 'OTTO'
pub const SFNT_TTC: u32 = 0x7474_6366; // 'ttcf'

#[derive(Copy, Clone, Debug)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableRecord {
    fn from_reader(r: &mut Reader) -> Result<TableRecord> {
        Ok(TableRecord { tag: r.tag()?, checksum: r.u32()?, offset: r.u32()?, length: r.u32()? })
    }
}

/// The offset table for a single face: version tag plus the table directory.
#[derive(Clone, Debug)]
pub struct SfntDirectory {
    pub sfnt_version: u32,
    pub records: Vec<TableRecord>,
}

impl SfntDirectory {
    pub fn parse(r: &mut Reader, face_offset: usize) -> Result<SfntDirectory> {
        r.seek(face_offset)?;
        let sfnt_version = r.u32()?;
        if sfnt_version != SFNT_TRUETYPE && sfnt_version != SFNT_TRUE && sfnt_version != SFNT_OTTO {
            return Err(Error::UnsupportedSfnt { reason: "unrecognized offset table version" });
        }
        let num_tables = r.u16()?;
        r.skip(6)?; // searchRange, entrySelector, rangeShift
        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            records.push(TableRecord::from_reader(r)?);
        }
        Ok(SfntDirectory { sfnt_version, records })
    }

    pub fn find(&self, tag: Tag) -> Option<&TableRecord> {
        self.records.iter().find(|t| t.tag == tag)
    }

    /// Locate a table by tag and seek the reader to it. Returns `Ok(None)`
    /// when the table is absent and not required, or an error when it is
    /// absent/empty and required (spec §4.3 `seek_to`).
    pub fn seek_to<'a>(&self, r: &mut Reader<'a>, tag: Tag, required: bool) -> Result<Option<usize>> {
        match self.find(tag) {
            Some(rec) if rec.length > 0 => {
                r.seek(rec.offset as usize)?;
                Ok(Some(rec.length as usize))
            }
            _ => {
                if required {
                    Err(Error::MissingRequiredTable { tag })
                } else {
                    Ok(None)
                }
            }
        }
    }
}

/// Top-level container: either a bare SFNT offset table at offset 0, or a
/// `ttcf` collection header naming up to 64 per-face offsets (spec §4.3).
#[derive(Clone, Debug)]
pub struct TableDirectory {
    pub face_offsets: Vec<u32>,
}

impl TableDirectory {
    pub fn parse(r: &mut Reader) -> Result<TableDirectory> {
        r.seek(0)?;
        let magic = r.u32()?;
        if magic == SFNT_TTC {
            let _version = r.u32()?;
            let num_fonts = r.u32()?;
            if num_fonts > 64 {
                return Err(Error::InvalidTable { tag: Tag::from_u32(SFNT_TTC), reason: "TTC face count exceeds 64" });
            }
            let mut face_offsets = Vec::with_capacity(num_fonts as usize);
            for _ in 0..num_fonts {
                face_offsets.push(r.u32()?);
            }
            Ok(TableDirectory { face_offsets })
        } else if magic == SFNT_TRUETYPE || magic == SFNT_TRUE || magic == SFNT_OTTO {
            Ok(TableDirectory { face_offsets: vec![0] })
        } else {
            Err(Error::UnsupportedSfnt { reason: "unrecognized magic tag" })
        }
    }

    pub fn face_count(&self) -> usize {
        self.face_offsets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::builder::SfntBuilder;

    #[test]
    fn single_face_directory() {
        let data = SfntBuilder::minimal().build();
        let mut r = Reader::new(&data);
        let dir = TableDirectory::parse(&mut r).unwrap();
        assert_eq!(dir.face_count(), 1);
    }

    #[test]
    fn ttc_directory_reports_face_count() {
        let face = SfntBuilder::minimal().build();
        let mut data = Vec::new();
        data.extend_from_slice(b"ttcf");
        data.extend_from_slice(&1u32.to_be_bytes()); // version
        data.extend_from_slice(&3u32.to_be_bytes()); // num fonts
        let base = data.len() + 3 * 4;
        for i in 0..3u32 {
            data.extend_from_slice(&(base as u32 + i * face.len() as u32).to_be_bytes());
        }
        for _ in 0..3 {
            data.extend_from_slice(&face);
        }
        let mut r = Reader::new(&data);
        let dir = TableDirectory::parse(&mut r).unwrap();
        assert_eq!(dir.face_count(), 3);
    }
}
