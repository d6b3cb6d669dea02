//! Text record writers for BlockProject 3D files
//!
//! Every record is one `\n`-terminated line of whitespace-separated fields.
//! Floats use the shortest round-trip representation (`{:?}`).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};

/// Write a file title followed by a blank line
pub fn write_header<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    writeln!(w, "{}", title)?;
    writeln!(w)
}

pub fn write_version<W: Write>(w: &mut W, version: u32) -> io::Result<()> {
    writeln!(w, "#version {}", version)
}

/// `#use <feature>`
pub fn write_flag<W: Write>(w: &mut W, feature: &str) -> io::Result<()> {
    writeln!(w, "#use {}", feature)
}

pub fn write_alloc_mat<W: Write>(w: &mut W, count: usize) -> io::Result<()> {
    writeln!(w, "#AllocMat {}", count)
}

/// `#SubMaterial <part> <vertex offset> <uv offset> <normal offset>`
pub fn write_sub_material<W: Write>(
    w: &mut W,
    part: usize,
    vertex_offset: u32,
    uv_offset: u32,
    normal_offset: u32,
) -> io::Result<()> {
    writeln!(
        w,
        "#SubMaterial {} {} {} {}",
        part, vertex_offset, uv_offset, normal_offset
    )
}

/// Section comment, skipped by readers
pub fn write_section<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    writeln!(w, "## {}", name)
}

pub fn write_position<W: Write>(w: &mut W, p: [f32; 3]) -> io::Result<()> {
    writeln!(w, "v {:?} {:?} {:?}", p[0], p[1], p[2])
}

pub fn write_normal<W: Write>(w: &mut W, n: [f32; 3]) -> io::Result<()> {
    writeln!(w, "vn {:?} {:?} {:?}", n[0], n[1], n[2])
}

pub fn write_uv<W: Write>(w: &mut W, uv: [f32; 2]) -> io::Result<()> {
    writeln!(w, "vt {:?} {:?}", uv[0], uv[1])
}

/// Global (1-based) ids of one face corner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceCorner {
    pub vertex: u32,
    pub uv: Option<u32>,
    pub normal: u32,
}

/// `f v/uv/n v/uv/n v/uv/n`, with an empty uv slot when there is no UV layer
pub fn write_face<W: Write>(w: &mut W, corners: &[FaceCorner; 3]) -> io::Result<()> {
    write!(w, "f")?;
    for c in corners {
        match c.uv {
            Some(uv) => write!(w, " {}/{}/{}", c.vertex, uv, c.normal)?,
            None => write!(w, " {}//{}", c.vertex, c.normal)?,
        }
    }
    writeln!(w)
}

/// `bone <name> hx hy hz tx ty tz`
pub fn write_bone<W: Write>(w: &mut W, name: &str, head: [f32; 3], tail: [f32; 3]) -> io::Result<()> {
    writeln!(
        w,
        "bone {} {:?} {:?} {:?} {:?} {:?} {:?}",
        name, head[0], head[1], head[2], tail[0], tail[1], tail[2]
    )
}

/// `vb <bone id>...` followed by `vw <weight>...` for one vertex
pub fn write_vertex_weights<W: Write>(w: &mut W, influences: &[(u32, f32)]) -> io::Result<()> {
    write!(w, "vb")?;
    for (bone, _) in influences {
        write!(w, " {}", bone)?;
    }
    writeln!(w)?;

    write!(w, "vw")?;
    for (_, weight) in influences {
        write!(w, " {:?}", weight)?;
    }
    writeln!(w)
}

pub fn write_frame<W: Write>(w: &mut W, frame: i32) -> io::Result<()> {
    writeln!(w, "frame {}", frame)
}

/// `transform <bone id> tx ty tz sx sy sz qw qx qy qz`
pub fn write_transform<W: Write>(
    w: &mut W,
    bone: u32,
    location: [f32; 3],
    scale: [f32; 3],
    rotation: [f32; 4],
) -> io::Result<()> {
    writeln!(
        w,
        "transform {} {:?} {:?} {:?} {:?} {:?} {:?} {:?} {:?} {:?} {:?}",
        bone,
        location[0],
        location[1],
        location[2],
        scale[0],
        scale[1],
        scale[2],
        rotation[0],
        rotation[1],
        rotation[2],
        rotation[3]
    )
}

/// Buffered output file that tags I/O errors with its path
pub struct TextFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl TextFile {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| ExportError::fs(&path, e))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run one or more record writers against the file
    pub fn emit<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        write(&mut self.writer).map_err(|e| ExportError::fs(&self.path, e))
    }

    /// Flush buffered records; the handle closes on drop
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .map_err(|e| ExportError::fs(&self.path, e))?;
        Ok(self.path)
    }
}
