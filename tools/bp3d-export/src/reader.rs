//! Readers for the three BlockProject 3D text files
//!
//! Used to inspect exports and to check that every face reference resolves.
//! Ids stay 1-based as in the files; `#` lines other than the known
//! directives are comments.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;

use bp3d_shared::BP3D_FORMAT;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Line {line}: {message}")]
    UnresolvedReference { line: usize, message: String },
}

pub type ReadResult<T> = std::result::Result<T, ReadError>;

fn parse_error(line: usize, message: impl Into<String>) -> ReadError {
    ReadError::Parse {
        line,
        message: message.into(),
    }
}

fn read_file(path: &Path) -> ReadResult<String> {
    fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Non-empty lines with their 1-based line numbers
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

fn check_header(text: &str, title: &str) -> ReadResult<()> {
    match records(text).next() {
        Some((_, first)) if first == title => Ok(()),
        Some((line, first)) => Err(parse_error(
            line,
            format!("expected header '{}', found '{}'", title, first),
        )),
        None => Err(parse_error(1, format!("missing header '{}'", title))),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, line: usize) -> ReadResult<T> {
    field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number '{}'", field)))
}

fn parse_floats<const N: usize>(fields: &[&str], line: usize) -> ReadResult<[f32; N]> {
    if fields.len() != N {
        return Err(parse_error(
            line,
            format!("expected {} values, found {}", N, fields.len()),
        ));
    }
    let mut out = [0.0; N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = parse_field(field, line)?;
    }
    Ok(out)
}

/// One face corner, as written: `v/uv/n` or `v//n`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    pub vertex: u32,
    pub uv: Option<u32>,
    pub normal: u32,
}

/// Parse a face corner reference
fn parse_corner(s: &str, line: usize) -> ReadResult<Corner> {
    let fields: Vec<&str> = s.split('/').collect();
    if fields.len() != 3 {
        return Err(parse_error(line, format!("malformed face corner '{}'", s)));
    }

    let vertex = parse_field(fields[0], line)?;
    let uv = match fields[1] {
        "" => None,
        uv => Some(parse_field(uv, line)?),
    };
    let normal = parse_field(fields[2], line)?;
    Ok(Corner { vertex, uv, normal })
}

#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    /// Line the face was read from
    pub line: usize,
    pub corners: [Corner; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubMaterial {
    pub index: usize,
    pub vertex_offset: u32,
    pub uv_offset: u32,
    pub normal_offset: u32,
}

/// Resolved attributes of one face corner
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerData {
    pub position: [f32; 3],
    pub uv: Option<[f32; 2]>,
    pub normal: [f32; 3],
}

/// Parsed main object file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectDocument {
    pub version: Option<u32>,
    /// Features enabled with `#use`
    pub features: Vec<String>,
    pub alloc_mat: Option<usize>,
    pub sub_materials: Vec<SubMaterial>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
}

impl ObjectDocument {
    pub fn read(path: &Path) -> ReadResult<Self> {
        Self::parse(&read_file(path)?)
    }

    pub fn parse(text: &str) -> ReadResult<Self> {
        check_header(text, BP3D_FORMAT.object_header)?;
        let mut doc = Self::default();

        for (line, record) in records(text).skip(1) {
            let fields: Vec<&str> = record.split_whitespace().collect();
            match fields[0] {
                "#version" if fields.len() == 2 => {
                    doc.version = Some(parse_field(fields[1], line)?);
                }
                "#use" if fields.len() == 2 => doc.features.push(fields[1].to_string()),
                "#AllocMat" if fields.len() == 2 => {
                    doc.alloc_mat = Some(parse_field(fields[1], line)?);
                }
                "#SubMaterial" if fields.len() == 5 => doc.sub_materials.push(SubMaterial {
                    index: parse_field(fields[1], line)?,
                    vertex_offset: parse_field(fields[2], line)?,
                    uv_offset: parse_field(fields[3], line)?,
                    normal_offset: parse_field(fields[4], line)?,
                }),
                "v" => doc.positions.push(parse_floats(&fields[1..], line)?),
                "vn" => doc.normals.push(parse_floats(&fields[1..], line)?),
                "vt" => doc.uvs.push(parse_floats(&fields[1..], line)?),
                "f" => {
                    if fields.len() != 4 {
                        return Err(parse_error(
                            line,
                            format!("face has {} corners, expected 3", fields.len() - 1),
                        ));
                    }
                    doc.faces.push(Face {
                        line,
                        corners: [
                            parse_corner(fields[1], line)?,
                            parse_corner(fields[2], line)?,
                            parse_corner(fields[3], line)?,
                        ],
                    });
                }
                other if other.starts_with('#') => {}
                other => return Err(parse_error(line, format!("unknown record '{}'", other))),
            }
        }

        Ok(doc)
    }

    pub fn uses(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Look up the attributes referenced by `corner`
    pub fn resolve_corner(&self, corner: &Corner, line: usize) -> ReadResult<CornerData> {
        fn lookup<T: Copy>(pool: &[T], id: u32, what: &str, line: usize) -> ReadResult<T> {
            id.checked_sub(1)
                .and_then(|i| pool.get(i as usize))
                .copied()
                .ok_or_else(|| ReadError::UnresolvedReference {
                    line,
                    message: format!("{} {} out of range (1..={})", what, id, pool.len()),
                })
        }

        Ok(CornerData {
            position: lookup(&self.positions, corner.vertex, "vertex", line)?,
            uv: match corner.uv {
                Some(uv) => Some(lookup(&self.uvs, uv, "uv", line)?),
                None => None,
            },
            normal: lookup(&self.normals, corner.normal, "normal", line)?,
        })
    }

    /// Resolve every corner of every face
    pub fn triangles(&self) -> ReadResult<Vec<[CornerData; 3]>> {
        self.faces
            .iter()
            .map(|face| -> ReadResult<[CornerData; 3]> {
                Ok([
                    self.resolve_corner(&face.corners[0], face.line)?,
                    self.resolve_corner(&face.corners[1], face.line)?,
                    self.resolve_corner(&face.corners[2], face.line)?,
                ])
            })
            .collect()
    }

    /// Axis-aligned bounds of all positions
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.positions.iter().map(|&p| Vec3::from(p));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoneRecord {
    pub name: String,
    pub head: [f32; 3],
    pub tail: [f32; 3],
}

/// Parsed skeleton file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArmatureDocument {
    pub bones: Vec<BoneRecord>,
    /// (bone id, weight) pairs of every vertex, in file order
    pub vertex_weights: Vec<Vec<(u32, f32)>>,
}

impl ArmatureDocument {
    pub fn read(path: &Path) -> ReadResult<Self> {
        Self::parse(&read_file(path)?)
    }

    pub fn parse(text: &str) -> ReadResult<Self> {
        check_header(text, BP3D_FORMAT.armature_header)?;
        let mut doc = Self::default();
        let mut pending_bones: Option<(usize, Vec<u32>)> = None;

        for (line, record) in records(text).skip(1) {
            let fields: Vec<&str> = record.split_whitespace().collect();
            match fields[0] {
                "bone" if fields.len() == 8 => doc.bones.push(BoneRecord {
                    name: fields[1].to_string(),
                    head: parse_floats(&fields[2..5], line)?,
                    tail: parse_floats(&fields[5..8], line)?,
                }),
                "vb" => {
                    if pending_bones.is_some() {
                        return Err(parse_error(line, "'vb' without matching 'vw'"));
                    }
                    let ids = fields[1..]
                        .iter()
                        .map(|f| parse_field(f, line))
                        .collect::<ReadResult<Vec<u32>>>()?;
                    for &id in &ids {
                        if id == 0 || id as usize > doc.bones.len() {
                            return Err(ReadError::UnresolvedReference {
                                line,
                                message: format!(
                                    "bone {} out of range (1..={})",
                                    id,
                                    doc.bones.len()
                                ),
                            });
                        }
                    }
                    pending_bones = Some((line, ids));
                }
                "vw" => {
                    let (vb_line, ids) = pending_bones
                        .take()
                        .ok_or_else(|| parse_error(line, "'vw' without preceding 'vb'"))?;
                    let weights = fields[1..]
                        .iter()
                        .map(|f| parse_field(f, line))
                        .collect::<ReadResult<Vec<f32>>>()?;
                    if weights.len() != ids.len() {
                        return Err(parse_error(
                            line,
                            format!(
                                "{} weights for {} bones on line {}",
                                weights.len(),
                                ids.len(),
                                vb_line
                            ),
                        ));
                    }
                    doc.vertex_weights.push(ids.into_iter().zip(weights).collect());
                }
                other if other.starts_with('#') => {}
                other => return Err(parse_error(line, format!("unknown record '{}'", other))),
            }
        }

        if let Some((line, _)) = pending_bones {
            return Err(parse_error(line, "'vb' without matching 'vw'"));
        }
        Ok(doc)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransformRecord {
    pub bone: u32,
    pub location: [f32; 3],
    pub scale: [f32; 3],
    /// Quaternion [w, x, y, z]
    pub rotation: [f32; 4],
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameRecord {
    pub frame: i32,
    pub transforms: Vec<TransformRecord>,
}

/// Parsed animation file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationDocument {
    pub frames: Vec<FrameRecord>,
}

impl AnimationDocument {
    pub fn read(path: &Path) -> ReadResult<Self> {
        Self::parse(&read_file(path)?)
    }

    pub fn parse(text: &str) -> ReadResult<Self> {
        check_header(text, BP3D_FORMAT.animation_header)?;
        let mut doc = Self::default();

        for (line, record) in records(text).skip(1) {
            let fields: Vec<&str> = record.split_whitespace().collect();
            match fields[0] {
                "frame" if fields.len() == 2 => doc.frames.push(FrameRecord {
                    frame: parse_field(fields[1], line)?,
                    transforms: Vec::new(),
                }),
                "transform" if fields.len() == 12 => {
                    let frame = doc
                        .frames
                        .last_mut()
                        .ok_or_else(|| parse_error(line, "'transform' before any 'frame'"))?;
                    frame.transforms.push(TransformRecord {
                        bone: parse_field(fields[1], line)?,
                        location: parse_floats(&fields[2..5], line)?,
                        scale: parse_floats(&fields[5..8], line)?,
                        rotation: parse_floats(&fields[8..12], line)?,
                    });
                }
                other if other.starts_with('#') => {}
                other => return Err(parse_error(line, format!("unknown record '{}'", other))),
            }
        }

        Ok(doc)
    }
}
