//! Scene exporter
//!
//! Writes one object and its direct children ("parts") into a single
//! `.bp3d.obj` file. Vertex, UV and normal ids are file-global: each part's
//! local pool indices are shifted by the running totals of the parts before
//! it. When the root object is deformed by an armature, the skeleton and
//! animation companions are written first.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bp3d_shared::{ObjectId, BP3D_FORMAT};

use crate::animation::write_animation;
use crate::dedup::{deduplicate, Deduplicated, KeyPrecision};
use crate::error::{ExportError, Result};
use crate::formats::{
    write_alloc_mat, write_face, write_flag, write_header, write_normal, write_position,
    write_section, write_sub_material, write_uv, write_version, FaceCorner, TextFile,
};
use crate::geometry::TriangulatedMesh;
use crate::host::{FrameRange, SceneHost};
use crate::skeleton::write_skeleton;

/// Options for a single export
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// Animation range; the host's own range when `None`
    pub frame_range: Option<FrameRange>,
    pub precision: KeyPrecision,
    /// Write `## Vertices` style comments between sections
    pub section_comments: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            frame_range: None,
            precision: KeyPrecision::Exact,
            section_comments: true,
        }
    }
}

/// Running file-global ids of the next vertex, UV and normal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalOffsets {
    pub vertex: u32,
    pub uv: u32,
    pub normal: u32,
}

impl GlobalOffsets {
    /// Ids in files are 1-based
    pub const START: Self = Self {
        vertex: 1,
        uv: 1,
        normal: 1,
    };

    /// Move past everything `part` emitted
    pub fn advance(&mut self, part: &PartStats) -> Result<()> {
        *self = Self {
            vertex: bump(self.vertex, part.vertices, &part.name, "vertices")?,
            uv: bump(self.uv, part.uvs, &part.name, "uvs")?,
            normal: bump(self.normal, part.normals, &part.name, "normals")?,
        };
        Ok(())
    }

    /// Number of ids already used, as recorded by `#SubMaterial`
    pub fn consumed(&self) -> (u32, u32, u32) {
        (self.vertex - 1, self.uv - 1, self.normal - 1)
    }
}

fn bump(counter: u32, count: usize, object: &str, what: &'static str) -> Result<u32> {
    u32::try_from(count)
        .ok()
        .and_then(|count| counter.checked_add(count))
        .ok_or_else(|| ExportError::IdOverflow {
            object: object.to_string(),
            what,
        })
}

impl Default for GlobalOffsets {
    fn default() -> Self {
        Self::START
    }
}

/// What one part contributed to the main file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartStats {
    pub name: String,
    pub vertices: usize,
    pub normals: usize,
    pub uvs: usize,
    pub triangles: usize,
}

/// Result of a successful export
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSummary {
    pub parts: Vec<PartStats>,
    pub bones: usize,
    pub frames: usize,
    /// Every file written, companions first
    pub files: Vec<PathBuf>,
}

/// Files created by an export in progress. Unless kept, they are removed
/// when this goes out of scope.
#[derive(Default)]
struct CreatedFiles {
    paths: Vec<PathBuf>,
    keep: bool,
}

impl CreatedFiles {
    fn create(&mut self, path: PathBuf) -> Result<TextFile> {
        let file = TextFile::create(&path)?;
        self.paths.push(path);
        Ok(file)
    }

    fn keep(mut self) -> Vec<PathBuf> {
        self.keep = true;
        std::mem::take(&mut self.paths)
    }
}

impl Drop for CreatedFiles {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for path in &self.paths {
            match fs::remove_file(path) {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Export `root` and its direct children to `path`.
///
/// Companion files are named after `path` (see `Bp3dFormat`). On failure every
/// file this call created is removed again and the host is left on frame 0.
pub fn export<H: SceneHost + ?Sized>(
    host: &mut H,
    root: ObjectId,
    path: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let root_name = host.object_name(root)?.to_string();
    let mut parts = vec![root];
    parts.extend(host.children_of(root));

    let mut created = CreatedFiles::default();

    let mut rig = None;
    let mut frames = 0;
    if let Some(armature) = host.armature_of(root)? {
        let bones = host.rest_bones(armature)?;
        let file = created.create(BP3D_FORMAT.armature_path(path))?;
        let (bone_map, skeleton) = write_skeleton(file, &bones)?;

        let range = options.frame_range.unwrap_or_else(|| host.frame_range());
        let file = created.create(BP3D_FORMAT.animation_path(path))?;
        let animation = write_animation(host, armature, range, &bone_map, file)?;
        frames = animation.frame_count;

        rig = Some((bone_map, skeleton));
    }

    let mut main = created.create(path.to_path_buf())?;
    let rigged = rig.is_some();
    let multi_material = parts.len() > 1;
    main.emit(|w| {
        write_header(w, BP3D_FORMAT.object_header)?;
        write_version(w, BP3D_FORMAT.version)?;
        if rigged {
            write_flag(w, "ArmatureAnimation")?;
        }
        if multi_material {
            write_flag(w, "MultiMaterial")?;
            write_alloc_mat(w, parts.len())?;
        }
        Ok(())
    })?;

    let mut offsets = GlobalOffsets::START;
    let mut stats = Vec::with_capacity(parts.len());
    for (index, &part) in parts.iter().enumerate() {
        let name = host.object_name(part)?.to_string();
        let mesh = host.triangulated_mesh(part)?;
        let dedup = deduplicate(&mesh, options.precision);

        main.emit(|w| {
            writeln!(w)?;
            if multi_material {
                let (vertex, uv, normal) = offsets.consumed();
                write_sub_material(w, index, vertex, uv, normal)?;
            }
            Ok(())
        })?;

        if let Some((bone_map, skeleton)) = rig.as_mut() {
            let groups = host.vertex_groups(part)?;
            skeleton.write_vertex_weights(&name, groups, &mesh.vertices, bone_map)?;
        }

        main.emit(|w| write_part(w, &mesh, &dedup, offsets, options.section_comments))?;

        let part_stats = PartStats {
            name,
            vertices: mesh.vertices.len(),
            normals: dedup.normals.len(),
            uvs: dedup.uvs.as_ref().map_or(0, Vec::len),
            triangles: mesh.triangle_count(),
        };
        tracing::debug!(
            "Part {} '{}': {} vertices, {} normals, {} uvs, {} triangles",
            index,
            part_stats.name,
            part_stats.vertices,
            part_stats.normals,
            part_stats.uvs,
            part_stats.triangles
        );
        offsets.advance(&part_stats)?;
        stats.push(part_stats);
    }

    let bones = rig.as_ref().map_or(0, |(bone_map, _)| bone_map.len());
    if let Some((_, skeleton)) = rig {
        skeleton.finish()?;
    }
    main.finish()?;

    let files = created.keep();
    tracing::info!(
        "Exported '{}': {} part(s), {} bone(s), {} frame(s) -> {}",
        root_name,
        stats.len(),
        bones,
        frames,
        path.display()
    );

    Ok(ExportSummary {
        parts: stats,
        bones,
        frames,
        files,
    })
}

/// Emit the vertex, normal, UV and face records of one part
fn write_part<W: Write>(
    w: &mut W,
    mesh: &TriangulatedMesh,
    dedup: &Deduplicated,
    offsets: GlobalOffsets,
    comments: bool,
) -> io::Result<()> {
    if comments {
        write_section(w, "Vertices")?;
    }
    for vertex in &mesh.vertices {
        write_position(w, vertex.position)?;
    }

    if comments {
        write_section(w, "Normals")?;
    }
    for &normal in &dedup.normals {
        write_normal(w, normal)?;
    }

    if let Some(uvs) = &dedup.uvs {
        if comments {
            write_section(w, "UVs")?;
        }
        for &uv in uvs {
            write_uv(w, uv)?;
        }
    }

    if comments {
        write_section(w, "Faces")?;
    }
    for (t, triangle) in mesh.triangles.iter().enumerate() {
        let face_uvs = dedup.face_uvs.as_ref().map(|f| f[t]);
        let mut corners = [FaceCorner {
            vertex: 0,
            uv: None,
            normal: 0,
        }; 3];
        for (c, &l) in triangle.loops.iter().enumerate() {
            corners[c] = FaceCorner {
                vertex: offsets.vertex + mesh.loops[l as usize].vertex,
                uv: face_uvs.map(|uvs| offsets.uv + uvs[c]),
                normal: offsets.normal + dedup.loop_normals[l as usize],
            };
        }
        write_face(w, &corners)?;
    }
    Ok(())
}
