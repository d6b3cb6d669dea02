//! Scene dump model
//!
//! A `Scene` is the serializable stand-in for a host editor scene: the object
//! collection with parent links, world matrices, evaluated mesh data, vertex
//! groups, modifiers and armatures, plus the animation frame state.
//!
//! Scenes are exchanged as JSON:
//!
//! ```
//! use bp3d_shared::Scene;
//!
//! let scene = Scene::from_json(r#"{
//!     "frame_start": 0,
//!     "frame_end": 10,
//!     "objects": [
//!         { "name": "Body" },
//!         { "name": "Hat", "parent": "Body" }
//!     ]
//! }"#).unwrap();
//!
//! let body = scene.object_id("Body").unwrap();
//! assert_eq!(scene.children_of(body).len(), 1);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::WorldTransform;
use crate::pose::{LocalPose, PoseTrack};

/// Errors raised while loading a scene dump
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to read scene {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scene: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate object name '{0}'")]
    DuplicateObject(String),

    #[error("Object '{object}' references unknown parent '{parent}'")]
    UnknownParent { object: String, parent: String },
}

/// Index of an object inside its scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Position of the object in scene enumeration order
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

const IDENTITY_COLS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn identity_cols() -> [[f32; 4]; 4] {
    IDENTITY_COLS
}

/// Host scene: objects plus the animation frame state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub frame_start: i32,
    #[serde(default)]
    pub frame_end: i32,
    #[serde(default)]
    pub frame_current: i32,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

/// One object of the scene graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,

    /// Name of the parent object, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Object-to-world matrix, column-major
    #[serde(default = "identity_cols")]
    pub matrix_world: [[f32; 4]; 4],

    /// Evaluated mesh data (object space)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshData>,

    /// Vertex group names, indexed by `GroupWeight::group`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertex_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,

    /// Armature data when the object is an armature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armature: Option<ArmatureData>,
}

impl SceneObject {
    /// Create an empty object with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            matrix_world: IDENTITY_COLS,
            mesh: None,
            vertex_groups: Vec::new(),
            modifiers: Vec::new(),
            armature: None,
        }
    }

    pub fn world_transform(&self) -> WorldTransform {
        WorldTransform::from_cols(&self.matrix_world)
    }

    /// Target object name of the first armature modifier
    pub fn armature_modifier(&self) -> Option<&str> {
        self.modifiers
            .iter()
            .find(|m| m.is_armature())
            .and_then(|m| m.object.as_deref())
    }
}

/// Object modifier. Only armature modifiers matter to the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    /// Modifier type as reported by the host (e.g., "ARMATURE")
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    /// Target object for armature modifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl Modifier {
    /// Armature modifier deforming with `object`
    pub fn armature(object: impl Into<String>) -> Self {
        Self {
            kind: "ARMATURE".to_string(),
            name: "Armature".to_string(),
            object: Some(object.into()),
        }
    }

    pub fn is_armature(&self) -> bool {
        self.kind.eq_ignore_ascii_case("armature")
    }
}

/// Polygon mesh in object space
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub polygons: Vec<Polygon>,
    /// UV layers, each holding one coordinate per loop in polygon-corner order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uv_layers: Vec<UvLayer>,
    /// Index of the active UV layer (defaults to the first layer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_uv_layer: Option<usize>,
}

impl MeshData {
    /// Total number of polygon corners
    pub fn loop_count(&self) -> usize {
        self.polygons.iter().map(|p| p.vertices.len()).sum()
    }

    /// The layer used for export, if the mesh has any UVs
    pub fn active_uv_layer(&self) -> Option<&UvLayer> {
        let index = self.active_uv_layer.unwrap_or(0);
        self.uv_layers.get(index)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshVertex {
    pub co: [f32; 3],
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupWeight>,
}

/// Vertex group membership
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    /// Index into the owning object's `vertex_groups`
    pub group: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertex indices, counter-clockwise
    pub vertices: Vec<u32>,
    /// Split normals, one per corner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<[f32; 3]>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UvLayer {
    #[serde(default)]
    pub name: String,
    pub data: Vec<[f32; 2]>,
}

/// Armature rest pose and animation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmatureData {
    /// Bones in hierarchy order
    pub bones: Vec<BoneData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<PoseTrack>,
}

impl ArmatureData {
    /// Local pose of every bone at `frame`, in bone order
    pub fn pose_at(&self, frame: i32) -> Vec<(&str, LocalPose)> {
        self.bones
            .iter()
            .map(|bone| {
                let pose = self
                    .tracks
                    .iter()
                    .find(|t| t.bone == bone.name)
                    .map(|t| t.sample(frame as f32))
                    .unwrap_or_default();
                (bone.name.as_str(), pose)
            })
            .collect()
    }
}

/// Rest-pose bone, positions local to the armature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub head: [f32; 3],
    pub tail: [f32; 3],
}

impl Scene {
    /// Load a scene dump from a JSON file
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a scene dump
    pub fn from_json(content: &str) -> Result<Self, SceneError> {
        let mut scene: Scene = serde_json::from_str(content)?;
        scene.prepare()?;
        Ok(scene)
    }

    pub fn to_json_pretty(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate names and parent links, and sort animation keys.
    pub fn prepare(&mut self) -> Result<(), SceneError> {
        let mut names = HashSet::new();
        for object in &self.objects {
            if !names.insert(object.name.as_str()) {
                return Err(SceneError::DuplicateObject(object.name.clone()));
            }
        }

        for object in &self.objects {
            if let Some(parent) = &object.parent {
                if !names.contains(parent.as_str()) {
                    return Err(SceneError::UnknownParent {
                        object: object.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for object in &mut self.objects {
            if let Some(armature) = &mut object.armature {
                for track in &mut armature.tracks {
                    track.sort_keys();
                }
            }
        }

        Ok(())
    }

    pub fn object_id(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(ObjectId)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    /// All objects with their ids, in enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    /// Direct children of `id`, in enumeration order
    pub fn children_of(&self, id: ObjectId) -> Vec<ObjectId> {
        let Some(parent) = self.get(id) else {
            return Vec::new();
        };
        self.iter()
            .filter(|(_, o)| o.parent.as_deref() == Some(parent.name.as_str()))
            .map(|(child, _)| child)
            .collect()
    }
}
