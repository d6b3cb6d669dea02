//! bp3d-export library
//!
//! Exports scene objects to BlockProject 3D text files: the main
//! `.bp3d.obj` mesh file plus skeleton and animation companions for rigged
//! objects.

pub mod animation;
pub mod dedup;
pub mod error;
pub mod export;
pub mod formats;
pub mod geometry;
pub mod host;
pub mod manifest;
pub mod reader;
pub mod report;
pub mod skeleton;

pub use bp3d_shared::{Bp3dFormat, Scene, BP3D_FORMAT};

pub use dedup::{deduplicate, AttributePool, Deduplicated, KeyPrecision, MAX_DECIMALS};
pub use error::{ExportError, Result};
pub use export::{export, ExportOptions, ExportSummary, GlobalOffsets, PartStats};
pub use geometry::TriangulatedMesh;
pub use host::{FrameRange, GeometrySource, PoseEvaluator, SceneGraph, SceneHost};
pub use reader::{AnimationDocument, ArmatureDocument, ObjectDocument, ReadError};
