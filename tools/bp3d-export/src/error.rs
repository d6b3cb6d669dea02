//! Export error type

use std::path::PathBuf;

/// Errors that abort an export
///
/// Any of these leaves no output behind: files created by the failed export
/// are removed before the error is returned.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("File system error on {path:?}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Object '{object}' references bone '{group}' which is not in the armature")]
    MissingArmatureData { object: String, group: String },

    #[error("Object '{object}' has a vertex in group index {index}, which is not declared")]
    InvalidVertexGroup { object: String, index: usize },

    #[error("Armature modifier targets '{target}', which is not an armature object")]
    MissingArmatureObject { target: String },

    #[error("Unknown object: {0}")]
    UnknownObject(String),

    #[error("Object '{0}' has no mesh data")]
    NotAMesh(String),

    #[error("Bone name '{0}' cannot be written (empty or contains whitespace)")]
    InvalidBoneName(String),

    #[error("Duplicate bone name '{0}'")]
    DuplicateBone(String),

    #[error("Malformed mesh on '{object}': {message}")]
    MalformedMesh { object: String, message: String },

    #[error("Object '{object}' has too many {what} for 32-bit file ids")]
    IdOverflow { object: String, what: &'static str },
}

impl ExportError {
    /// Wrap an I/O error with the path it happened on
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(object: &str, message: impl Into<String>) -> Self {
        ExportError::MalformedMesh {
            object: object.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
