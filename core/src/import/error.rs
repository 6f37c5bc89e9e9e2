//! Error types for mesh import.

use std::path::PathBuf;

/// Recoverable failures of [`import_mesh`](super::import_mesh).
///
/// Content-integrity violations (missing positions, non-triangular faces,
/// out-of-range bone weights) are not represented here: they panic.
#[derive(Debug)]
pub enum ImportError {
    /// The model file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The parsing backend rejected the file.
    Parse(gltf_dep::Error),
    /// The file parsed but contains no meshes.
    NoMeshes { path: PathBuf },
    /// A buffer could not be resolved.
    Buffer(String),
    /// Accessor data could not be read.
    Accessor(String),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read '{}': {source}", path.display())
            }
            Self::Parse(e) => write!(f, "parse error: {e}"),
            Self::NoMeshes { path } => write!(f, "'{}' contains no meshes", path.display()),
            Self::Buffer(msg) => write!(f, "buffer error: {msg}"),
            Self::Accessor(msg) => write!(f, "accessor error: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<gltf_dep::Error> for ImportError {
    fn from(e: gltf_dep::Error) -> Self {
        Self::Parse(e)
    }
}
