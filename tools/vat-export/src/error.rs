//! Bake errors

use std::path::PathBuf;

use vat_common::FormatError;

/// Why a bake (or writing its artifacts) failed.
///
/// Every variant aborts the bake; nothing is written to the output
/// directory once one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    /// Missing mesh or clip, unusable clip length or sample rate
    #[error("invalid bake configuration: {0}")]
    Configuration(String),

    /// The mesh has no deformable vertex stream to sample
    #[error("unsupported mesh: {0}")]
    UnsupportedMesh(String),

    #[error("bake cancelled")]
    Cancelled,

    /// A running bake holds the lock for this output name
    #[error("output is locked by another bake: {0:?} (delete the file if no bake is running)")]
    OutputLocked(PathBuf),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load glTF {path:?}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
}

impl BakeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BakeError::Io {
            path: path.into(),
            source,
        }
    }
}
