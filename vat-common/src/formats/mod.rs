//! VAT artifact formats
//!
//! A bake named `<name>` produces three artifacts side by side:
//!
//! | file                 | contents                                   |
//! |----------------------|--------------------------------------------|
//! | `<name>.png`         | encoded frame texture (RGBA unorm16 PNG)   |
//! | `<name>.vattex`      | encoded frame texture (RGBA f16, POD)      |
//! | `<name>.vatmesh`     | static reference-pose mesh (POD)           |
//! | `<name>.vat.json`    | bounds + bake metadata sidecar             |
//!
//! Only one of the two texture files is written, selected by
//! [`TextureEncoding`]. The POD formats carry no magic bytes; the sidecar
//! names the files that belong to the bake.

pub mod mesh;
pub mod metadata;
pub mod texture;

pub use mesh::*;
pub use metadata::*;
pub use texture::*;

/// Static mesh file extension
pub const MESH_EXT: &str = "vatmesh";

/// Metadata sidecar extension (appended to the bake name)
pub const METADATA_EXT: &str = "vat.json";

/// Sidecar format version
pub const VAT_VERSION: u32 = 1;

/// Errors raised while reading or writing VAT artifacts
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("{what} truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("texture is {width}x{height}, metadata expects {expected_width}x{expected_height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("unsupported metadata version {0} (expected {current})", current = VAT_VERSION)]
    UnsupportedVersion(u32),

    #[error("invalid {0}")]
    Invalid(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// File names of the artifacts belonging to one bake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub texture: String,
    pub mesh: String,
    pub metadata: String,
}

impl ArtifactNames {
    pub fn new(name: &str, encoding: TextureEncoding) -> Self {
        Self {
            texture: format!("{}.{}", name, encoding.extension()),
            mesh: format!("{}.{}", name, MESH_EXT),
            metadata: format!("{}.{}", name, METADATA_EXT),
        }
    }
}

/// Whether `name` is a single file name with no directory part.
///
/// Rejects empty names, `.`/`..`, path separators and control characters,
/// so joining it onto a directory never leaves that directory.
pub fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
        && !name.chars().any(char::is_control)
}
