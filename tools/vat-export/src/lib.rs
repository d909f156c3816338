//! vat-export library
//!
//! Bakes skeletal animation clips into vertex animation textures: a static
//! reference mesh, a (vertex × frame) texture of normalized positions and
//! the bounds needed to decode it.
//!
//! The baker works on any [`DeformableMesh`]; [`GltfSource`] provides one
//! for skinned glTF/GLB assets.

pub mod animation;
pub mod artifacts;
pub mod bake;
pub mod error;
pub mod manifest;
pub mod skin;
pub mod source;

pub use animation::GltfClip;
pub use artifacts::{ArtifactPaths, OutputLock, write_artifacts};
pub use bake::{
    AnimationClip, BakeOptions, BakeOutput, BakeRequest, CancelToken, DEFAULT_SAMPLE_RATE,
    DeformableMesh, SampleRetention, bake, bake_with_options,
};
pub use error::BakeError;
pub use skin::GltfSkinnedMesh;
pub use source::{ClipInfo, GltfSource, SkinnedMeshInfo};

// Re-export artifact types from vat-common
pub use vat_common::{BoundsBox, EncodedFrameTexture, StaticMesh, TextureEncoding, VatMetadata};
