//! Shared types and utilities for vertex animation textures (VAT)
//!
//! This crate is shared between:
//! - `vat-export` (offline baker)
//! - `vat-crowd` and any runtime that plays baked clips back
//!
//! # Modules
//!
//! - [`bounds`] - Bounds discovery and `[min, max]` ↔ `[0, 1]` normalization
//! - [`packing`] - Texel packing utilities (f32 → unorm16 / f16)
//! - [`formats`] - Binary and sidecar artifact formats
//! - [`playback`] - CPU reference decoder for baked clips

pub mod bounds;
pub mod formats;
pub mod packing;
pub mod playback;

pub use bounds::BoundsBox;
pub use formats::{
    ArtifactNames, EncodedFrameTexture, FormatError, StaticMesh, TextureEncoding, VatMeshHeader,
    VatMetadata, VatTextureHeader, FORMAT_NORMAL, FORMAT_UV, METADATA_EXT, MESH_EXT, VAT_VERSION,
    is_bare_file_name,
};
pub use playback::VatAnimation;
