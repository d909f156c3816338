//! CPU playback of a baked clip
//!
//! Mirrors what a VAT vertex shader does: pick a texture row from the
//! playback time and the instance's start-frame offset, then map the texel
//! back into the bounds recorded at bake time.

use std::path::Path;

use crate::bounds::BoundsBox;
use crate::formats::{EncodedFrameTexture, FormatError, StaticMesh, VatMetadata, is_bare_file_name};

/// A loaded bake: sidecar metadata plus its decoded frame texture
#[derive(Debug, Clone)]
pub struct VatAnimation {
    metadata: VatMetadata,
    texture: EncodedFrameTexture,
}

impl VatAnimation {
    pub fn new(metadata: VatMetadata, texture: EncodedFrameTexture) -> Result<Self, FormatError> {
        if texture.width() != metadata.vertex_count || texture.height() != metadata.frame_count {
            return Err(FormatError::DimensionMismatch {
                width: texture.width(),
                height: texture.height(),
                expected_width: metadata.vertex_count,
                expected_height: metadata.frame_count,
            });
        }
        if metadata.frame_count == 0 {
            return Err(FormatError::Invalid("metadata: zero frames".to_string()));
        }
        Ok(Self { metadata, texture })
    }

    /// Load a bake from its `<name>.vat.json` sidecar.
    ///
    /// The texture path recorded in the sidecar is resolved relative to the
    /// sidecar's directory.
    pub fn load(sidecar: &Path) -> Result<Self, FormatError> {
        let metadata = VatMetadata::load(sidecar)?;
        let dir = sidecar.parent().unwrap_or_else(|| Path::new("."));
        let bytes = std::fs::read(dir.join(&metadata.texture))?;
        let texture = EncodedFrameTexture::decode(metadata.encoding, &bytes)?;
        tracing::debug!(
            "Loaded VAT '{}': {} vertices x {} frames",
            metadata.name,
            texture.width(),
            texture.height()
        );
        Self::new(metadata, texture)
    }

    /// Load the static mesh that belongs to a sidecar
    pub fn load_mesh(sidecar: &Path, metadata: &VatMetadata) -> Result<StaticMesh, FormatError> {
        if !is_bare_file_name(&metadata.mesh) {
            return Err(FormatError::Invalid(format!(
                "metadata: '{}' is not a file name",
                metadata.mesh
            )));
        }
        let dir = sidecar.parent().unwrap_or_else(|| Path::new("."));
        let mesh = StaticMesh::from_bytes(&std::fs::read(dir.join(&metadata.mesh))?)?;
        if mesh.vertex_count() != metadata.vertex_count as usize {
            return Err(FormatError::Invalid(format!(
                "mesh: {} vertices, metadata expects {}",
                mesh.vertex_count(),
                metadata.vertex_count
            )));
        }
        Ok(mesh)
    }

    pub fn metadata(&self) -> &VatMetadata {
        &self.metadata
    }

    pub fn texture(&self) -> &EncodedFrameTexture {
        &self.texture
    }

    pub fn bounds(&self) -> &BoundsBox {
        &self.metadata.bounds
    }

    pub fn frame_count(&self) -> u32 {
        self.metadata.frame_count
    }

    /// Texture row for `time` seconds of playback, offset by `start_frame`.
    /// Wraps around so playback loops.
    pub fn frame_at(&self, time: f32, start_frame: u32) -> u32 {
        let elapsed = (time.max(0.0) * self.metadata.sample_rate).floor() as u64;
        ((start_frame as u64 + elapsed) % self.metadata.frame_count as u64) as u32
    }

    /// Decoded local-space position of one vertex at one frame
    pub fn position(&self, vertex: usize, frame: u32) -> [f32; 3] {
        let texel = self.texture.get(vertex, frame as usize);
        self.metadata
            .bounds
            .denormalize([texel[0], texel[1], texel[2]])
    }

    /// Decoded positions of every vertex at one frame
    pub fn frame_positions(&self, frame: u32) -> Vec<[f32; 3]> {
        self.texture
            .row(frame as usize)
            .iter()
            .map(|texel| self.metadata.bounds.denormalize([texel[0], texel[1], texel[2]]))
            .collect()
    }
}
