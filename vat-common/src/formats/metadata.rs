//! Metadata sidecar (`<name>.vat.json`)
//!
//! Carries everything a runtime needs to turn texels back into positions:
//! the bounds used for normalization, the sample rate and the frame count.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ArtifactNames, FormatError, TextureEncoding, VAT_VERSION, is_bare_file_name};
use crate::bounds::BoundsBox;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatMetadata {
    pub version: u32,
    /// Bake name (file stem of every artifact)
    pub name: String,
    /// Name of the source animation clip
    pub clip: String,
    /// Clip length in seconds
    pub clip_length: f32,
    /// Frames per second
    pub sample_rate: f32,
    pub vertex_count: u32,
    pub frame_count: u32,
    pub bounds: BoundsBox,
    #[serde(default)]
    pub encoding: TextureEncoding,
    /// Texture file name, relative to the sidecar
    pub texture: String,
    /// Static mesh file name, relative to the sidecar
    pub mesh: String,
}

impl VatMetadata {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        clip: &str,
        clip_length: f32,
        sample_rate: f32,
        vertex_count: u32,
        frame_count: u32,
        bounds: BoundsBox,
        encoding: TextureEncoding,
    ) -> Self {
        let names = ArtifactNames::new(name, encoding);
        Self {
            version: VAT_VERSION,
            name: name.to_string(),
            clip: clip.to_string(),
            clip_length,
            sample_rate,
            vertex_count,
            frame_count,
            bounds,
            encoding,
            texture: names.texture,
            mesh: names.mesh,
        }
    }

    /// Seconds of animation covered by the baked frames
    pub fn baked_duration(&self) -> f32 {
        self.frame_count as f32 / self.sample_rate
    }

    pub fn to_json_pretty(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        let metadata: Self = serde_json::from_str(text)?;
        if metadata.version != VAT_VERSION {
            return Err(FormatError::UnsupportedVersion(metadata.version));
        }
        if !(metadata.sample_rate.is_finite() && metadata.sample_rate > 0.0) {
            return Err(FormatError::Invalid(format!(
                "metadata: sample rate {}",
                metadata.sample_rate
            )));
        }
        if !metadata.bounds.is_valid() {
            return Err(FormatError::Invalid(format!(
                "metadata: bounds min {:?} max {:?}",
                metadata.bounds.min, metadata.bounds.max
            )));
        }
        // Artifact files must sit next to the sidecar
        for file in [&metadata.texture, &metadata.mesh] {
            if !is_bare_file_name(file) {
                return Err(FormatError::Invalid(format!(
                    "metadata: '{}' is not a file name",
                    file
                )));
            }
        }
        Ok(metadata)
    }

    pub fn load(path: &Path) -> Result<Self, FormatError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VatMetadata {
        VatMetadata::new(
            "walker",
            "Walk",
            2.0,
            30.0,
            4,
            60,
            BoundsBox::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            TextureEncoding::Png16,
        )
    }

    #[test]
    fn test_new_fills_file_names() {
        let metadata = sample();
        assert_eq!(metadata.version, VAT_VERSION);
        assert_eq!(metadata.texture, "walker.png");
        assert_eq!(metadata.mesh, "walker.vatmesh");
        assert!((metadata.baked_duration() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_json_fields() {
        let json = sample().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["frame_count"], 60);
        assert_eq!(value["encoding"], "png16");
        assert_eq!(value["bounds"]["max"][1], 1.0);

        assert_eq!(VatMetadata::from_json(&json).unwrap(), sample());
    }

    #[test]
    fn test_rejects_future_version() {
        let mut metadata = sample();
        metadata.version = VAT_VERSION + 1;
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(matches!(
            VatMetadata::from_json(&json),
            Err(FormatError::UnsupportedVersion(v)) if v == VAT_VERSION + 1
        ));
    }

    #[test]
    fn test_rejects_zero_rate() {
        let mut metadata = sample();
        metadata.sample_rate = 0.0;
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(matches!(
            VatMetadata::from_json(&json),
            Err(FormatError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_bad_bounds() {
        let inverted = BoundsBox::new([0.0, 2.0, 0.0], [0.0, 1.0, 0.0]);
        let mut metadata = sample();
        metadata.bounds = inverted;
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(matches!(
            VatMetadata::from_json(&json),
            Err(FormatError::Invalid(_))
        ));

        // Out of f32 range, so not a finite corner
        let mut value = serde_json::to_value(sample()).unwrap();
        value["bounds"]["min"][0] = serde_json::json!(-1e39);
        let json = value.to_string();
        assert!(VatMetadata::from_json(&json).is_err());
    }

    #[test]
    fn test_rejects_paths_outside_bake_dir() {
        for file in ["../walker.png", "/tmp/walker.png", "sub/walker.png", ""] {
            let mut metadata = sample();
            metadata.texture = file.to_string();
            let json = serde_json::to_string(&metadata).unwrap();
            assert!(
                matches!(VatMetadata::from_json(&json), Err(FormatError::Invalid(_))),
                "texture {:?} accepted",
                file
            );

            let mut metadata = sample();
            metadata.mesh = file.to_string();
            let json = serde_json::to_string(&metadata).unwrap();
            assert!(VatMetadata::from_json(&json).is_err(), "mesh {:?} accepted", file);
        }
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walker.vat.json");
        std::fs::write(&path, sample().to_json_pretty().unwrap()).unwrap();
        assert_eq!(VatMetadata::load(&path).unwrap().clip, "Walk");
    }
}
