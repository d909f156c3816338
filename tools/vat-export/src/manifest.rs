//! Manifest parsing and build orchestration
//!
//! Parses `vat.toml` and bakes every listed clip:
//!
//! ```toml
//! [output]
//! dir = "vat/"
//! encoding = "png16"
//!
//! [bakes]
//! idle = "characters/villager.glb"
//!
//! [bakes.walk]
//! source = "characters/villager.glb"
//! animation = "Walk"
//! frame_rate = 60.0
//! mesh = "Body"
//! encoding = "f16"
//!
//! [crowd]
//! instance_count = 1200
//! area = [40.0, 0.0, 40.0]
//! ```
//!
//! Relative paths are resolved against the manifest's directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use vat_common::TextureEncoding;
use vat_crowd::CrowdConfig;

use crate::artifacts::{ArtifactPaths, OutputLock};
use crate::bake::{BakeRequest, CancelToken, DEFAULT_SAMPLE_RATE};
use crate::error::BakeError;
use crate::source::GltfSource;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub bakes: BTreeMap<String, BakeEntry>,
    #[serde(default)]
    pub crowd: Option<CrowdConfig>,
    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub encoding: TextureEncoding,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            encoding: TextureEncoding::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("vat/")
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BakeEntry {
    /// Source file only: first skinned mesh, first animation, default rate
    Simple(PathBuf),
    Detailed {
        source: PathBuf,
        #[serde(default)]
        animation: Option<String>,
        #[serde(default)]
        frame_rate: Option<f32>,
        #[serde(default)]
        mesh: Option<String>,
        #[serde(default)]
        encoding: Option<TextureEncoding>,
    },
}

impl BakeEntry {
    pub fn source(&self) -> &Path {
        match self {
            BakeEntry::Simple(p) => p,
            BakeEntry::Detailed { source, .. } => source,
        }
    }

    pub fn animation(&self) -> Option<&str> {
        match self {
            BakeEntry::Simple(_) => None,
            BakeEntry::Detailed { animation, .. } => animation.as_deref(),
        }
    }

    pub fn frame_rate(&self) -> f32 {
        match self {
            BakeEntry::Simple(_) => DEFAULT_SAMPLE_RATE,
            BakeEntry::Detailed { frame_rate, .. } => frame_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
        }
    }

    pub fn mesh(&self) -> Option<&str> {
        match self {
            BakeEntry::Simple(_) => None,
            BakeEntry::Detailed { mesh, .. } => mesh.as_deref(),
        }
    }

    /// Per-bake encoding, falling back to the manifest default
    pub fn encoding(&self, default: TextureEncoding) -> TextureEncoding {
        match self {
            BakeEntry::Simple(_) => default,
            BakeEntry::Detailed { encoding, .. } => encoding.unwrap_or(default),
        }
    }
}

impl Manifest {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output.dir)
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    manifest.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    for (name, entry) in &manifest.bakes {
        let source = manifest.resolve(entry.source());
        if !source.exists() {
            anyhow::bail!("Bake '{}' source not found: {:?}", name, source);
        }
        let rate = entry.frame_rate();
        if !(rate.is_finite() && rate > 0.0) {
            anyhow::bail!("Bake '{}' has invalid frame rate {}", name, rate);
        }
    }
    if let Some(crowd) = &manifest.crowd {
        crowd.validate().context("Invalid [crowd] section")?;
    }
    Ok(())
}

/// Bake every entry of a manifest, returning the artifacts written per bake.
///
/// Cancelling `cancel` stops the current bake; bakes already written stay.
pub fn build_all(
    manifest: &Manifest,
    output_override: Option<&Path>,
    cancel: &CancelToken,
) -> Result<Vec<(String, ArtifactPaths)>> {
    validate(manifest)?;
    let output_dir = output_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest.output_dir());

    let mut written = Vec::with_capacity(manifest.bakes.len());
    for (name, entry) in &manifest.bakes {
        if cancel.is_cancelled() {
            return Err(BakeError::Cancelled).with_context(|| format!("Bake '{}'", name));
        }
        let source_path = manifest.resolve(entry.source());
        tracing::info!("Baking {} <- {:?}", name, source_path);

        let lock = OutputLock::acquire(&output_dir, name)
            .with_context(|| format!("Bake '{}'", name))?;
        let source = GltfSource::open(&source_path)?;
        let mesh = source
            .skinned_mesh(entry.mesh())
            .with_context(|| format!("Bake '{}'", name))?;
        let clip = source
            .clip(entry.animation())
            .with_context(|| format!("Bake '{}'", name))?;

        let output = BakeRequest::new()
            .mesh(&mesh)
            .clip(&clip)
            .sample_rate(entry.frame_rate())
            .cancel_token(cancel.clone())
            .run()
            .with_context(|| format!("Bake '{}' failed", name))?;
        let paths = lock.write(&output, entry.encoding(manifest.output.encoding))?;
        written.push((name.clone(), paths));
    }
    Ok(written)
}
