//! Two-pass VAT bake
//!
//! Pass 1 samples every frame of the clip and folds all vertex positions
//! into one [`BoundsBox`]. Pass 2 normalizes each position into `[0, 1]`
//! with those bounds and writes it to the frame texture at
//! `(vertex, frame)`.
//!
//! Frame `f` is sampled at `f / sample_rate` seconds and there are
//! `floor(clip_length * sample_rate)` frames, so the clip end is never
//! sampled when the product is integral.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use vat_common::{BoundsBox, EncodedFrameTexture, StaticMesh, TextureEncoding, VatMetadata};

use crate::error::BakeError;

/// Default sample rate (frames per second)
pub const DEFAULT_SAMPLE_RATE: f32 = 30.0;

/// Largest `vertex_count * frame_count` kept in memory by [`SampleRetention::Auto`]
pub const DEFAULT_RETENTION_LIMIT: usize = 8 * 1024 * 1024;

/// A named clip with a fixed length
pub trait AnimationClip {
    fn name(&self) -> &str;

    /// Length in seconds
    fn length(&self) -> f32;
}

/// A mesh that can report its deformed vertex positions at any clip time.
///
/// Positions are in the mesh's own reference frame and in the same vertex
/// order as [`reference_mesh`](Self::reference_mesh). Sampling must not
/// change the mesh or the clip.
pub trait DeformableMesh {
    type Clip: AnimationClip;

    fn vertex_count(&self) -> usize;

    /// Reference-pose topology shared by every instance of the bake
    fn reference_mesh(&self) -> StaticMesh;

    /// Replace `out` with the deformed positions at `time` seconds
    fn sample_at(
        &self,
        clip: &Self::Clip,
        time: f32,
        out: &mut Vec<[f32; 3]>,
    ) -> Result<(), BakeError>;
}

/// Whether pass 1 keeps its samples for pass 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleRetention {
    /// Retain up to [`BakeOptions::retention_limit`] positions, stream above it
    #[default]
    Auto,
    /// Keep every frame from pass 1
    Retain,
    /// Sample each frame again in pass 2
    Stream,
}

/// Cooperative cancellation flag, checked once per sampled frame
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct BakeOptions {
    /// Frames per second
    pub sample_rate: f32,
    pub retention: SampleRetention,
    pub retention_limit: usize,
    pub cancel: CancelToken,
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            retention: SampleRetention::Auto,
            retention_limit: DEFAULT_RETENTION_LIMIT,
            cancel: CancelToken::new(),
        }
    }
}

/// Everything a finished bake produced
#[derive(Debug, Clone)]
pub struct BakeOutput {
    pub mesh: StaticMesh,
    pub texture: EncodedFrameTexture,
    pub bounds: BoundsBox,
    pub clip_name: String,
    pub clip_length: f32,
    pub sample_rate: f32,
    pub frame_count: u32,
}

impl BakeOutput {
    pub fn vertex_count(&self) -> u32 {
        self.texture.width()
    }

    /// Sidecar describing this bake under `name`
    pub fn metadata(&self, name: &str, encoding: TextureEncoding) -> VatMetadata {
        VatMetadata::new(
            name,
            &self.clip_name,
            self.clip_length,
            self.sample_rate,
            self.vertex_count(),
            self.frame_count,
            self.bounds,
            encoding,
        )
    }
}

/// Builder for a bake. The mesh and clip are required.
///
/// ```ignore
/// let output = BakeRequest::new()
///     .mesh(&mesh)
///     .clip(&clip)
///     .sample_rate(60.0)
///     .run()?;
/// ```
pub struct BakeRequest<'a, M: DeformableMesh> {
    mesh: Option<&'a M>,
    clip: Option<&'a M::Clip>,
    options: BakeOptions,
}

impl<'a, M: DeformableMesh> Default for BakeRequest<'a, M> {
    fn default() -> Self {
        Self {
            mesh: None,
            clip: None,
            options: BakeOptions::default(),
        }
    }
}

impl<'a, M: DeformableMesh> BakeRequest<'a, M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(mut self, mesh: &'a M) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn clip(mut self, clip: &'a M::Clip) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.options.sample_rate = sample_rate;
        self
    }

    pub fn retention(mut self, retention: SampleRetention) -> Self {
        self.options.retention = retention;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.options.cancel = cancel;
        self
    }

    pub fn options(mut self, options: BakeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn run(self) -> Result<BakeOutput, BakeError> {
        let mesh = self
            .mesh
            .ok_or_else(|| BakeError::Configuration("no mesh to bake".to_string()))?;
        let clip = self
            .clip
            .ok_or_else(|| BakeError::Configuration("no animation clip to bake".to_string()))?;
        bake_with_options(mesh, clip, &self.options)
    }
}

/// Bake `clip` on `mesh` at `sample_rate` frames per second
pub fn bake<M: DeformableMesh>(
    mesh: &M,
    clip: &M::Clip,
    sample_rate: f32,
) -> Result<BakeOutput, BakeError> {
    let options = BakeOptions {
        sample_rate,
        ..BakeOptions::default()
    };
    bake_with_options(mesh, clip, &options)
}

/// Number of frames a clip yields at a sample rate
pub fn frame_count(clip_length: f32, sample_rate: f32) -> Result<u32, BakeError> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(BakeError::Configuration(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }
    if !(clip_length.is_finite() && clip_length > 0.0) {
        return Err(BakeError::Configuration(format!(
            "clip length must be positive, got {}",
            clip_length
        )));
    }

    let frames = (clip_length as f64 * sample_rate as f64).floor();
    if frames < 1.0 {
        return Err(BakeError::Configuration(format!(
            "clip of {}s is shorter than one frame at {} fps",
            clip_length, sample_rate
        )));
    }
    if frames > u32::MAX as f64 {
        return Err(BakeError::Configuration(format!(
            "{} frames do not fit a texture",
            frames
        )));
    }
    Ok(frames as u32)
}

pub fn bake_with_options<M: DeformableMesh>(
    mesh: &M,
    clip: &M::Clip,
    options: &BakeOptions,
) -> Result<BakeOutput, BakeError> {
    let sample_rate = options.sample_rate;
    let frames = frame_count(clip.length(), sample_rate)?;
    let frame_total = frames as usize;

    let vertex_count = mesh.vertex_count();
    if vertex_count == 0 {
        return Err(BakeError::UnsupportedMesh("mesh has no vertices".to_string()));
    }
    let width = u32::try_from(vertex_count).map_err(|_| {
        BakeError::Configuration(format!("{} vertices do not fit a texture", vertex_count))
    })?;

    let reference = mesh.reference_mesh();
    if reference.vertex_count() != vertex_count {
        return Err(BakeError::UnsupportedMesh(format!(
            "reference mesh has {} vertices, deformed stream has {}",
            reference.vertex_count(),
            vertex_count
        )));
    }

    let retain = match options.retention {
        SampleRetention::Retain => true,
        SampleRetention::Stream => false,
        SampleRetention::Auto => {
            vertex_count.saturating_mul(frame_total) <= options.retention_limit
        }
    };
    tracing::debug!(
        "Baking '{}': {} vertices x {} frames at {} fps ({})",
        clip.name(),
        vertex_count,
        frames,
        sample_rate,
        if retain { "retained" } else { "streaming" }
    );

    // Pass 1: bounds discovery
    let mut bounds = BoundsBox::empty();
    let mut retained: Vec<[f32; 3]> = Vec::new();
    if retain {
        retained.reserve_exact(vertex_count * frame_total);
    }
    let mut positions = Vec::with_capacity(vertex_count);
    for frame in 0..frame_total {
        sample_frame(mesh, clip, frame, sample_rate, options, &mut positions)?;
        bounds.include_all(&positions);
        if retain {
            retained.extend_from_slice(&positions);
        }
    }

    // Pass 2: normalize and encode
    let mut texture = EncodedFrameTexture::new(width, frames);
    for frame in 0..frame_total {
        let frame_positions: &[[f32; 3]] = if retain {
            &retained[frame * vertex_count..(frame + 1) * vertex_count]
        } else {
            sample_frame(mesh, clip, frame, sample_rate, options, &mut positions)?;
            &positions
        };
        for (vertex, &position) in frame_positions.iter().enumerate() {
            texture.set(vertex, frame, bounds.normalize(position));
        }
    }

    tracing::info!(
        "Baked '{}': {} vertices, {} frames at {} fps, bounds min {:?} max {:?}",
        clip.name(),
        vertex_count,
        frames,
        sample_rate,
        bounds.min,
        bounds.max
    );

    Ok(BakeOutput {
        mesh: reference,
        texture,
        bounds,
        clip_name: clip.name().to_string(),
        clip_length: clip.length(),
        sample_rate,
        frame_count: frames,
    })
}

fn sample_frame<M: DeformableMesh>(
    mesh: &M,
    clip: &M::Clip,
    frame: usize,
    sample_rate: f32,
    options: &BakeOptions,
    out: &mut Vec<[f32; 3]>,
) -> Result<(), BakeError> {
    if options.cancel.is_cancelled() {
        tracing::debug!("Bake of '{}' cancelled at frame {}", clip.name(), frame);
        return Err(BakeError::Cancelled);
    }

    let time = frame as f32 / sample_rate;
    mesh.sample_at(clip, time, out)?;

    if out.len() != mesh.vertex_count() {
        return Err(BakeError::UnsupportedMesh(format!(
            "evaluator returned {} positions for {} vertices at frame {}",
            out.len(),
            mesh.vertex_count(),
            frame
        )));
    }
    if out.iter().flatten().any(|c| !c.is_finite()) {
        return Err(BakeError::UnsupportedMesh(format!(
            "evaluator returned a non-finite position at frame {}",
            frame
        )));
    }
    Ok(())
}
