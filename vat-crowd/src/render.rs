//! Batched instanced submission

use std::sync::atomic::Ordering;

use glam::Mat4;

use crate::state::CrowdState;

/// Material array parameter that receives each batch's start frames
pub const START_FRAME_PARAMETER: &str = "_AnimStartFrame";

/// The renderer or material cannot bind a per-instance array parameter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("material does not accept array parameter '{name}'")]
pub struct UnsupportedParameter {
    pub name: String,
}

impl UnsupportedParameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Host-side instanced draw primitive plus the material parameter hook
pub trait InstancedRenderer {
    type Mesh: ?Sized;
    type Material: ?Sized;

    /// Bind a float array to `material` for the next draw
    fn set_float_array(
        &mut self,
        material: &Self::Material,
        name: &str,
        values: &[f32],
    ) -> Result<(), UnsupportedParameter>;

    /// Draw `mesh` once per transform in a single submission
    fn draw_instanced(&mut self, mesh: &Self::Mesh, material: &Self::Material, transforms: &[Mat4]);
}

/// What one [`render`] call submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: usize,
    pub instances: usize,
    /// Batches whose start frames reached the material
    pub offsets_bound: usize,
}

/// Submit every batch of `state` as one instanced draw.
///
/// Start frames are bound to [`START_FRAME_PARAMETER`] before each draw. A
/// renderer that refuses the parameter still gets the draw, and the crowd
/// plays in sync; this is logged once per state.
pub fn render<R: InstancedRenderer>(
    state: &CrowdState,
    renderer: &mut R,
    mesh: &R::Mesh,
    material: &R::Material,
) -> RenderStats {
    let mut stats = RenderStats::default();
    let mut offsets: Vec<f32> = Vec::with_capacity(state.batch_size().min(state.instance_count()));

    for batch in state.batches() {
        offsets.clear();
        offsets.extend(batch.start_frames.iter().map(|&frame| frame as f32));

        match renderer.set_float_array(material, START_FRAME_PARAMETER, &offsets) {
            Ok(()) => stats.offsets_bound += 1,
            Err(err) => {
                if !state.offsets_warned.swap(true, Ordering::Relaxed) {
                    tracing::warn!("{}; crowd will play in sync", err);
                }
            }
        }

        renderer.draw_instanced(mesh, material, &batch.transforms);
        stats.draw_calls += 1;
        stats.instances += batch.len();
    }

    stats
}
