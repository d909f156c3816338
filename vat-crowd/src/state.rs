//! Crowd placement and batching

use std::sync::atomic::AtomicBool;

use glam::{Mat4, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::config::CrowdConfig;
use crate::error::CrowdError;

/// One placed instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceRecord {
    /// Translation on the placement plane, identity rotation, unit scale
    pub transform: Mat4,
    /// Frame offset added to the shared playback clock
    pub start_frame: u32,
}

/// Instances submitted together in one instanced draw.
///
/// `transforms[i]` and `start_frames[i]` describe the same instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceBatch {
    pub transforms: Vec<Mat4>,
    pub start_frames: Vec<u32>,
}

impl InstanceBatch {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            transforms: Vec::with_capacity(capacity),
            start_frames: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, record: InstanceRecord) {
        self.transforms.push(record.transform);
        self.start_frames.push(record.start_frame);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = InstanceRecord> + '_ {
        self.transforms
            .iter()
            .zip(&self.start_frames)
            .map(|(&transform, &start_frame)| InstanceRecord {
                transform,
                start_frame,
            })
    }
}

/// Placed, batched crowd. Never modified after [`initialize`].
#[derive(Debug)]
pub struct CrowdState {
    batches: Vec<InstanceBatch>,
    instance_count: usize,
    batch_size: usize,
    seed: Option<u64>,
    /// Set once a renderer has refused the start-frame array
    pub(crate) offsets_warned: AtomicBool,
}

impl CrowdState {
    pub fn batches(&self) -> &[InstanceBatch] {
        &self.batches
    }

    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Seed that reproduces this crowd, if it was generated from one
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(InstanceBatch::len).collect()
    }

    /// Every instance in placement order
    pub fn records(&self) -> impl Iterator<Item = InstanceRecord> + '_ {
        self.batches.iter().flat_map(InstanceBatch::records)
    }
}

/// Place and batch a crowd.
///
/// Uses `config.seed` when present, otherwise a fresh random seed which is
/// kept in the returned state.
pub fn initialize(config: &CrowdConfig) -> Result<CrowdState, CrowdError> {
    let seed = config.seed.unwrap_or_else(rand::random::<u64>);
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut state = initialize_with_rng(config, &mut rng)?;
    state.seed = Some(seed);
    Ok(state)
}

/// Place and batch a crowd drawing from a caller-supplied generator
pub fn initialize_with_rng<R: Rng>(
    config: &CrowdConfig,
    rng: &mut R,
) -> Result<CrowdState, CrowdError> {
    let instance_count = config.validate()?;
    let batch_size = config.batch_size;
    let half_x = config.area[0] * 0.5;
    let half_z = config.area[2] * 0.5;

    let mut batches = Vec::with_capacity(instance_count.div_ceil(batch_size));
    let mut current = InstanceBatch::with_capacity(batch_size.min(instance_count));

    for _ in 0..instance_count {
        let position = Vec3::new(
            rng.random_range(-half_x..=half_x),
            config.plane_height,
            rng.random_range(-half_z..=half_z),
        );
        let start_frame = if config.max_start_frame > 0 {
            rng.random_range(0..config.max_start_frame)
        } else {
            0
        };

        current.push(InstanceRecord {
            transform: Mat4::from_translation(position),
            start_frame,
        });

        if current.len() == batch_size {
            let remaining = instance_count - batches.len() * batch_size - batch_size;
            batches.push(std::mem::replace(
                &mut current,
                InstanceBatch::with_capacity(batch_size.min(remaining)),
            ));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    tracing::debug!(
        "Placed {} instances in {} batches (cap {})",
        instance_count,
        batches.len(),
        batch_size
    );

    Ok(CrowdState {
        batches,
        instance_count,
        batch_size,
        seed: None,
        offsets_warned: AtomicBool::new(false),
    })
}
