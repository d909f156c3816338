//! Crowd configuration
//!
//! Deserializable from the `[crowd]` table of a `vat.toml` manifest:
//!
//! ```toml
//! [crowd]
//! instance_count = 1200
//! area = [40.0, 0.0, 40.0]
//! batch_size = 500
//! seed = 7
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CrowdError;

/// Instanced-draw ceiling per batch
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Exclusive upper bound of random start-frame offsets
pub const DEFAULT_MAX_START_FRAME: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrowdConfig {
    /// Number of instances to place. Signed so a negative request is
    /// reported rather than wrapped.
    pub instance_count: i64,

    /// Placement extents; X and Z span `[-extent/2, extent/2]`, Y is unused
    pub area: [f32; 3],

    /// Y coordinate of every instance
    pub plane_height: f32,

    pub batch_size: usize,

    /// Start frames are drawn from `[0, max_start_frame)`; 0 disables offsets
    pub max_start_frame: u32,

    /// Fixed seed for a reproducible crowd, random when absent
    pub seed: Option<u64>,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            instance_count: 100,
            area: [10.0, 0.0, 10.0],
            plane_height: 0.0,
            batch_size: DEFAULT_BATCH_SIZE,
            max_start_frame: DEFAULT_MAX_START_FRAME,
            seed: None,
        }
    }
}

impl CrowdConfig {
    pub fn new(instance_count: i64, area: [f32; 3]) -> Self {
        Self {
            instance_count,
            area,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Check every field, returning the instance count on success
    pub fn validate(&self) -> Result<usize, CrowdError> {
        if self.instance_count < 0 {
            return Err(CrowdError::Configuration(format!(
                "instance count {} is negative",
                self.instance_count
            )));
        }
        for (axis, extent) in ['x', 'y', 'z'].into_iter().zip(self.area) {
            if !extent.is_finite() || extent < 0.0 {
                return Err(CrowdError::Configuration(format!(
                    "area.{} is {} (must be finite and >= 0)",
                    axis, extent
                )));
            }
        }
        if !self.plane_height.is_finite() {
            return Err(CrowdError::Configuration(format!(
                "plane height {} is not finite",
                self.plane_height
            )));
        }
        if self.batch_size == 0 {
            return Err(CrowdError::Configuration(
                "batch size must be at least 1".to_string(),
            ));
        }
        usize::try_from(self.instance_count).map_err(|_| {
            CrowdError::Configuration(format!(
                "instance count {} does not fit this platform",
                self.instance_count
            ))
        })
    }
}
