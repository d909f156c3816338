//! Crowd instancing for vertex animation textures
//!
//! Places many copies of one baked mesh on a plane, gives each a random
//! start-frame offset so the crowd does not move in lockstep, and submits
//! them in fixed-size batches to a host [`InstancedRenderer`].
//!
//! ```
//! use vat_crowd::{CrowdConfig, initialize};
//!
//! let state = initialize(&CrowdConfig::new(1200, [40.0, 0.0, 40.0]).with_seed(1)).unwrap();
//! assert_eq!(state.batch_sizes(), vec![500, 500, 200]);
//! ```

mod config;
mod error;
mod render;
mod state;

pub use config::{CrowdConfig, DEFAULT_BATCH_SIZE, DEFAULT_MAX_START_FRAME};
pub use error::CrowdError;
pub use render::{InstancedRenderer, RenderStats, START_FRAME_PARAMETER, UnsupportedParameter, render};
pub use state::{CrowdState, InstanceBatch, InstanceRecord, initialize, initialize_with_rng};
