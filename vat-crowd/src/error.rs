//! Crowd errors

/// Raised by [`crate::initialize`] for a configuration it cannot place.
///
/// Rendering never returns this; a renderer that cannot bind per-instance
/// data degrades instead (see [`crate::UnsupportedParameter`]).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CrowdError {
    /// Negative count, negative or non-finite extent, zero batch size
    #[error("invalid crowd configuration: {0}")]
    Configuration(String),
}
