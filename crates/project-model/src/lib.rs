//! Reelsmith Project Model
//!
//! Defines the core data contracts consumed and produced by the assembly
//! engine:
//! - **Scene:** one planned visual segment (clip, still image, or filler)
//! - **Timeline:** scenes placed back to back with start/end times
//! - **Transcript:** timed words from the speech-to-text collaborator
//! - **Style:** immutable caption styling selected once per job
//! - **Job:** render requests and the poll-able progress record
//!
//! Every record arriving from an external collaborator is validated when it
//! is deserialized, so a missing or nonsensical field fails at the boundary
//! instead of deep inside a render stage.

pub mod job;
pub mod scene;
pub mod style;
pub mod timeline;
pub mod transcript;

pub use job::*;
pub use scene::*;
pub use style::*;
pub use timeline::*;
pub use transcript::*;

/// Validation failure for an incoming record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ModelError {
    pub field: &'static str,
    pub reason: String,
}

impl ModelError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check that a duration is finite and strictly positive.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, ModelError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ModelError::new(
            field,
            format!("must be a positive number of seconds, got {value}"),
        ))
    }
}
