//! Error taxonomy for the probing pipeline.
//!
//! Everything here is fatal for the run it occurs in: configuration and
//! action-space problems surface before any work is attempted, and an empty
//! episode source makes a meaningful split impossible. Insufficient-data
//! conditions that the pipeline can survive (an empty partition, a label key
//! dropped by the entropy filter) are logged as warnings instead and never
//! raised as errors.

use statelens_env::{CollectError, EpisodeShapeError};

/// Failure reported by an external probe trainer.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("probe trainer failed: {message}")]
pub struct ProbeError {
    /// Human-readable description from the trainer.
    pub message: String,
}

impl ProbeError {
    /// Wraps a trainer-side failure description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fatal errors of a probing run or sweep.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum PipelineError {
    /// Unsupported method/source combination or invalid option; no run is
    /// attempted.
    #[display("invalid configuration: {reason}")]
    Configuration { reason: String },
    /// The environment's action space cannot be sampled categorically.
    #[display("unsupported action space: {space}")]
    UnsupportedActionSpace { space: String },
    /// No usable episodes remain, so no meaningful split is possible.
    #[display("no usable episodes after {stage}")]
    EmptySource { stage: String },
    /// Episode tensors were internally inconsistent.
    #[display("malformed episode data: {_0}")]
    Shape(EpisodeShapeError),
    /// The external probe trainer failed; the sweep is aborted.
    #[display("{_0}")]
    Probe(ProbeError),
}

impl PipelineError {
    /// Convenience constructor for configuration failures.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub(crate) fn empty_source(stage: &str) -> Self {
        Self::EmptySource {
            stage: stage.to_owned(),
        }
    }
}

impl From<CollectError> for PipelineError {
    fn from(err: CollectError) -> Self {
        match err {
            CollectError::UnsupportedActionSpace { space } => {
                Self::UnsupportedActionSpace { space }
            }
            CollectError::Shape(err) => Self::Shape(err),
        }
    }
}

impl From<EpisodeShapeError> for PipelineError {
    fn from(err: EpisodeShapeError) -> Self {
        Self::Shape(err)
    }
}

impl From<ProbeError> for PipelineError {
    fn from(err: ProbeError) -> Self {
        Self::Probe(err)
    }
}
