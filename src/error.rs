//! Error taxonomy shared by every pipeline stage.
//!
//! Each stage fails fast and hands its error up unchanged; the pipeline never
//! substitutes a partial image for a failed stage. Callers map errors to
//! user-facing messages through [`PipelineError::category`]:
//!
//! | Category | Variants | Caller policy |
//! |---|---|---|
//! | [`ErrorCategory::InvalidInput`] | `UnsupportedFormat`, `MissingAlphaChannel` | report, no retry |
//! | [`ErrorCategory::Detection`] | `NoFaceDetected`, `EmptySubject` | ask for a clearer photo |
//! | [`ErrorCategory::Resource`] | `FontLoadFailure`, `ModelUnavailable` | may retry once with backoff |
//! | [`ErrorCategory::Internal`] | `ProcessingFailed` | log, report generic failure |

use crate::imaging::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported image format: {channels} channel(s), expected 1, 3 or 4")]
    UnsupportedFormat { channels: u8 },
    #[error("no face detected")]
    NoFaceDetected,
    #[error("no visible subject left after masking")]
    EmptySubject,
    #[error("foreground image has no alpha channel")]
    MissingAlphaChannel,
    #[error("failed to load caption font: {0}")]
    FontLoadFailure(String),
    #[error("model backend unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input itself is unusable (bad channel layout, missing alpha).
    InvalidInput,
    /// The photo decoded fine but no usable face/subject was found.
    Detection,
    /// An external resource (font, model) could not be obtained.
    Resource,
    /// Anything else.
    Internal,
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedFormat { .. } | Self::MissingAlphaChannel => {
                ErrorCategory::InvalidInput
            }
            Self::NoFaceDetected | Self::EmptySubject => ErrorCategory::Detection,
            Self::FontLoadFailure(_) | Self::ModelUnavailable(_) => ErrorCategory::Resource,
            Self::ProcessingFailed(_) => ErrorCategory::Internal,
        }
    }

    /// Whether a caller may reasonably retry the same request.
    ///
    /// The pipeline itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Resource
    }
}
