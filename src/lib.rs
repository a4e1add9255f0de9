//! # Poster Portrait
//!
//! Turns a portrait photo into a stylized propaganda poster: the face is cut
//! out, reduced to a two-tone red/skin mosaic, placed on a red sunburst
//! background and captioned with the subject's name.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Extract     photo      →  RGBA face crop   (segmentation + landmarks)
//! 2. Mosaic      face crop  →  two-tone RGBA    (block resample + luma threshold)
//! 3. Background  seed       →  RGB canvas       (radial rays around a white center)
//! 4. Composite   mosaic     →  RGB poster       (feathered blend, margin, caption)
//! ```
//!
//! Every stage is a plain function over image buffers with its parameters
//! passed in, so each one is unit-testable without models, fonts or files.
//! [`pipeline::Pipeline`] strings them together for one request and stops at
//! the first error.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The stages, their parameter types and pure geometry |
//! | [`pipeline`] | Request-scoped driver returning a poster and a [`pipeline::RenderReport`] |
//! | [`config`] | `config.toml` loading, validation, merging over stock defaults |
//! | [`error`] | [`error::PipelineError`] taxonomy shared by every stage |
//! | [`snapshots`] | Optional PNG dumps of intermediate buffers |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Models Behind Traits
//!
//! Segmentation and face landmarks are capabilities
//! ([`imaging::ModelProvider`]), not a bundled runtime. The CLI reads the
//! matte from a sidecar file ([`imaging::SidecarModels`]) and takes faces
//! from a landmark file or the in-process [`imaging::SeetaFaceDetector`];
//! an embedding service can plug in its own provider. Sessions are opened per extraction
//! and released on every exit path.
//!
//! ## Fail Fast, No Partial Posters
//!
//! A stage error is returned unchanged and nothing downstream runs. Callers
//! map [`error::PipelineError::category`] to user-facing messages.
//!
//! ## Reproducible Backgrounds
//!
//! The background is the only random part of a poster. The RNG is injected,
//! so a seed reproduces a poster bit for bit.

pub mod config;
pub mod error;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod snapshots;

#[cfg(test)]
pub(crate) mod test_helpers;
