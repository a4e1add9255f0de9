//! Image processing for the poster pipeline.
//!
//! | Stage | Module | Crate / function |
//! |---|---|---|
//! | **Extract** | [`extract`] | model traits in [`detection`], `rustface` in [`seeta`], `imageops::crop_imm` |
//! | **Mosaic** | [`mosaic`] | `imageops::resize` (Triangle down, Nearest up) |
//! | **Background** | [`background`] | `rand` per-bucket intensities |
//! | **Composite** | [`composite`] | `imageops::resize` (Nearest) + `imageproc::filter::separable_filter_equal` |
//! | **Caption** | [`caption`] | `imageproc::drawing::draw_text_mut` + `ab_glyph` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry and color math (unit testable)
//! - **Parameters**: Data structures describing what each stage should do
//! - **Models**: [`ModelProvider`] capability traits + [`SidecarModels`] and [`SeetaFaceDetector`]
//! - **Stages**: one module per pipeline stage, each a plain function over buffers

pub mod background;
mod calculations;
pub mod caption;
mod channels;
pub mod composite;
pub mod detection;
pub mod extract;
pub mod mosaic;
mod params;
pub mod seeta;
pub mod sidecar;

pub use background::{BackgroundStyle, RadialParams, radial_gradient, render_background};
pub use calculations::{CropRect, Placement, mosaic_block_size, padded_dimensions};
pub use caption::{CaptionStyle, FontLoader, FontProvider, FontSource, StaticFont};
pub use channels::{normalize_color, require_alpha};
pub use composite::{Composite, CompositeParams, overlay};
pub use detection::{
    FaceLandmarks, Landmark, LandmarkDetector, ModelError, ModelProvider, ProbabilityMap,
    Segmenter,
};
pub use extract::{ExtractParams, Extraction, extract_subject};
pub use mosaic::{Mosaic, MosaicParams, mosaic_image};
pub use params::{BlockSizing, DetectorOptions, FeatherRadius, HexColor, Palette};
pub use seeta::SeetaFaceDetector;
pub use sidecar::{FaceSource, SidecarModels};
