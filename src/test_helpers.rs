//! Shared test utilities for the poster-portrait test suite.
//!
//! Provides a synthetic portrait with matching mock models, and the
//! DejaVu Sans Bold font shipped under `tests/fixtures/` for caption tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let models = portrait_models();
//! let poster = Pipeline::new(&config, &models)
//!     .render(&synthetic_portrait(), None, &mut StdRng::seed_from_u64(1))
//!     .unwrap();
//!
//! let font = fixture_font();
//! ```

use ab_glyph::FontArc;
use image::{DynamicImage, Rgb, RgbImage};

use crate::imaging::detection::tests::MockModels;

// =========================================================================
// Synthetic portrait
// =========================================================================

/// 160×160 RGB "photo": a light face with a dark band of hair on a gray
/// backdrop. Pairs with [`portrait_models`].
pub fn synthetic_portrait() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(160, 160, |x, y| {
        if !(40..120).contains(&x) || y < 24 {
            Rgb([128, 128, 128])
        } else if y < 45 {
            Rgb([40, 25, 20])
        } else {
            Rgb([230, 190, 160 - (x as u8 % 16)])
        }
    }))
}

/// Mock models for [`synthetic_portrait`]: the subject fills x in 40..120
/// from y = 24 down, and the face landmarks span x 60..100, y 40..100.
pub fn portrait_models() -> MockModels {
    MockModels::with_mask(160, 160, |x, y| {
        if y >= 24 && (40..120).contains(&x) {
            0.9
        } else {
            0.05
        }
    })
    .face(&[(0.375, 0.25), (0.625, 0.25), (0.5, 0.625)])
}

// =========================================================================
// Fonts
// =========================================================================

/// DejaVu Sans Bold, shipped with the tests.
pub const FONT_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans-Bold.ttf");

pub fn fixture_font() -> FontArc {
    FontArc::try_from_slice(include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/DejaVuSans-Bold.ttf"
    )))
    .unwrap()
}
