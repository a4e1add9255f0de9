//! Mosaic quantization: blocky downsample, then two-tone recolor.
//!
//! 1. Derive a block size from [`BlockSizing`] and shrink the image by it
//!    with a linear filter, then blow it back up with nearest-neighbor so
//!    every block is one flat color. Alpha goes through the same resampling,
//!    so the silhouette edge turns blocky too.
//! 2. Threshold each pixel's luma against the mean luma of the visible
//!    (alpha > 0) pixels: at or below the mean → red, above → skin.
//!
//! Alpha is never recolored. Fully transparent buffers are rejected because
//! the mean is undefined.

use super::calculations::{luma, mosaic_block_size, mosaic_grid};
use super::channels::require_alpha;
use super::params::{BlockSizing, Palette};
use crate::error::PipelineError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MosaicParams {
    pub sizing: BlockSizing,
    pub palette: Palette,
}

/// Output of [`quantize`].
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub image: RgbaImage,
    /// Block edge in pixels (1 = no resampling).
    pub block_size: u32,
    /// Mean luma of the visible pixels.
    pub threshold: f64,
}

/// Shrink by `block` with a linear filter, then restore size with nearest.
pub fn pixelate(image: &RgbaImage, block: u32) -> RgbaImage {
    if block <= 1 {
        return image.clone();
    }
    let (width, height) = image.dimensions();
    let (grid_w, grid_h) = mosaic_grid((width, height), block);
    let small = imageops::resize(image, grid_w, grid_h, FilterType::Triangle);
    imageops::resize(&small, width, height, FilterType::Nearest)
}

/// Mean luma over pixels with alpha > 0, or `None` if all are transparent.
pub fn visible_mean_luma(image: &RgbaImage) -> Option<f64> {
    let (sum, count) = image
        .pixels()
        .filter(|p| p[3] > 0)
        .fold((0u64, 0u64), |(sum, count), p| {
            (sum + luma([p[0], p[1], p[2]]) as u64, count + 1)
        });
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Recolor every pixel to the palette by comparing its luma to `threshold`.
pub fn bichromatize(image: &RgbaImage, threshold: f64, palette: &Palette) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let color = if luma([r, g, b]) as f64 <= threshold {
            palette.red
        } else {
            palette.skin
        };
        let [r, g, b] = color.0;
        *pixel = Rgba([r, g, b, a]);
    }
    out
}

/// Mosaic and two-tone an RGBA buffer.
pub fn quantize(image: &RgbaImage, params: &MosaicParams) -> Result<Mosaic, PipelineError> {
    let block_size = mosaic_block_size(image.dimensions(), params.sizing);
    let pixelated = pixelate(image, block_size);
    let threshold = visible_mean_luma(&pixelated).ok_or(PipelineError::EmptySubject)?;
    debug!(block_size, threshold, "mosaic threshold");

    Ok(Mosaic {
        image: bichromatize(&pixelated, threshold, &params.palette),
        block_size,
        threshold,
    })
}

/// [`quantize`] for an arbitrary decoded image; it must carry alpha.
pub fn mosaic_image(image: &DynamicImage, params: &MosaicParams) -> Result<Mosaic, PipelineError> {
    quantize(&require_alpha(image)?, params)
}
