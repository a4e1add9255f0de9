//! Channel-layout checks at stage boundaries.
//!
//! The extractor accepts grayscale, RGB or RGBA input and normalizes it to
//! RGB. Every later stage works on RGBA and rejects buffers without an alpha
//! channel instead of guessing one.

use crate::error::PipelineError;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Normalize any 1-, 3- or 4-channel image to RGB, dropping alpha.
pub fn normalize_color(image: &DynamicImage) -> Result<RgbImage, PipelineError> {
    match image.color().channel_count() {
        1 | 3 | 4 => Ok(image.to_rgb8()),
        channels => Err(PipelineError::UnsupportedFormat { channels }),
    }
}

/// Convert a 4-channel image to 8-bit RGBA, failing for anything else.
pub fn require_alpha(image: &DynamicImage) -> Result<RgbaImage, PipelineError> {
    if image.color().channel_count() != 4 {
        return Err(PipelineError::MissingAlphaChannel);
    }
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};

    #[test]
    fn normalize_accepts_one_three_and_four_channels() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([7])));
        assert_eq!(normalize_color(&gray).unwrap().get_pixel(0, 0), &Rgb([7, 7, 7]));

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        assert_eq!(normalize_color(&rgb).unwrap().get_pixel(1, 1), &Rgb([1, 2, 3]));

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([4, 5, 6, 0])));
        assert_eq!(normalize_color(&rgba).unwrap().get_pixel(0, 1), &Rgb([4, 5, 6]));
    }

    #[test]
    fn normalize_rejects_gray_alpha() {
        let la = DynamicImage::ImageLumaA8(ImageBuffer::from_pixel(2, 2, LumaA([1u8, 2])));
        assert!(matches!(
            normalize_color(&la),
            Err(PipelineError::UnsupportedFormat { channels: 2 })
        ));
    }

    #[test]
    fn require_alpha_rejects_rgb() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        assert!(matches!(
            require_alpha(&rgb),
            Err(PipelineError::MissingAlphaChannel)
        ));

        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4])));
        assert_eq!(require_alpha(&rgba).unwrap().get_pixel(0, 0), &Rgba([1, 2, 3, 4]));
    }
}
