//! Background compositing: scale, place, feather, blend, pad.
//!
//! The foreground is scaled with nearest-neighbor to a fixed person height
//! (smoothing would blur the mosaic blocks), centered horizontally at a fixed
//! top offset, and alpha-blended through a Gaussian-feathered copy of its
//! own alpha channel. The blended inner canvas is then padded with a flat
//! margin on every side; the bottom margin is where the caption goes.
//!
//! Placements larger than the background are clipped rather than rejected.

use super::calculations::{ClippedRegion, Placement, padded_dimensions, scale_to_height};
use super::channels::require_alpha;
use super::params::FeatherRadius;
use crate::error::PipelineError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Luma, Rgb, RgbImage, RgbaImage};
use imageproc::definitions::Image;
use imageproc::filter::separable_filter_equal;
use tracing::debug;

/// Feathered alpha in `[0, 1]`.
pub type AlphaMap = Image<Luma<f32>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeParams {
    /// Height the foreground is scaled to.
    pub person_height: u32,
    /// Distance from the background's top edge to the foreground's top edge.
    pub person_top: u32,
    pub feather: FeatherRadius,
    /// Margin added on every side of the inner canvas.
    pub padding: u32,
    pub margin_color: Rgb<u8>,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            person_height: 400,
            person_top: 50,
            feather: FeatherRadius::default(),
            padding: 100,
            margin_color: Rgb([0xb3, 0x12, 0x1e]),
        }
    }
}

/// A padded composite, ready for its caption.
#[derive(Debug, Clone)]
pub struct Composite {
    pub canvas: RgbImage,
    /// Foreground placement in inner-background coordinates.
    pub placement: Placement,
    /// Top row of the bottom margin band in canvas coordinates.
    pub caption_band_top: u32,
    /// Height of the bottom margin band.
    pub caption_band_height: u32,
}

/// Normalized Gaussian taps: `2r + 1` wide, `sigma = r`.
fn gaussian_kernel(radius: FeatherRadius) -> Vec<f32> {
    let r = radius.0 as f32;
    let two_sigma_sq = 2.0 * radius.sigma() * radius.sigma();
    let taps: Vec<f32> = (0..radius.kernel_size())
        .map(|i| {
            let d = i as f32 - r;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();
    let total: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / total).collect()
}

/// The alpha channel of `image` as `[0, 1]`, Gaussian-blurred by `radius`.
pub fn feather_alpha(image: &RgbaImage, radius: FeatherRadius) -> AlphaMap {
    let alpha = AlphaMap::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y)[3] as f32 / 255.0])
    });
    if radius.is_disabled() {
        return alpha;
    }
    let mut blurred = separable_filter_equal(&alpha, &gaussian_kernel(radius));
    for p in blurred.pixels_mut() {
        p[0] = p[0].clamp(0.0, 1.0);
    }
    blurred
}

/// Blend `foreground` into `background` over `region`, weighted by `alpha`.
fn blend(background: &mut RgbImage, foreground: &RgbaImage, alpha: &AlphaMap, region: ClippedRegion) {
    for dy in 0..region.height {
        for dx in 0..region.width {
            let (fx, fy) = (region.fg_x + dx, region.fg_y + dy);
            let a = alpha.get_pixel(fx, fy)[0];
            let fg = foreground.get_pixel(fx, fy);
            let bg = background.get_pixel_mut(region.bg_x + dx, region.bg_y + dy);
            for c in 0..3 {
                let mixed = bg[c] as f32 * (1.0 - a) + fg[c] as f32 * a;
                bg[c] = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Surround `inner` with a `padding`-wide border of `color`.
pub fn pad(inner: &RgbImage, padding: u32, color: Rgb<u8>) -> Result<RgbImage, PipelineError> {
    let (width, height) = padded_dimensions(inner.dimensions(), padding).ok_or_else(|| {
        PipelineError::ProcessingFailed(format!(
            "padding {padding} around {}x{} overflows the canvas size",
            inner.width(),
            inner.height()
        ))
    })?;
    let mut canvas = RgbImage::from_pixel(width, height, color);
    imageops::replace(&mut canvas, inner, padding as i64, padding as i64);
    Ok(canvas)
}

/// Composite an RGBA foreground onto `background` and pad the result.
pub fn composite(
    foreground: &RgbaImage,
    background: &RgbImage,
    params: &CompositeParams,
) -> Result<Composite, PipelineError> {
    if foreground.width() == 0 || foreground.height() == 0 || params.person_height == 0 {
        return Err(PipelineError::EmptySubject);
    }
    let (width, height) = scale_to_height(foreground.dimensions(), params.person_height);
    let scaled = imageops::resize(foreground, width, height, FilterType::Nearest);
    let alpha = feather_alpha(&scaled, params.feather);

    let placement = Placement::centered(background.width(), (width, height), params.person_top);
    let mut inner = background.clone();
    match placement.clip(inner.dimensions()) {
        Some(region) => blend(&mut inner, &scaled, &alpha, region),
        None => debug!(?placement, "foreground lies outside the background"),
    }
    debug!(
        x = placement.x,
        y = placement.y,
        width = placement.width,
        height = placement.height,
        "foreground placement"
    );

    Ok(Composite {
        canvas: pad(&inner, params.padding, params.margin_color)?,
        placement,
        caption_band_top: params.padding + inner.height(),
        caption_band_height: params.padding,
    })
}

/// [`composite`] for an arbitrary decoded foreground; it must carry alpha.
pub fn overlay(
    foreground: &DynamicImage,
    background: &RgbImage,
    params: &CompositeParams,
) -> Result<Composite, PipelineError> {
    composite(&require_alpha(foreground)?, background, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BG: Rgb<u8> = Rgb([10, 20, 30]);

    fn params() -> CompositeParams {
        CompositeParams {
            person_height: 40,
            person_top: 5,
            feather: FeatherRadius(2),
            padding: 8,
            margin_color: Rgb([1, 2, 3]),
        }
    }

    fn background() -> RgbImage {
        RgbImage::from_pixel(100, 60, BG)
    }

    fn opaque(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]))
    }

    #[test]
    fn canvas_size_is_independent_of_foreground_aspect() {
        for (w, h) in [(10, 80), (80, 10), (33, 33), (1, 1)] {
            let out = composite(&opaque(w, h), &background(), &params()).unwrap();
            assert_eq!(out.canvas.dimensions(), (116, 76), "foreground {w}x{h}");
        }
    }

    #[test]
    fn foreground_is_scaled_to_person_height_and_centered() {
        let out = composite(&opaque(20, 80), &background(), &params()).unwrap();
        assert_eq!(
            out.placement,
            Placement {
                x: 45,
                y: 5,
                width: 10,
                height: 40,
            }
        );
    }

    #[test]
    fn opaque_interior_takes_foreground_color() {
        let out = composite(&opaque(40, 40), &background(), &params()).unwrap();
        // Inner (50, 25) is deep inside the 40x40 placement at (30, 5)
        assert_eq!(*out.canvas.get_pixel(8 + 50, 8 + 25), Rgb([200, 100, 50]));
    }

    #[test]
    fn background_outside_placement_is_untouched() {
        let out = composite(&opaque(40, 40), &background(), &params()).unwrap();
        let inner = imageops::crop_imm(&out.canvas, 8, 8, 100, 60).to_image();
        for (x, y, p) in inner.enumerate_pixels() {
            let inside = (30..70).contains(&x) && (5..45).contains(&y);
            if !inside {
                assert_eq!(*p, BG, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn margin_uses_margin_color() {
        let out = composite(&opaque(40, 40), &background(), &params()).unwrap();
        assert_eq!(*out.canvas.get_pixel(0, 0), Rgb([1, 2, 3]));
        assert_eq!(*out.canvas.get_pixel(115, 75), Rgb([1, 2, 3]));
        assert_eq!(out.caption_band_top, 68);
        assert_eq!(out.caption_band_height, 8);
    }

    #[test]
    fn feathering_softens_the_silhouette_edge() {
        // Left half transparent, right half opaque
        let fg = RgbaImage::from_fn(40, 40, |x, _| {
            Rgba([250, 250, 250, if x < 20 { 0 } else { 255 }])
        });
        let out = composite(&fg, &background(), &params()).unwrap();
        // Column just left of the alpha edge picks up some foreground
        let edge = out.canvas.get_pixel(8 + 30 + 19, 8 + 25);
        assert!(edge[0] > BG[0] && edge[0] < 250, "edge {edge:?}");
    }

    #[test]
    fn zero_radius_keeps_hard_edges() {
        let fg = RgbaImage::from_fn(4, 1, |x, _| Rgba([0, 0, 0, if x < 2 { 0 } else { 255 }]));
        let alpha = feather_alpha(&fg, FeatherRadius(0));
        let values: Vec<f32> = alpha.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn feathered_alpha_stays_in_unit_range() {
        let fg = RgbaImage::from_fn(30, 30, |x, y| Rgba([0, 0, 0, ((x * y) % 256) as u8]));
        let alpha = feather_alpha(&fg, FeatherRadius(5));
        assert!(alpha.pixels().all(|p| (0.0..=1.0).contains(&p[0])));
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(FeatherRadius(5));
        assert_eq!(k.len(), 11);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(k[0], k[10]);
        assert!(k[5] > k[4]);
    }

    #[test]
    fn oversized_foreground_is_clipped() {
        let p = CompositeParams {
            person_height: 100,
            ..params()
        };
        let out = composite(&opaque(300, 100), &background(), &p).unwrap();
        assert_eq!(out.canvas.dimensions(), (116, 76));
        // Whole inner width is covered
        assert_eq!(*out.canvas.get_pixel(8, 8 + 30), Rgb([200, 100, 50]));
    }

    #[test]
    fn overflowing_padding_is_an_error() {
        let p = CompositeParams {
            padding: 3_000_000_000,
            ..params()
        };
        assert!(matches!(
            composite(&opaque(40, 40), &background(), &p),
            Err(PipelineError::ProcessingFailed(_))
        ));
    }

    #[test]
    fn rgb_foreground_is_missing_alpha() {
        let fg = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(matches!(
            overlay(&fg, &background(), &params()),
            Err(PipelineError::MissingAlphaChannel)
        ));
    }
}
