//! Procedural radial "sunburst" background.
//!
//! The circle around the canvas center is split into 720 half-degree
//! buckets, each with a random red intensity skewed toward strong red by a
//! gamma curve. Every pixel takes its bucket's hue, then is washed toward
//! white by its distance from the center: the center is pure white and the
//! rays get more saturated toward the corners.
//!
//! The random source is passed in, so a seeded RNG reproduces a background
//! bit for bit.

use super::calculations::{ANGLE_BUCKETS, angle_bucket, gamma_transform, radial_weight};
use image::{Rgb, RgbImage};
use rand::Rng;
use tracing::debug;

/// Gamma settings for the radial gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialParams {
    /// Skews bucket intensities toward red (`> 1` = more red rays).
    pub red_white_gamma: f64,
    /// Shapes the white falloff from the center (`< 1` = wider white glow).
    pub center_white_gamma: f64,
}

impl Default for RadialParams {
    fn default() -> Self {
        Self {
            red_white_gamma: 2.6,
            center_white_gamma: 0.9,
        }
    }
}

/// How the compositor's background canvas is produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundStyle {
    Radial(RadialParams),
    Solid(Rgb<u8>),
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self::Radial(RadialParams::default())
    }
}

/// One random intensity per angular bucket, gamma-skewed, in `0..=255`.
pub fn angular_intensities<R: Rng + ?Sized>(rng: &mut R, gamma: f64) -> Vec<u8> {
    (0..ANGLE_BUCKETS)
        .map(|_| (gamma_transform(rng.random::<f64>(), gamma) * 255.0) as u8)
        .collect()
}

/// Mix `color` with white; `weight` 0 is white, 1 is `color`.
///
/// Blends the distance from white, so a saturated channel stays at 255 for
/// every weight.
fn wash(color: Rgb<u8>, weight: f64) -> Rgb<u8> {
    Rgb(color.0.map(|c| 255 - ((255 - c) as f64 * weight).round() as u8))
}

/// Render a `width` × `height` radial background.
pub fn radial_gradient<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    params: &RadialParams,
    rng: &mut R,
) -> RgbImage {
    let intensities = angular_intensities(rng, params.red_white_gamma);

    let center_x = (width / 2) as f64;
    let center_y = (height / 2) as f64;
    let max_distance = (center_x * center_x + center_y * center_y).sqrt();
    let dxs: Vec<f64> = (0..width).map(|x| x as f64 - center_x).collect();

    let mut canvas = RgbImage::new(width, height);
    for (y, row) in canvas.rows_mut().enumerate() {
        let dy = y as f64 - center_y;
        for (pixel, &dx) in row.zip(&dxs) {
            let intensity = intensities[angle_bucket(dx, dy)];
            let hue = Rgb([255, 255 - intensity, 255 - intensity]);
            let distance = (dx * dx + dy * dy).sqrt();
            *pixel = wash(hue, radial_weight(distance, max_distance, params.center_white_gamma));
        }
    }
    debug!(width, height, "radial background");
    canvas
}

/// Render the background for `style`.
pub fn render_background<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    style: &BackgroundStyle,
    rng: &mut R,
) -> RgbImage {
    match style {
        BackgroundStyle::Radial(params) => radial_gradient(width, height, params, rng),
        BackgroundStyle::Solid(color) => RgbImage::from_pixel(width, height, *color),
    }
}
