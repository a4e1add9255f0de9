//! Pure calculation functions for the pipeline geometry.
//!
//! All functions here are pure and testable without any images or models.

use super::params::BlockSizing;

/// Number of angular buckets the radial background divides the circle into
/// (half-degree resolution).
pub const ANGLE_BUCKETS: usize = 720;

/// Pixel bounds of a crop, half-open on the right and bottom.
///
/// Always satisfies `left < right` and `top < bottom`; see [`CropRect::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    /// Build a crop inside a `width` × `height` image.
    ///
    /// Returns `None` for empty or out-of-bounds rectangles.
    pub fn new(
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        width: u32,
        height: u32,
    ) -> Option<Self> {
        (left < right && top < bottom && right <= width && bottom <= height).then_some(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Horizontal face band `[left, right)` from normalized landmark x coordinates.
///
/// Each coordinate is scaled to pixels (truncated), the raw extent is
/// widened on both sides by `margin` times its width, and the result is
/// clamped to `[0, width]`. Returns `None` when there are no points.
pub fn horizontal_band(xs: &[f64], width: u32, margin: f64) -> Option<(u32, u32)> {
    let width = width as i64;
    let pixels = xs.iter().map(|x| (x * width as f64) as i64);
    let min = pixels.clone().min()?;
    let max = pixels.max()?;

    let left = min.max(0);
    let right = max.min(width);
    let pad = ((right - left).max(0) as f64 * margin) as i64;

    let left = (left - pad).clamp(0, width);
    let right = (right + pad).clamp(0, width);
    Some((left as u32, right as u32))
}

/// Chin position in pixels: the lowest landmark, scaled to image height.
pub fn chin_y(ys: &[f64], height: u32) -> Option<f64> {
    ys.iter()
        .copied()
        .reduce(f64::max)
        .map(|y| y.clamp(0.0, 1.0) * height as f64)
}

/// Bottom edge of the crop: `chin + extension * (chin - top)`, truncated
/// and clamped to the image height.
pub fn bottom_y(chin_y: f64, top_y: u32, extension: f64, height: u32) -> u32 {
    let face_height = chin_y - top_y as f64;
    let bottom = chin_y + face_height * extension;
    (bottom.max(0.0) as u32).min(height)
}

/// Calculate the mosaic block edge length for an image of `dims`.
///
/// # Examples
/// ```
/// # use poster_portrait::imaging::{BlockSizing, mosaic_block_size};
/// assert_eq!(mosaic_block_size((2400, 3200), BlockSizing::Resolution(1000)), 2);
/// assert_eq!(mosaic_block_size((400, 600), BlockSizing::Resolution(1000)), 1);
/// assert_eq!(mosaic_block_size((500, 720), BlockSizing::HeightBlocks(120)), 6);
/// ```
pub fn mosaic_block_size(dims: (u32, u32), sizing: BlockSizing) -> u32 {
    let (width, height) = dims;
    let raw = match sizing {
        BlockSizing::Resolution(resolution) => width.min(height) / resolution.max(1),
        BlockSizing::HeightBlocks(blocks) => height / blocks.max(1),
    };
    raw.max(1)
}

/// Dimensions of the downsampled mosaic grid (one pixel per block).
pub fn mosaic_grid(dims: (u32, u32), block: u32) -> (u32, u32) {
    let block = block.max(1);
    ((dims.0 / block).max(1), (dims.1 / block).max(1))
}

/// Scale `dims` so the height becomes `target_height`, keeping aspect ratio.
///
/// Width is truncated but never drops below one pixel.
pub fn scale_to_height(dims: (u32, u32), target_height: u32) -> (u32, u32) {
    let (width, height) = dims;
    if height == 0 {
        return (width.max(1), target_height);
    }
    let scale = target_height as f64 / height as f64;
    (((width as f64 * scale) as u32).max(1), target_height)
}

/// Where a foreground lands on the background, in background coordinates.
///
/// May extend past the background edges; use [`Placement::clip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// The overlap of a [`Placement`] with its background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedRegion {
    /// Top-left corner in background coordinates.
    pub bg_x: u32,
    pub bg_y: u32,
    /// Top-left corner in foreground coordinates.
    pub fg_x: u32,
    pub fg_y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Center horizontally on a background `bg_width` wide, `top` pixels down.
    pub fn centered(bg_width: u32, fg: (u32, u32), top: u32) -> Self {
        Self {
            x: (bg_width as i64 - fg.0 as i64).div_euclid(2),
            y: top as i64,
            width: fg.0,
            height: fg.1,
        }
    }

    /// Intersect with a `bg` sized background. `None` when nothing overlaps.
    pub fn clip(&self, bg: (u32, u32)) -> Option<ClippedRegion> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width as i64).min(bg.0 as i64);
        let y1 = (self.y + self.height as i64).min(bg.1 as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(ClippedRegion {
            bg_x: x0 as u32,
            bg_y: y0 as u32,
            fg_x: (x0 - self.x) as u32,
            fg_y: (y0 - self.y) as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Final canvas size when `inner` is padded by `padding` on every side.
///
/// `None` when either edge overflows `u32`.
pub fn padded_dimensions(inner: (u32, u32), padding: u32) -> Option<(u32, u32)> {
    let border = padding.checked_mul(2)?;
    Some((inner.0.checked_add(border)?, inner.1.checked_add(border)?))
}

/// Gamma curve `x^(1/gamma)`.
///
/// With `gamma > 1` values in (0, 1) are pushed up; with `gamma < 1` they
/// are pushed down.
pub fn gamma_transform(x: f64, gamma: f64) -> f64 {
    x.powf(1.0 / gamma)
}

/// Angular bucket (0..720) of the offset `(dx, dy)` from the canvas center.
///
/// Angles run clockwise in image coordinates starting at the positive x axis,
/// at half-degree resolution.
pub fn angle_bucket(dx: f64, dy: f64) -> usize {
    let degrees = dy.atan2(dx).to_degrees();
    let bucket = ((degrees + 360.0) % 360.0 * 2.0) as usize;
    bucket.min(ANGLE_BUCKETS - 1)
}

/// Hue weight of a pixel at `distance` from the center: 0 at the center
/// (pure white), approaching 1 toward the corners.
pub fn radial_weight(distance: f64, max_distance: f64, gamma: f64) -> f64 {
    if max_distance <= 0.0 {
        return 0.0;
    }
    gamma_transform(distance / max_distance, gamma).clamp(0.0, 1.0)
}

/// BT.601 luma with integer rounding, as used for the mosaic threshold.
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

/// Top-left origin that centers a `text` sized box inside a horizontal band.
///
/// The band spans the full `canvas_width` and `band_height` rows starting at
/// `band_top`. Text larger than the band is pinned to the band's top/left.
pub fn centered_in_band(
    canvas_width: u32,
    band_top: u32,
    band_height: u32,
    text: (u32, u32),
) -> (i32, i32) {
    let x = canvas_width.saturating_sub(text.0) / 2;
    let y = band_top + band_height.saturating_sub(text.1) / 2;
    (x as i32, y as i32)
}
