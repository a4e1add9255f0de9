//! Subject extraction: segmentation matte plus face-band crop.
//!
//! The photo is normalized to RGB, segmented into a binary foreground matte
//! (stored as alpha), and cropped around the single detected face: the
//! landmark x-extent plus a side margin horizontally, and from the top of the
//! visible subject down to a little past the chin vertically.

use super::calculations::{CropRect, bottom_y, chin_y, horizontal_band};
use super::channels::normalize_color;
use super::detection::{FaceLandmarks, ModelError, ModelProvider, ProbabilityMap};
use super::params::DetectorOptions;
use crate::error::PipelineError;
use image::{DynamicImage, Rgba, RgbaImage, RgbImage};
use tracing::debug;

/// Tunables for [`extract_subject`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractParams {
    /// Pixels with foreground probability strictly above this are kept.
    pub foreground_threshold: f32,
    /// Horizontal margin added on each side, as a fraction of face width.
    pub side_margin: f64,
    /// How far past the chin to extend, as a fraction of face height.
    pub neck_extension: f64,
    pub detector: DetectorOptions,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            foreground_threshold: 0.1,
            side_margin: 0.2,
            neck_extension: 0.2,
            detector: DetectorOptions::default(),
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Cropped RGBA subject; background pixels have alpha 0.
    pub subject: RgbaImage,
    /// The full-frame matte before cropping.
    pub matte: RgbaImage,
    /// Crop bounds within the source image.
    pub crop: CropRect,
}

/// Attach a binary alpha channel: 255 where `probabilities > threshold`, else 0.
pub fn compose_matte(rgb: &RgbImage, probabilities: &ProbabilityMap, threshold: f32) -> RgbaImage {
    RgbaImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let alpha = if probabilities.get_pixel(x, y)[0] > threshold {
            255
        } else {
            0
        };
        Rgba([r, g, b, alpha])
    })
}

/// First row (from the top) with any non-transparent pixel in `[left, right)`.
fn first_visible_row(matte: &RgbaImage, left: u32, right: u32) -> Option<u32> {
    (0..matte.height()).find(|&y| (left..right).any(|x| matte.get_pixel(x, y)[3] != 0))
}

/// Compute the crop around `face` on the composed matte.
pub fn face_crop(
    matte: &RgbaImage,
    face: &FaceLandmarks,
    params: &ExtractParams,
) -> Result<CropRect, PipelineError> {
    let (width, height) = matte.dimensions();
    let (left, right) =
        horizontal_band(&face.xs(), width, params.side_margin).ok_or(PipelineError::NoFaceDetected)?;
    let chin = chin_y(&face.ys(), height).ok_or(PipelineError::NoFaceDetected)?;
    let top = first_visible_row(matte, left, right).ok_or(PipelineError::EmptySubject)?;
    let bottom = bottom_y(chin, top, params.neck_extension, height);

    CropRect::new(left, top, right, bottom, width, height).ok_or(PipelineError::EmptySubject)
}

/// Segment the subject and crop it to the face region.
///
/// Each model session lives only as long as its step: the segmenter is
/// released before the landmark detector is acquired, and both are released
/// on every error path.
pub fn extract_subject<M>(
    image: &DynamicImage,
    models: &M,
    params: &ExtractParams,
) -> Result<Extraction, PipelineError>
where
    M: ModelProvider + ?Sized,
{
    let rgb = normalize_color(image)?;
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(PipelineError::EmptySubject);
    }

    let matte = {
        let mut segmenter = models.segmenter()?;
        let probabilities = segmenter.segment(&rgb)?;
        if probabilities.dimensions() != rgb.dimensions() {
            return Err(ModelError::InvalidMask(format!(
                "mask is {}x{}, image is {}x{}",
                probabilities.width(),
                probabilities.height(),
                rgb.width(),
                rgb.height()
            ))
            .into());
        }
        compose_matte(&rgb, &probabilities, params.foreground_threshold)
    };
    // Nothing segmented means there is no subject to find a face on
    if matte.pixels().all(|p| p[3] == 0) {
        return Err(PipelineError::NoFaceDetected);
    }

    let face = models
        .landmark_detector(&params.detector)?
        .detect(&rgb)?
        .ok_or(PipelineError::NoFaceDetected)?;
    let crop = face_crop(&matte, &face, params)?;
    debug!(
        left = crop.left,
        top = crop.top,
        right = crop.right,
        bottom = crop.bottom,
        landmarks = face.points.len(),
        "subject crop"
    );

    let subject =
        image::imageops::crop_imm(&matte, crop.left, crop.top, crop.width(), crop.height())
            .to_image();
    Ok(Extraction {
        subject,
        matte,
        crop,
    })
}
