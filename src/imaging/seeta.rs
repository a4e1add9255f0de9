//! In-process face detection with the SeetaFace frontal detector.
//!
//! Backed by the `rustface` crate. SeetaFace finds face boxes, not a face
//! mesh, so a detection is reported to the extractor as the four corners
//! of its box: the box sides give the face band and its bottom edge is
//! taken as the chin.
//!
//! The model file (`seeta_fd_frontal_v1.0.bin`) is read once when the
//! detector is loaded; every session runs its own `rustface` detector over
//! a clone of it, so sessions never share state.

use super::detection::{FaceLandmarks, Landmark, LandmarkDetector, ModelError};
use super::params::DetectorOptions;
use image::RgbImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Raw SeetaFace score a window needs to count as a face.
const SCORE_THRESHOLD: f64 = 2.0;

/// Bounding box of one detected face, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Raw detector score; unbounded, higher is more certain.
    pub score: f64,
}

impl FaceBox {
    /// Detection confidence in `[0, 1]`.
    ///
    /// Logistic over the raw score, centered on the detector's own
    /// threshold, so the weakest face the detector reports maps to 0.5.
    pub fn confidence(&self) -> f32 {
        (1.0 / (1.0 + (SCORE_THRESHOLD - self.score).exp())) as f32
    }

    /// The box corners in normalized image coordinates, clamped to the image.
    pub fn corners(&self, (width, height): (u32, u32)) -> Vec<Landmark> {
        let nx = |x: f64| (x / width as f64).clamp(0.0, 1.0);
        let ny = |y: f64| (y / height as f64).clamp(0.0, 1.0);
        let (left, right) = (nx(self.x), nx(self.x + self.width));
        let (top, bottom) = (ny(self.y), ny(self.y + self.height));
        vec![
            Landmark { x: left, y: top },
            Landmark { x: right, y: top },
            Landmark { x: left, y: bottom },
            Landmark { x: right, y: bottom },
        ]
    }
}

/// Strongest face passing `options`, as landmarks for an image of `dims`.
pub fn strongest_face(
    mut boxes: Vec<FaceBox>,
    dims: (u32, u32),
    options: &DetectorOptions,
) -> Option<FaceLandmarks> {
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));
    boxes
        .into_iter()
        .filter(|b| b.confidence() >= options.min_detection_confidence)
        .take(options.max_faces as usize)
        .next()
        .map(|b| FaceLandmarks {
            points: b.corners(dims),
            confidence: b.confidence(),
        })
}

/// A loaded SeetaFace model.
pub struct SeetaFaceDetector {
    model: rustface::Model,
}

impl SeetaFaceDetector {
    /// Read the model from `path`.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| ModelError::InvalidModel(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded SeetaFace model");
        Ok(Self { model })
    }

    /// A detection session honoring `options`.
    pub fn session(&self, options: &DetectorOptions) -> SeetaSession<'_> {
        SeetaSession {
            model: &self.model,
            options: *options,
        }
    }
}

pub struct SeetaSession<'a> {
    model: &'a rustface::Model,
    options: DetectorOptions,
}

impl LandmarkDetector for SeetaSession<'_> {
    fn detect(&mut self, image: &RgbImage) -> Result<Option<FaceLandmarks>, ModelError> {
        let gray = image::imageops::grayscale(image);
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));
        let boxes: Vec<FaceBox> = faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox {
                    x: bbox.x() as f64,
                    y: bbox.y() as f64,
                    width: bbox.width() as f64,
                    height: bbox.height() as f64,
                    score: face.score(),
                }
            })
            .collect();
        debug!(faces = boxes.len(), "SeetaFace detection");
        Ok(strongest_face(boxes, (width, height), &self.options))
    }
}
