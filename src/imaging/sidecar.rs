//! File-backed model provider.
//!
//! Segmentation runs outside this crate and is handed over as a sidecar
//! file next to the photo. Faces come from a second sidecar, or are found
//! in-process by a [`SeetaFaceDetector`]:
//!
//! | Source | Contents |
//! |---|---|
//! | matte (`*.png`, any decodable format) | grayscale, `value / 255` = foreground probability |
//! | landmarks (`*.json`) | `{"faces": [{"confidence": 0.98, "landmarks": [{"x": 0.41, "y": 0.22}, ...]}]}` |
//! | face model (`seeta_fd_frontal_v1.0.bin`) | SeetaFace detector, run on the photo itself |
//!
//! Files are read when a session is acquired, so a missing or corrupt
//! sidecar surfaces before any pixel work starts. A matte whose size differs
//! from the photo (segmenters often run at a reduced resolution) is resized
//! with a linear filter.

use super::detection::{
    FaceLandmarks, Landmark, LandmarkDetector, ModelError, ModelProvider, ProbabilityMap,
    Segmenter,
};
use super::params::DetectorOptions;
use super::seeta::SeetaFaceDetector;
use image::imageops::FilterType;
use image::{GrayImage, ImageError, Luma, RgbImage};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Where faces come from.
pub enum FaceSource {
    /// Landmark JSON written by an external face-mesh tool.
    Landmarks(PathBuf),
    /// In-process SeetaFace detection.
    SeetaFace(SeetaFaceDetector),
}

/// Model provider reading a matte image, with faces from a [`FaceSource`].
pub struct SidecarModels {
    mask_path: PathBuf,
    faces: FaceSource,
}

impl SidecarModels {
    /// Matte and landmarks both from sidecar files.
    pub fn new(mask_path: impl Into<PathBuf>, landmarks_path: impl Into<PathBuf>) -> Self {
        Self {
            mask_path: mask_path.into(),
            faces: FaceSource::Landmarks(landmarks_path.into()),
        }
    }

    /// Matte from a sidecar file, faces detected with `detector`.
    pub fn with_detector(mask_path: impl Into<PathBuf>, detector: SeetaFaceDetector) -> Self {
        Self {
            mask_path: mask_path.into(),
            faces: FaceSource::SeetaFace(detector),
        }
    }

    /// Matte from a sidecar file, faces detected with the SeetaFace model at
    /// `model_path`.
    pub fn with_face_model(
        mask_path: impl Into<PathBuf>,
        model_path: &Path,
    ) -> Result<Self, ModelError> {
        Ok(Self::with_detector(mask_path, SeetaFaceDetector::load(model_path)?))
    }

    pub fn face_source(&self) -> &FaceSource {
        &self.faces
    }
}

#[derive(Debug, Deserialize)]
struct LandmarkFile {
    faces: Vec<FaceRecord>,
}

#[derive(Debug, Deserialize)]
struct FaceRecord {
    #[serde(default = "full_confidence")]
    confidence: f32,
    landmarks: Vec<Landmark>,
}

fn full_confidence() -> f32 {
    1.0
}

fn load_matte(path: &Path) -> Result<GrayImage, ModelError> {
    let img = image::open(path).map_err(|e| match e {
        ImageError::IoError(io) => ModelError::Io(io),
        other => ModelError::InvalidMask(format!("{}: {other}", path.display())),
    })?;
    Ok(img.to_luma8())
}

fn load_faces(path: &Path) -> Result<Vec<FaceLandmarks>, ModelError> {
    let content = std::fs::read_to_string(path)?;
    let file: LandmarkFile = serde_json::from_str(&content)?;

    file.faces
        .into_iter()
        .map(|face| {
            if face.landmarks.is_empty() {
                return Err(ModelError::InvalidLandmarks(format!(
                    "{}: face without landmarks",
                    path.display()
                )));
            }
            if face
                .landmarks
                .iter()
                .any(|p| !p.x.is_finite() || !p.y.is_finite())
            {
                return Err(ModelError::InvalidLandmarks(format!(
                    "{}: non-finite coordinate",
                    path.display()
                )));
            }
            Ok(FaceLandmarks {
                points: face.landmarks,
                confidence: face.confidence,
            })
        })
        .collect()
}

struct MatteSession {
    matte: GrayImage,
}

impl Segmenter for MatteSession {
    fn segment(&mut self, image: &RgbImage) -> Result<ProbabilityMap, ModelError> {
        if self.matte.width() == 0 || self.matte.height() == 0 {
            return Err(ModelError::InvalidMask("matte has zero size".into()));
        }
        let matte = if self.matte.dimensions() == image.dimensions() {
            self.matte.clone()
        } else {
            image::imageops::resize(&self.matte, image.width(), image.height(), FilterType::Triangle)
        };
        Ok(ProbabilityMap::from_fn(matte.width(), matte.height(), |x, y| {
            Luma([matte.get_pixel(x, y)[0] as f32 / 255.0])
        }))
    }
}

struct LandmarkSession {
    faces: Vec<FaceLandmarks>,
    options: DetectorOptions,
}

impl LandmarkDetector for LandmarkSession {
    fn detect(&mut self, _image: &RgbImage) -> Result<Option<FaceLandmarks>, ModelError> {
        Ok(self
            .faces
            .iter()
            .filter(|f| f.confidence >= self.options.min_detection_confidence)
            .take(self.options.max_faces as usize)
            .next()
            .cloned())
    }
}

impl ModelProvider for SidecarModels {
    fn segmenter(&self) -> Result<Box<dyn Segmenter + '_>, ModelError> {
        let matte = load_matte(&self.mask_path)?;
        Ok(Box::new(MatteSession { matte }))
    }

    fn landmark_detector(
        &self,
        options: &DetectorOptions,
    ) -> Result<Box<dyn LandmarkDetector + '_>, ModelError> {
        match &self.faces {
            FaceSource::Landmarks(path) => Ok(Box::new(LandmarkSession {
                faces: load_faces(path)?,
                options: *options,
            })),
            FaceSource::SeetaFace(detector) => Ok(Box::new(detector.session(options))),
        }
    }
}
