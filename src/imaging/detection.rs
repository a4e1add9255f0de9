//! Model capability traits for subject segmentation and face landmarks.
//!
//! The extractor never talks to a model runtime directly. It asks a
//! [`ModelProvider`] for a fresh [`Segmenter`] and [`LandmarkDetector`] per
//! call; both are released when they go out of scope, on success and on
//! every error path alike. A provider is shared (`Sync`), sessions never are,
//! so concurrent requests each work with their own instances.
//!
//! The production implementation is
//! [`SidecarModels`](super::sidecar::SidecarModels), which reads the
//! segmentation matte from disk and takes faces either from a landmark file
//! or from the in-process [`SeetaFaceDetector`](super::seeta::SeetaFaceDetector).

use super::params::DetectorOptions;
use image::{ImageBuffer, Luma, RgbImage};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid segmentation mask: {0}")]
    InvalidMask(String),
    #[error("invalid landmarks: {0}")]
    InvalidLandmarks(String),
    #[error("invalid face model: {0}")]
    InvalidModel(String),
}

/// Per-pixel foreground probability in `[0, 1]`, same size as the image.
pub type ProbabilityMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// One landmark in normalized image coordinates (`0..=1` on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

/// Landmarks of a single detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    pub points: Vec<Landmark>,
    pub confidence: f32,
}

impl FaceLandmarks {
    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

/// Binary subject/background segmentation.
pub trait Segmenter {
    /// Foreground probability for every pixel of `image`.
    fn segment(&mut self, image: &RgbImage) -> Result<ProbabilityMap, ModelError>;
}

/// Facial landmark detection.
pub trait LandmarkDetector {
    /// Landmarks of the most prominent face, or `None` when no face passes
    /// the detector's confidence threshold.
    fn detect(&mut self, image: &RgbImage) -> Result<Option<FaceLandmarks>, ModelError>;
}

/// Factory for per-request model sessions.
pub trait ModelProvider: Sync {
    /// Acquire a segmentation session.
    fn segmenter(&self) -> Result<Box<dyn Segmenter + '_>, ModelError>;

    /// Acquire a landmark-detection session configured with `options`.
    fn landmark_detector(
        &self,
        options: &DetectorOptions,
    ) -> Result<Box<dyn LandmarkDetector + '_>, ModelError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock provider returning a fixed mask and landmark set.
    ///
    /// Records every session acquire/release and model call so tests can
    /// assert that sessions are released on all exit paths.
    /// Uses Mutex (not RefCell) so it satisfies the `Sync` bound.
    #[derive(Default)]
    pub struct MockModels {
        pub mask: Option<ProbabilityMap>,
        pub face: Option<FaceLandmarks>,
        pub fail_segmenter: bool,
        pub events: Mutex<Vec<ModelEvent>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum ModelEvent {
        OpenSegmenter,
        CloseSegmenter,
        OpenDetector(DetectorOptions),
        CloseDetector,
        Segment(u32, u32),
        Detect(u32, u32),
    }

    impl MockModels {
        /// Mask from a closure over pixel coordinates.
        pub fn with_mask(
            width: u32,
            height: u32,
            probability: impl Fn(u32, u32) -> f32,
        ) -> Self {
            Self {
                mask: Some(ImageBuffer::from_fn(width, height, |x, y| {
                    Luma([probability(x, y)])
                })),
                ..Self::default()
            }
        }

        pub fn face(mut self, points: &[(f64, f64)]) -> Self {
            self.face = Some(FaceLandmarks {
                points: points.iter().map(|&(x, y)| Landmark { x, y }).collect(),
                confidence: 0.9,
            });
            self
        }

        pub fn events(&self) -> Vec<ModelEvent> {
            self.events.lock().unwrap().clone()
        }

        /// True when every opened session has been closed again.
        pub fn all_released(&self) -> bool {
            let events = self.events();
            let count = |e: &ModelEvent| events.iter().filter(|x| *x == e).count();
            let opened_detectors = events
                .iter()
                .filter(|e| matches!(e, ModelEvent::OpenDetector(_)))
                .count();
            count(&ModelEvent::OpenSegmenter) == count(&ModelEvent::CloseSegmenter)
                && opened_detectors == count(&ModelEvent::CloseDetector)
        }

        fn record(&self, event: ModelEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct MockSegmenter<'a>(&'a MockModels);

    impl Segmenter for MockSegmenter<'_> {
        fn segment(&mut self, image: &RgbImage) -> Result<ProbabilityMap, ModelError> {
            self.0.record(ModelEvent::Segment(image.width(), image.height()));
            self.0
                .mask
                .clone()
                .ok_or_else(|| ModelError::InvalidMask("no mock mask".into()))
        }
    }

    impl Drop for MockSegmenter<'_> {
        fn drop(&mut self) {
            self.0.record(ModelEvent::CloseSegmenter);
        }
    }

    struct MockDetector<'a>(&'a MockModels);

    impl LandmarkDetector for MockDetector<'_> {
        fn detect(&mut self, image: &RgbImage) -> Result<Option<FaceLandmarks>, ModelError> {
            self.0.record(ModelEvent::Detect(image.width(), image.height()));
            Ok(self.0.face.clone())
        }
    }

    impl Drop for MockDetector<'_> {
        fn drop(&mut self) {
            self.0.record(ModelEvent::CloseDetector);
        }
    }

    impl ModelProvider for MockModels {
        fn segmenter(&self) -> Result<Box<dyn Segmenter + '_>, ModelError> {
            if self.fail_segmenter {
                return Err(ModelError::InvalidMask("segmenter failed to load".into()));
            }
            self.record(ModelEvent::OpenSegmenter);
            Ok(Box::new(MockSegmenter(self)))
        }

        fn landmark_detector(
            &self,
            options: &DetectorOptions,
        ) -> Result<Box<dyn LandmarkDetector + '_>, ModelError> {
            self.record(ModelEvent::OpenDetector(*options));
            Ok(Box::new(MockDetector(self)))
        }
    }

    #[test]
    fn mock_records_session_lifecycle() {
        let models = MockModels::with_mask(4, 4, |_, _| 1.0).face(&[(0.5, 0.5)]);
        {
            let mut seg = models.segmenter().unwrap();
            let mut det = models.landmark_detector(&DetectorOptions::default()).unwrap();
            let img = RgbImage::new(4, 4);
            seg.segment(&img).unwrap();
            assert!(det.detect(&img).unwrap().is_some());
            assert!(!models.all_released());
        }
        assert!(models.all_released());
        assert_eq!(
            models.events(),
            vec![
                ModelEvent::OpenSegmenter,
                ModelEvent::OpenDetector(DetectorOptions::default()),
                ModelEvent::Segment(4, 4),
                ModelEvent::Detect(4, 4),
                ModelEvent::CloseDetector,
                ModelEvent::CloseSegmenter,
            ]
        );
    }

    #[test]
    fn landmark_axes_split() {
        let face = FaceLandmarks {
            points: vec![Landmark { x: 0.1, y: 0.2 }, Landmark { x: 0.3, y: 0.4 }],
            confidence: 1.0,
        };
        assert_eq!(face.xs(), vec![0.1, 0.3]);
        assert_eq!(face.ys(), vec![0.2, 0.4]);
    }
}
