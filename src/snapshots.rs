//! Debug snapshots of intermediate pipeline buffers.
//!
//! When `debug.snapshot_dir` is configured, the pipeline saves the buffers
//! that are hardest to reason about from the final poster alone:
//!
//! | File | Buffer |
//! |---|---|
//! | `person_only_with_alpha.png` | full-frame photo with the segmentation matte as alpha |
//! | `face_only_with_alpha_cropped.png` | the face crop handed to the mosaic stage |
//! | `mosaic.png` | the two-tone mosaic |
//!
//! A snapshot is written only after the stage producing it succeeded. Write
//! failures are logged and never abort a render.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MATTE: &str = "person_only_with_alpha.png";
pub const CROP: &str = "face_only_with_alpha_cropped.png";
pub const MOSAIC: &str = "mosaic.png";

/// Optional snapshot sink.
#[derive(Debug, Clone, Default)]
pub struct Snapshots {
    dir: Option<PathBuf>,
}

impl Snapshots {
    pub fn new(dir: Option<&Path>) -> Self {
        Self {
            dir: dir.map(Path::to_path_buf),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Save `image` as `file_name`; returns the written path.
    pub fn save(&self, file_name: &str, image: &RgbaImage) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(file_name);
        let result = std::fs::create_dir_all(dir)
            .map_err(image::ImageError::IoError)
            .and_then(|()| image.save(&path));
        match result {
            Ok(()) => {
                debug!(path = %path.display(), "snapshot written");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to write snapshot");
                None
            }
        }
    }
}
