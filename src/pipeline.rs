//! Request-scoped poster pipeline.
//!
//! ```text
//! photo ─► extract ─► mosaic ─► composite onto background ─► caption ─► poster
//! ```
//!
//! One call to [`Pipeline::render`] is one request: it runs every stage in
//! order on buffers it owns and returns either a finished poster or the
//! first stage error, unchanged. No partial poster is ever returned. Model
//! sessions live only inside the extract stage; the caption font is loaded
//! at the start of the request, so resource failures surface before any
//! pixel work.

use crate::config::PosterConfig;
use crate::error::PipelineError;
use crate::imaging::caption::{draw_caption, render_caption};
use crate::imaging::composite::composite;
use crate::imaging::mosaic::quantize;
use crate::imaging::{
    CropRect, FontProvider, ModelProvider, Placement, extract_subject, render_background,
};
use crate::snapshots::{self, Snapshots};
use ab_glyph::FontArc;
use image::{DynamicImage, GenericImageView, RgbImage};
use rand::Rng;
use tracing::{debug, info, info_span};

/// What happened during a render, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Source photo dimensions.
    pub source: (u32, u32),
    /// Channel count of the decoded source.
    pub channels: u8,
    /// Face crop in source coordinates.
    pub crop: CropRect,
    /// Mosaic block edge in pixels.
    pub block_size: u32,
    /// Mean luma used as the red/skin threshold.
    pub threshold: f64,
    /// Subject placement on the inner background.
    pub placement: Placement,
    /// Final poster size.
    pub canvas: (u32, u32),
    /// Caption text, when a name was given.
    pub caption: Option<String>,
}

/// A finished poster.
#[derive(Debug, Clone)]
pub struct Poster {
    pub image: RgbImage,
    pub report: RenderReport,
}

/// The poster pipeline bound to one configuration and its resources.
///
/// Holds no per-request state; [`render`](Self::render) can be called
/// repeatedly and from several threads at once.
pub struct Pipeline<'a> {
    config: &'a PosterConfig,
    models: &'a dyn ModelProvider,
    fonts: Option<&'a dyn FontProvider>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline that loads its caption font from `config.caption.font`.
    pub fn new(config: &'a PosterConfig, models: &'a dyn ModelProvider) -> Self {
        Self {
            config,
            models,
            fonts: None,
        }
    }

    /// Use `fonts` instead of the configured font reference.
    pub fn with_fonts(mut self, fonts: &'a dyn FontProvider) -> Self {
        self.fonts = Some(fonts);
        self
    }

    fn load_font(&self) -> Result<FontArc, PipelineError> {
        if let Some(fonts) = self.fonts {
            return fonts.load();
        }
        match self.config.caption.font_loader() {
            Some(loader) => loader.load(),
            None => Err(PipelineError::FontLoadFailure(
                "no caption font configured (caption.font)".into(),
            )),
        }
    }

    /// Turn `photo` into a poster, captioned with `name` when given.
    ///
    /// `rng` drives the radial background; pass a seeded generator for
    /// reproducible output.
    pub fn render<R: Rng + ?Sized>(
        &self,
        photo: &DynamicImage,
        name: Option<&str>,
        rng: &mut R,
    ) -> Result<Poster, PipelineError> {
        let (width, height) = photo.dimensions();
        let channels = photo.color().channel_count();
        let _span = info_span!("render", width, height, channels).entered();

        let config = self.config;
        config
            .validate()
            .map_err(|e| PipelineError::ProcessingFailed(e.to_string()))?;
        let snapshots = Snapshots::new(config.debug.snapshot_dir.as_deref());

        let caption = match name {
            Some(name) => Some((render_caption(&config.caption.template, name), self.load_font()?)),
            None => None,
        };

        let extraction = extract_subject(photo, self.models, &config.extract.params())?;
        snapshots.save(snapshots::MATTE, &extraction.matte);
        snapshots.save(snapshots::CROP, &extraction.subject);

        let mosaic = quantize(&extraction.subject, &config.mosaic.params())?;
        snapshots.save(snapshots::MOSAIC, &mosaic.image);

        let background = render_background(
            config.background.width,
            config.background.height,
            &config.background.style(),
            rng,
        );
        let mut composed = composite(&mosaic.image, &background, &config.composite.params())?;

        if let Some((text, font)) = &caption {
            draw_caption(
                &mut composed.canvas,
                text,
                font,
                &config.caption.style(),
                composed.caption_band_top,
                composed.caption_band_height,
            );
        } else {
            debug!("no name given, caption skipped");
        }

        let report = RenderReport {
            source: (width, height),
            channels,
            crop: extraction.crop,
            block_size: mosaic.block_size,
            threshold: mosaic.threshold,
            placement: composed.placement,
            canvas: composed.canvas.dimensions(),
            caption: caption.map(|(text, _)| text),
        };
        info!(
            canvas_width = report.canvas.0,
            canvas_height = report.canvas.1,
            "poster rendered"
        );
        Ok(Poster {
            image: composed.canvas,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::StaticFont;
    use crate::imaging::detection::tests::MockModels;
    use crate::test_helpers::{fixture_font, portrait_models, synthetic_portrait};
    use image::Rgb;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    fn small_config() -> PosterConfig {
        let mut config = PosterConfig::default();
        config.background.width = 200;
        config.background.height = 120;
        config.composite.person_height = 80;
        config.composite.person_top = 10;
        config.composite.padding = 20;
        config
    }

    #[test]
    fn renders_fixed_size_poster_without_caption() {
        let config = small_config();
        let models = portrait_models();
        let poster = Pipeline::new(&config, &models)
            .render(&synthetic_portrait(), None, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(poster.image.dimensions(), (240, 160));
        assert_eq!(poster.report.canvas, (240, 160));
        assert_eq!(poster.report.source, (160, 160));
        assert_eq!(poster.report.channels, 3);
        assert_eq!(poster.report.caption, None);
        assert_eq!(poster.report.placement.height, 80);
        assert!(models.all_released());
    }

    #[test]
    fn subject_area_is_two_toned() {
        let config = small_config();
        let models = portrait_models();
        let poster = Pipeline::new(&config, &models)
            .render(&synthetic_portrait(), None, &mut StdRng::seed_from_u64(2))
            .unwrap();

        // Center of the placed subject, well inside the feathered edge
        let p = poster.report.placement;
        let x = 20 + p.x as u32 + p.width / 2;
        let y = 20 + p.y as u32 + p.height / 2;
        let pixel = *poster.image.get_pixel(x, y);
        assert!(
            pixel == Rgb([255, 0, 0]) || pixel == Rgb([255, 227, 132]),
            "subject pixel {pixel:?}"
        );
    }

    #[test]
    fn seeded_renders_are_identical() {
        let config = small_config();
        let models = portrait_models();
        let pipeline = Pipeline::new(&config, &models);
        let a = pipeline
            .render(&synthetic_portrait(), None, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let b = pipeline
            .render(&synthetic_portrait(), None, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn no_face_fails_without_snapshots() {
        let tmp = TempDir::new().unwrap();
        let mut config = small_config();
        config.debug.snapshot_dir = Some(tmp.path().join("debug"));
        let models = MockModels::with_mask(160, 160, |_, _| 1.0);

        let result = Pipeline::new(&config, &models).render(
            &synthetic_portrait(),
            None,
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(PipelineError::NoFaceDetected)));
        assert!(!tmp.path().join("debug").exists());
        assert!(models.all_released());
    }

    #[test]
    fn snapshots_are_written_after_each_stage() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("debug");
        let mut config = small_config();
        config.debug.snapshot_dir = Some(dir.clone());
        let models = portrait_models();

        Pipeline::new(&config, &models)
            .render(&synthetic_portrait(), None, &mut StdRng::seed_from_u64(0))
            .unwrap();
        for file in [snapshots::MATTE, snapshots::CROP, snapshots::MOSAIC] {
            assert!(dir.join(file).exists(), "missing {file}");
        }
    }

    #[test]
    fn name_without_font_is_font_load_failure() {
        let config = small_config();
        let models = portrait_models();
        let result = Pipeline::new(&config, &models).render(
            &synthetic_portrait(),
            Some("Alice"),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(PipelineError::FontLoadFailure(_))));
        // Fails before any model session is opened
        assert!(models.events().is_empty());
    }

    #[test]
    fn caption_is_drawn_in_bottom_margin() {
        let font = fixture_font();
        let mut config = small_config();
        config.caption.font_size = 14.0;
        let models = portrait_models();
        let fonts = StaticFont(font);

        let plain = Pipeline::new(&config, &models)
            .render(&synthetic_portrait(), None, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let captioned = Pipeline::new(&config, &models)
            .with_fonts(&fonts)
            .render(&synthetic_portrait(), Some("Alice"), &mut StdRng::seed_from_u64(3))
            .unwrap();

        assert_eq!(
            captioned.report.caption.as_deref(),
            Some("Alice, Hero of the People")
        );
        let differing: Vec<u32> = plain
            .image
            .enumerate_pixels()
            .zip(captioned.image.pixels())
            .filter(|((_, _, a), b)| a != b)
            .map(|((_, y, _), _)| y)
            .collect();
        assert!(!differing.is_empty());
        // Bottom band starts at padding + background height
        assert!(differing.iter().all(|&y| y >= 140));
    }

    #[test]
    fn invalid_config_is_processing_failure() {
        let mut config = small_config();
        config.composite.person_height = 500;
        let models = portrait_models();
        let result = Pipeline::new(&config, &models).render(
            &synthetic_portrait(),
            None,
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(PipelineError::ProcessingFailed(_))));
    }
}
