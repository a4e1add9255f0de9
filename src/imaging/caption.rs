//! Caption font acquisition and text drawing.
//!
//! The caption font is an injected resource: a [`FontProvider`] hands the
//! compositor a parsed font once per request. [`FontLoader`] reads it from
//! disk or fetches it over HTTP with a bounded timeout; [`StaticFont`] wraps
//! a font already in memory. Every failure surfaces as
//! [`PipelineError::FontLoadFailure`].
//!
//! The caption is centered in the bottom margin band and drawn twice: first
//! stamped at every offset within the outline width in the outline color,
//! then once on top in the text color.

use super::calculations::centered_in_band;
use crate::error::PipelineError;
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Upper bound on a downloaded font file.
const MAX_FONT_BYTES: u64 = 16 * 1024 * 1024;

/// Where the caption font comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Path(PathBuf),
    Url(String),
}

impl FontSource {
    /// `http://` and `https://` references are URLs, anything else a path.
    pub fn parse(reference: &str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Self::Url(reference.to_string())
        } else {
            Self::Path(PathBuf::from(reference))
        }
    }
}

/// Supplies the caption font for one render.
pub trait FontProvider: Sync {
    fn load(&self) -> Result<FontArc, PipelineError>;
}

/// Loads a font from a path or URL on every call.
#[derive(Debug, Clone)]
pub struct FontLoader {
    pub source: FontSource,
    pub timeout: Duration,
}

impl FontLoader {
    pub fn new(source: FontSource, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let response = ureq::get(url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    PipelineError::FontLoadFailure(format!("{url}: HTTP {code}"))
                }
                ureq::Error::Transport(t) => PipelineError::FontLoadFailure(format!("{url}: {t}")),
            })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_FONT_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| PipelineError::FontLoadFailure(format!("{url}: {e}")))?;
        if bytes.len() as u64 > MAX_FONT_BYTES {
            return Err(PipelineError::FontLoadFailure(format!(
                "{url}: font larger than {MAX_FONT_BYTES} bytes"
            )));
        }
        Ok(bytes)
    }
}

impl FontProvider for FontLoader {
    fn load(&self) -> Result<FontArc, PipelineError> {
        let (bytes, origin) = match &self.source {
            FontSource::Path(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    PipelineError::FontLoadFailure(format!("{}: {e}", path.display()))
                })?;
                (bytes, path.display().to_string())
            }
            FontSource::Url(url) => (self.fetch(url)?, url.clone()),
        };
        debug!(origin = %origin, bytes = bytes.len(), "caption font loaded");
        FontArc::try_from_vec(bytes)
            .map_err(|e| PipelineError::FontLoadFailure(format!("{origin}: {e}")))
    }
}

/// A font that is already parsed.
#[derive(Clone)]
pub struct StaticFont(pub FontArc);

impl FontProvider for StaticFont {
    fn load(&self) -> Result<FontArc, PipelineError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionStyle {
    /// Glyph height in pixels.
    pub font_size: f32,
    pub text_color: Rgb<u8>,
    pub outline_color: Rgb<u8>,
    /// Outline stroke in pixels; 0 draws no outline.
    pub outline_width: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 56.0,
            text_color: Rgb([0xff, 0xd8, 0x00]),
            outline_color: Rgb([0x4a, 0x00, 0x08]),
            outline_width: 2,
        }
    }
}

/// Substitute `name` into every `{name}` placeholder of `template`.
pub fn render_caption(template: &str, name: &str) -> String {
    template.replace("{name}", name)
}

/// Draw `text` centered in the band `[band_top, band_top + band_height)`.
///
/// Returns the top-left origin the text was drawn at.
pub fn draw_caption(
    canvas: &mut RgbImage,
    text: &str,
    font: &FontArc,
    style: &CaptionStyle,
    band_top: u32,
    band_height: u32,
) -> (i32, i32) {
    let scale = PxScale::from(style.font_size);
    let size = text_size(scale, font, text);
    let (x, y) = centered_in_band(canvas.width(), band_top, band_height, size);

    let w = style.outline_width as i32;
    for dy in -w..=w {
        for dx in -w..=w {
            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= w * w {
                draw_text_mut(canvas, style.outline_color, x + dx, y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(canvas, style.text_color, x, y, scale, font, text);
    debug!(x, y, width = size.0, height = size.1, "caption drawn");
    (x, y)
}
