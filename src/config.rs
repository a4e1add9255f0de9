//! Poster configuration module.
//!
//! Handles loading, validating, and merging the poster `config.toml`. Stock
//! defaults reproduce the classic poster look; a user file only overrides
//! the values it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [extract]
//! foreground_threshold = 0.1     # Segmentation probability cut-off
//! side_margin = 0.2              # Horizontal margin, fraction of face width
//! neck_extension = 0.2           # Extension below the chin, fraction of face height
//! min_detection_confidence = 0.5
//! max_faces = 1
//! # face_model = "models/seeta_fd_frontal_v1.0.bin"  # in-process face detection
//!
//! [mosaic]
//! block_sizing = "resolution"    # or "height_blocks"
//! resolution = 1000              # block = min(w, h) / resolution
//! height_blocks = 120            # block = h / height_blocks
//! red = "#ff0000"
//! skin = "#ffe384"
//!
//! [background]
//! style = "radial"               # or "solid"
//! width = 1024
//! height = 600
//! red_white_gamma = 2.6
//! center_white_gamma = 0.9
//! solid_color = "#ffffff"
//!
//! [composite]
//! person_height = 400
//! person_top = 50
//! feather_radius = 5
//! padding = 100
//! margin_color = "#b3121e"
//!
//! [caption]
//! # font = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"
//! font_size = 56.0
//! template = "{name}, Hero of the People"
//! text_color = "#ffd800"
//! outline_color = "#4a0008"
//! outline_width = 2
//! timeout_secs = 10
//!
//! [debug]
//! # snapshot_dir = "debug"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [background]
//! style = "solid"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    BackgroundStyle, BlockSizing, CaptionStyle, CompositeParams, DetectorOptions, ExtractParams,
    FeatherRadius, FontLoader, FontSource, HexColor, MosaicParams, Palette, RadialParams,
    padded_dimensions,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Largest poster edge, in pixels, a config may ask for.
pub const MAX_CANVAS_EDGE: u32 = 16_384;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Poster configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PosterConfig {
    /// Segmentation threshold and face-crop geometry.
    pub extract: ExtractConfig,
    /// Mosaic block sizing and the two-tone palette.
    pub mosaic: MosaicConfig,
    /// Inner background canvas.
    pub background: BackgroundConfig,
    /// Foreground placement, feathering and outer margin.
    pub composite: CompositeConfig,
    /// Caption font and styling.
    pub caption: CaptionConfig,
    /// Intermediate snapshots for troubleshooting.
    pub debug: DebugConfig,
}

impl PosterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.extract;
        if !(0.0..=1.0).contains(&e.foreground_threshold) {
            return Err(invalid("extract.foreground_threshold must be within 0-1"));
        }
        if !(0.0..=1.0).contains(&e.min_detection_confidence) {
            return Err(invalid("extract.min_detection_confidence must be within 0-1"));
        }
        if e.side_margin < 0.0 || e.neck_extension < 0.0 {
            return Err(invalid(
                "extract.side_margin and extract.neck_extension must not be negative",
            ));
        }
        if e.max_faces == 0 {
            return Err(invalid("extract.max_faces must be at least 1"));
        }

        let m = &self.mosaic;
        if m.resolution == 0 || m.height_blocks == 0 {
            return Err(invalid(
                "mosaic.resolution and mosaic.height_blocks must be non-zero",
            ));
        }

        let b = &self.background;
        if b.width == 0 || b.height == 0 {
            return Err(invalid("background.width and background.height must be non-zero"));
        }
        if !positive(b.red_white_gamma) || !positive(b.center_white_gamma) {
            return Err(invalid("background gammas must be positive"));
        }

        let c = &self.composite;
        if c.person_height == 0 {
            return Err(invalid("composite.person_height must be non-zero"));
        }
        if c
            .person_top
            .checked_add(c.person_height)
            .is_none_or(|bottom| bottom > b.height)
        {
            return Err(invalid(
                "composite.person_top + composite.person_height must fit inside background.height",
            ));
        }
        match self.canvas_size() {
            Some((width, height)) if width <= MAX_CANVAS_EDGE && height <= MAX_CANVAS_EDGE => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "background plus 2 x composite.padding must not exceed {MAX_CANVAS_EDGE} pixels per edge"
                )));
            }
        }

        let t = &self.caption;
        if !positive(t.font_size as f64) {
            return Err(invalid("caption.font_size must be positive"));
        }
        if t.timeout_secs == 0 {
            return Err(invalid("caption.timeout_secs must be non-zero"));
        }
        if !t.template.contains("{name}") {
            return Err(invalid("caption.template must contain {name}"));
        }
        Ok(())
    }

    /// Final poster size: the background plus the margin on every side.
    ///
    /// `None` when the size does not fit in `u32`.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        padded_dimensions(
            (self.background.width, self.background.height),
            self.composite.padding,
        )
    }
}

/// Finite and strictly above zero.
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.into())
}

/// Subject extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Pixels with foreground probability above this are kept.
    pub foreground_threshold: f32,
    /// Horizontal margin on each side of the face, as a fraction of its width.
    pub side_margin: f64,
    /// Extension below the chin, as a fraction of the face height.
    pub neck_extension: f64,
    /// Faces scoring below this are ignored.
    pub min_detection_confidence: f32,
    /// Maximum number of faces the detector reports.
    pub max_faces: u32,
    /// SeetaFace model file for in-process face detection. When unset, faces
    /// come from a landmark sidecar.
    pub face_model: Option<PathBuf>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            foreground_threshold: 0.1,
            side_margin: 0.2,
            neck_extension: 0.2,
            min_detection_confidence: 0.5,
            max_faces: 1,
            face_model: None,
        }
    }
}

impl ExtractConfig {
    pub fn params(&self) -> ExtractParams {
        ExtractParams {
            foreground_threshold: self.foreground_threshold,
            side_margin: self.side_margin,
            neck_extension: self.neck_extension,
            detector: DetectorOptions {
                max_faces: self.max_faces,
                min_detection_confidence: self.min_detection_confidence,
            },
        }
    }
}

/// Which mosaic block-size policy is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSizingMode {
    #[default]
    Resolution,
    HeightBlocks,
}

/// Mosaic quantization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MosaicConfig {
    pub block_sizing: BlockSizingMode,
    /// Used when `block_sizing = "resolution"`.
    pub resolution: u32,
    /// Used when `block_sizing = "height_blocks"`.
    pub height_blocks: u32,
    /// Color for pixels at or below the mean luminance.
    pub red: HexColor,
    /// Color for pixels above the mean luminance.
    pub skin: HexColor,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            block_sizing: BlockSizingMode::Resolution,
            resolution: 1000,
            height_blocks: 120,
            red: HexColor([0xff, 0x00, 0x00]),
            skin: HexColor([0xff, 0xe3, 0x84]),
        }
    }
}

impl MosaicConfig {
    pub fn params(&self) -> MosaicParams {
        MosaicParams {
            sizing: match self.block_sizing {
                BlockSizingMode::Resolution => BlockSizing::Resolution(self.resolution),
                BlockSizingMode::HeightBlocks => BlockSizing::HeightBlocks(self.height_blocks),
            },
            palette: Palette {
                red: self.red.rgb(),
                skin: self.skin.rgb(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundKind {
    #[default]
    Radial,
    Solid,
}

/// Inner background canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    pub style: BackgroundKind,
    pub width: u32,
    pub height: u32,
    /// Skews the ray intensities toward red.
    pub red_white_gamma: f64,
    /// Shapes the white glow around the center.
    pub center_white_gamma: f64,
    /// Fill for `style = "solid"`.
    pub solid_color: HexColor,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            style: BackgroundKind::Radial,
            width: 1024,
            height: 600,
            red_white_gamma: 2.6,
            center_white_gamma: 0.9,
            solid_color: HexColor::WHITE,
        }
    }
}

impl BackgroundConfig {
    pub fn style(&self) -> BackgroundStyle {
        match self.style {
            BackgroundKind::Radial => BackgroundStyle::Radial(RadialParams {
                red_white_gamma: self.red_white_gamma,
                center_white_gamma: self.center_white_gamma,
            }),
            BackgroundKind::Solid => BackgroundStyle::Solid(self.solid_color.rgb()),
        }
    }
}

/// Compositing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeConfig {
    pub person_height: u32,
    pub person_top: u32,
    /// Gaussian alpha feathering radius; 0 disables it.
    pub feather_radius: u32,
    /// Margin around the background; the bottom one holds the caption.
    pub padding: u32,
    pub margin_color: HexColor,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            person_height: 400,
            person_top: 50,
            feather_radius: 5,
            padding: 100,
            margin_color: HexColor([0xb3, 0x12, 0x1e]),
        }
    }
}

impl CompositeConfig {
    pub fn params(&self) -> CompositeParams {
        CompositeParams {
            person_height: self.person_height,
            person_top: self.person_top,
            feather: FeatherRadius(self.feather_radius),
            padding: self.padding,
            margin_color: self.margin_color.rgb(),
        }
    }
}

/// Caption settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    /// Font file path or `http(s)://` URL. Required to caption a poster.
    pub font: Option<String>,
    /// Glyph height in pixels.
    pub font_size: f32,
    /// Caption text; `{name}` is replaced with the subject's name.
    pub template: String,
    pub text_color: HexColor,
    pub outline_color: HexColor,
    /// Outline stroke in pixels; 0 disables it.
    pub outline_width: u32,
    /// Download timeout for URL fonts.
    pub timeout_secs: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 56.0,
            template: "{name}, Hero of the People".to_string(),
            text_color: HexColor([0xff, 0xd8, 0x00]),
            outline_color: HexColor([0x4a, 0x00, 0x08]),
            outline_width: 2,
            timeout_secs: 10,
        }
    }
}

impl CaptionConfig {
    pub fn style(&self) -> CaptionStyle {
        CaptionStyle {
            font_size: self.font_size,
            text_color: self.text_color.rgb(),
            outline_color: self.outline_color.rgb(),
            outline_width: self.outline_width,
        }
    }

    /// Loader for the configured font, if any.
    pub fn font_loader(&self) -> Option<FontLoader> {
        self.font.as_deref().map(|reference| {
            FontLoader::new(
                FontSource::parse(reference),
                Duration::from_secs(self.timeout_secs),
            )
        })
    }
}

/// Troubleshooting settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    /// When set, intermediate buffers are written here as PNG.
    pub snapshot_dir: Option<PathBuf>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PosterConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PosterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PosterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the poster config.
///
/// With no path, or a path that does not exist, the stock defaults are used.
/// Otherwise user values are merged on top of the stock defaults, unknown
/// keys are rejected, and the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<PosterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = match path {
        Some(path) => load_raw_config(path)?,
        None => None,
    };
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Poster Portrait Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Subject extraction
# ---------------------------------------------------------------------------
[extract]
# Pixels whose foreground probability is above this are kept (0-1).
foreground_threshold = 0.1

# Horizontal margin on each side of the face, as a fraction of face width.
side_margin = 0.2

# How far the crop extends below the chin, as a fraction of face height.
neck_extension = 0.2

# Faces the landmark detector scores below this are ignored (0-1).
min_detection_confidence = 0.5

# Maximum number of faces reported by the detector.
max_faces = 1

# SeetaFace frontal model (seeta_fd_frontal_v1.0.bin) for in-process face
# detection. Without it, render needs a --landmarks sidecar.
# face_model = "models/seeta_fd_frontal_v1.0.bin"

# ---------------------------------------------------------------------------
# Mosaic
# ---------------------------------------------------------------------------
[mosaic]
# "resolution":    block = min(width, height) / resolution
# "height_blocks": block = height / height_blocks
block_sizing = "resolution"
resolution = 1000
height_blocks = 120

# Pixels at or below the mean luminance become red, brighter ones skin.
red = "#ff0000"
skin = "#ffe384"

# ---------------------------------------------------------------------------
# Background
# ---------------------------------------------------------------------------
[background]
# "radial": red sunburst rays around a white center
# "solid":  flat solid_color
style = "radial"
width = 1024
height = 600

# Higher values push the ray intensities toward strong red.
red_white_gamma = 2.6

# Lower values widen the white glow around the center.
center_white_gamma = 0.9

solid_color = "#ffffff"

# ---------------------------------------------------------------------------
# Compositing
# ---------------------------------------------------------------------------
[composite]
# The subject is scaled to this height and centered horizontally.
person_height = 400

# Distance from the top of the background to the top of the subject.
person_top = 50

# Gaussian feathering of the subject's edge, in pixels (0 = hard edge).
feather_radius = 5

# Margin around the background. The bottom margin holds the caption.
padding = 100
margin_color = "#b3121e"

# ---------------------------------------------------------------------------
# Caption
# ---------------------------------------------------------------------------
[caption]
# Font file path or http(s) URL. Required when a name is given.
# font = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"

# Glyph height in pixels.
font_size = 56.0

# {name} is replaced with the subject's name.
template = "{name}, Hero of the People"

text_color = "#ffd800"
outline_color = "#4a0008"

# Outline stroke in pixels (0 = no outline).
outline_width = 2

# Download timeout for URL fonts, in seconds.
timeout_secs = 10

# ---------------------------------------------------------------------------
# Debugging
# ---------------------------------------------------------------------------
[debug]
# Write intermediate buffers (matte, crop, mosaic) as PNG here.
# snapshot_dir = "debug"
"##
}
