//! Parameter types for the pipeline stages.
//!
//! These structs describe *what* a stage should do, not *how*. The stage
//! modules consume them; [`config`](crate::config) produces them from the
//! user's TOML.
//!
//! ## Types
//!
//! - [`HexColor`]: `"#rrggbb"` color, validated when deserialized.
//! - [`Palette`]: the two colors every mosaic pixel collapses to.
//! - [`BlockSizing`]: how the mosaic block size is derived from the crop.
//! - [`FeatherRadius`]: Gaussian feathering radius for the alpha edge.
//! - [`DetectorOptions`]: landmark-detector limits.

use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque sRGB color written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(pub [u8; 3]);

impl HexColor {
    pub const WHITE: HexColor = HexColor([255, 255, 255]);

    /// Parse `#rrggbb` (the leading `#` is required, case-insensitive).
    pub fn parse(s: &str) -> Result<Self, String> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{s}' must be of the form #rrggbb"));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self([r, g, b])),
            _ => Err(format!("color '{s}' must be of the form #rrggbb")),
        }
    }

    pub fn rgb(self) -> Rgb<u8> {
        Rgb(self.0)
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// The bichromatic palette of the mosaic.
///
/// Pixels at or below the luminance threshold become `red`, brighter pixels
/// become `skin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub red: Rgb<u8>,
    pub skin: Rgb<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            red: Rgb([255, 0, 0]),
            skin: Rgb([255, 227, 132]),
        }
    }
}

/// Block-size policy for mosaic quantization.
///
/// Both policies feed the same resample-and-recolor algorithm; they only
/// differ in how coarse the blocks get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSizing {
    /// Block edge = `max(1, min(width, height) / resolution)`.
    Resolution(u32),
    /// Block edge = `max(1, height / blocks)`: a fixed number of block rows.
    HeightBlocks(u32),
}

impl Default for BlockSizing {
    fn default() -> Self {
        Self::Resolution(1000)
    }
}

/// Gaussian feathering radius in pixels.
///
/// The kernel spans `2 * radius + 1` taps with `sigma = radius`. A radius
/// of zero disables feathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatherRadius(pub u32);

impl FeatherRadius {
    pub fn kernel_size(self) -> usize {
        2 * self.0 as usize + 1
    }

    pub fn sigma(self) -> f32 {
        self.0 as f32
    }

    pub fn is_disabled(self) -> bool {
        self.0 == 0
    }
}

impl Default for FeatherRadius {
    fn default() -> Self {
        Self(5)
    }
}

/// Limits handed to a landmark detector when it is acquired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    /// Maximum number of faces the detector should report.
    pub max_faces: u32,
    /// Faces scoring below this are discarded.
    pub min_detection_confidence: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            min_detection_confidence: 0.5,
        }
    }
}
