//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every render is summarized by what each stage decided (crop, mosaic
//! level, placement) rather than by the files involved; the output path
//! shows up once, as secondary context.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! Source 1200x1600 (3 channels)
//!     Crop: (396, 210) to (804, 1015), 408x805
//!     Mosaic: 1px blocks, threshold 118.4
//!     Placement: (410, 50), 203x400
//! Poster 1224x800
//!     Caption: Alice, Hero of the People
//!     Output: poster.png
//! ```
//!
//! ## Background
//!
//! ```text
//! Background 1024x600 (seed 7)
//!     Output: background.png
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O and no side effects.

use crate::pipeline::RenderReport;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn dims((width, height): (u32, u32)) -> String {
    format!("{width}x{height}")
}

// ============================================================================
// Render
// ============================================================================

/// Format the summary of a finished render.
pub fn format_render_report(report: &RenderReport, output: &Path) -> Vec<String> {
    let crop = report.crop;
    let placement = report.placement;
    let mut lines = vec![
        format!(
            "Source {} ({} channels)",
            dims(report.source),
            report.channels
        ),
        format!(
            "{}Crop: ({}, {}) to ({}, {}), {}",
            indent(1),
            crop.left,
            crop.top,
            crop.right,
            crop.bottom,
            dims((crop.width(), crop.height()))
        ),
        format!(
            "{}Mosaic: {}px blocks, threshold {:.1}",
            indent(1),
            report.block_size,
            report.threshold
        ),
        format!(
            "{}Placement: ({}, {}), {}",
            indent(1),
            placement.x,
            placement.y,
            dims((placement.width, placement.height))
        ),
        format!("Poster {}", dims(report.canvas)),
    ];
    if let Some(caption) = &report.caption {
        lines.push(format!("{}Caption: {caption}", indent(1)));
    }
    lines.push(format!("{}Output: {}", indent(1), output.display()));
    lines
}

/// Print render summary to stdout.
pub fn print_render_report(report: &RenderReport, output: &Path) {
    for line in format_render_report(report, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Background
// ============================================================================

/// Format the summary of a standalone background render.
pub fn format_background_output(size: (u32, u32), seed: Option<u64>, output: &Path) -> Vec<String> {
    let header = match seed {
        Some(seed) => format!("Background {} (seed {seed})", dims(size)),
        None => format!("Background {}", dims(size)),
    };
    vec![header, format!("{}Output: {}", indent(1), output.display())]
}

/// Print background summary to stdout.
pub fn print_background_output(size: (u32, u32), seed: Option<u64>, output: &Path) {
    for line in format_background_output(size, seed, output) {
        println!("{}", line);
    }
}
