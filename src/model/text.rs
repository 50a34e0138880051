//! Text-level types: runs, lines and text blocks.

use serde::{Deserialize, Serialize};

/// A font size rounded to two decimal places.
///
/// Stored as hundredths of a point so that sizes that round to the same
/// value compare equal, hash equal and sort by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FontSize(i64);

impl FontSize {
    /// Round a size in points to two decimals.
    pub fn from_points(points: f32) -> Self {
        if !points.is_finite() {
            return FontSize(0);
        }
        FontSize((f64::from(points) * 100.0).round() as i64)
    }

    /// Size in points.
    pub fn points(&self) -> f32 {
        self.0 as f32 / 100.0
    }

    /// Size in hundredths of a point.
    pub fn hundredths(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for FontSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.points())
    }
}

/// A contiguous span of text sharing one font size and one font name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// The text content
    pub text: String,
    /// Rounded font size
    pub font_size: FontSize,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl Run {
    /// Create a new run, rounding the size.
    pub fn new(text: impl Into<String>, font_size: f32, font_name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: FontSize::from_points(font_size),
            font_name: font_name.into(),
        }
    }

    /// Whether the run carries no visible characters.
    pub fn is_whitespace(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether the font name marks the run as bold.
    pub fn is_bold(&self) -> bool {
        let name = self.font_name.to_lowercase();
        name.contains("bold") || name.contains("black")
    }

    /// Whether the font name marks the run as italic.
    pub fn is_italic(&self) -> bool {
        let name = self.font_name.to_lowercase();
        name.contains("italic") || name.contains("oblique")
    }
}

/// An ordered group of runs forming one visual text row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// The runs in reading order
    pub runs: Vec<Run>,
}

impl Line {
    /// Create a line from runs.
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    /// Largest size among runs that carry text; used for heading decisions.
    ///
    /// Returns the zero size for a line without any text.
    pub fn dominant_size(&self) -> FontSize {
        self.runs
            .iter()
            .filter(|r| !r.text.is_empty())
            .map(|r| r.font_size)
            .max()
            .unwrap_or_default()
    }

    /// Unformatted text of the line.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the line has no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// A block of text lines in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// The lines in this block
    pub lines: Vec<Line>,
}

impl TextBlock {
    /// Create a new text block.
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Check if the block has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
