//! Markdown rendering for DOCX paragraphs.
//!
//! Paragraph styles map directly to Markdown: `Heading N` styles become
//! `N` hashes and list styles become bullets.

use super::markdown::{AssembledLine, LineKind};
use super::{ConversionStats, RenderResult};
use crate::model::Metadata;

/// Separator between rendered DOCX paragraphs.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Heading level encoded in a style name such as "Heading 2".
///
/// Takes the first run of digits (1 when there is none) clamped to 1..=6.
/// Returns `None` when the style is not a heading style.
pub fn heading_level(style_name: &str) -> Option<u8> {
    if !style_name.to_lowercase().starts_with("heading") {
        return None;
    }
    let digits: String = style_name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let level = if digits.is_empty() {
        1
    } else {
        // Overlong digit runs saturate rather than fail.
        digits.parse::<u32>().unwrap_or(u32::MAX)
    };
    Some(level.clamp(1, 6) as u8)
}

/// Render one paragraph given its text and style name.
///
/// Blank paragraphs yield an empty paragraph entry.
pub fn map_paragraph(text: &str, style_name: Option<&str>) -> AssembledLine {
    let text = text.trim();
    if text.is_empty() {
        return AssembledLine {
            text: String::new(),
            kind: LineKind::Paragraph,
        };
    }

    let style = style_name.unwrap_or_default();
    if let Some(level) = heading_level(style) {
        return AssembledLine {
            text: format!("{} {}", "#".repeat(level as usize), text),
            kind: LineKind::Heading(level),
        };
    }
    if style.to_lowercase().contains("list") {
        return AssembledLine {
            text: format!("- {}", text),
            kind: LineKind::ListItem,
        };
    }

    AssembledLine {
        text: text.to_string(),
        kind: LineKind::Paragraph,
    }
}

/// Render `(text, style)` paragraphs into one Markdown string.
pub fn render_paragraphs<'a, I>(paragraphs: I, metadata: Metadata) -> RenderResult
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut stats = ConversionStats::new();
    let entries: Vec<String> = paragraphs
        .into_iter()
        .map(|(text, style)| {
            let line = map_paragraph(text, style);
            if !line.text.is_empty() {
                line.record(&mut stats);
            }
            line.text
        })
        .collect();

    let content = entries.join(PARAGRAPH_SEPARATOR).trim().to_string();
    RenderResult::new(content, metadata, stats)
}
