//! Markdown rendering for PDF documents.
//!
//! Rendering is two-pass: the font-size histogram is collected over the
//! whole document first, then every line is emitted with the heading
//! levels derived from it.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::model::{Block, Document, Line, Page, Run};
use crate::parser::{FontHistogram, HeadingLevelMap, PdfBackend, MAX_HEADING_LEVELS};

use super::image::ImageHandler;
use super::{ConversionStats, RenderOptions, RenderResult};

/// Marker placed between consecutive pages.
pub const PAGE_BREAK: &str = "\n---\n";

const BULLET_PATTERN: &str = r"^[•‣◦⁃\-\*]\s+";

fn bullet_regex() -> Option<&'static Regex> {
    static BULLET: OnceLock<Option<Regex>> = OnceLock::new();
    BULLET.get_or_init(|| Regex::new(BULLET_PATTERN).ok()).as_ref()
}

/// Wrap a run in emphasis markers derived from its font name.
///
/// Whitespace-only runs are returned unchanged.
pub fn format_run(run: &Run) -> Cow<'_, str> {
    if run.is_whitespace() {
        return Cow::Borrowed(&run.text);
    }
    match (run.is_bold(), run.is_italic()) {
        (true, true) => Cow::Owned(format!("***{}***", run.text)),
        (true, false) => Cow::Owned(format!("**{}**", run.text)),
        (false, true) => Cow::Owned(format!("*{}*", run.text)),
        (false, false) => Cow::Borrowed(&run.text),
    }
}

/// What an emitted line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "level", rename_all = "snake_case")]
pub enum LineKind {
    /// Heading of the given level (1-6)
    Heading(u8),
    /// Bulleted list item
    ListItem,
    /// Plain text
    Paragraph,
}

/// A rendered Markdown line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledLine {
    /// The Markdown text
    pub text: String,
    /// Line classification
    pub kind: LineKind,
}

impl AssembledLine {
    /// Record this line in conversion statistics.
    pub fn record(&self, stats: &mut ConversionStats) {
        match self.kind {
            LineKind::Heading(_) => stats.add_heading(),
            LineKind::ListItem => stats.add_list_item(),
            LineKind::Paragraph => stats.add_paragraph(),
        }
    }
}

/// Turn one line into Markdown, or `None` when it has no visible text.
///
/// Bullet glyphs take precedence over heading levels.
pub fn assemble_line(line: &Line, headings: &HeadingLevelMap) -> Option<AssembledLine> {
    let raw: String = line.runs.iter().map(format_run).collect();
    let text = raw.replace('\r', "").replace('\t', "    ");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(m) = bullet_regex().and_then(|re| re.find(text)) {
        return Some(AssembledLine {
            text: format!("- {}", &text[m.end()..]),
            kind: LineKind::ListItem,
        });
    }

    let level = headings.level_for(line.dominant_size());
    if (1..=MAX_HEADING_LEVELS as u8).contains(&level) {
        return Some(AssembledLine {
            text: format!("{} {}", "#".repeat(level as usize), text),
            kind: LineKind::Heading(level),
        });
    }

    Some(AssembledLine {
        text: text.to_string(),
        kind: LineKind::Paragraph,
    })
}

/// Renders a decoded PDF document to Markdown.
pub struct PdfMarkdownRenderer<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    options: &'a RenderOptions,
}

impl<'a, B: PdfBackend + ?Sized> PdfMarkdownRenderer<'a, B> {
    /// Create a renderer; the backend supplies image bytes.
    pub fn new(backend: &'a B, options: &'a RenderOptions) -> Self {
        Self { backend, options }
    }

    /// Render the document.
    pub fn render(&self, doc: &Document) -> RenderResult {
        let histogram = FontHistogram::collect(doc);
        let headings = HeadingLevelMap::classify(&histogram);

        let mut images = ImageHandler::new(self.backend, self.options);
        let mut stats = ConversionStats::new();
        let mut entries: Vec<String> = Vec::new();

        let last = doc.pages.len().saturating_sub(1);
        for (index, page) in doc.pages.iter().enumerate() {
            self.render_page(page, &headings, &mut images, &mut stats, &mut entries);
            if index < last {
                entries.push(PAGE_BREAK.to_string());
            }
        }
        images.record(&mut stats);

        let content = entries.join("\n").trim().to_string();
        RenderResult::new(content, doc.metadata.clone(), stats)
    }

    fn render_page(
        &self,
        page: &Page,
        headings: &HeadingLevelMap,
        images: &mut ImageHandler<'_, B>,
        stats: &mut ConversionStats,
        entries: &mut Vec<String>,
    ) {
        stats.add_page();
        let before = entries.len();

        for block in &page.blocks {
            match block {
                Block::Text(text) => {
                    for line in &text.lines {
                        if let Some(assembled) = assemble_line(line, headings) {
                            assembled.record(stats);
                            entries.push(assembled.text);
                        }
                    }
                }
                Block::Image(image) => {
                    if let Some(line) = images.handle(page.number, image) {
                        entries.push(line);
                    }
                }
                Block::Ignored => {}
            }
        }

        log::debug!(
            "Page {}: {} blocks, {} entries",
            page.number,
            page.blocks.len(),
            entries.len() - before
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::{FontSize, ImageData};

    struct NoImages;

    impl PdfBackend for NoImages {
        fn page_count(&self) -> u32 {
            0
        }

        fn load_page(&self, number: u32) -> Result<Page> {
            Ok(Page::new(number))
        }

        fn extract_image(&self, xref: u32) -> Result<ImageData> {
            Err(Error::ImageExtract(xref.to_string()))
        }
    }

    fn headings(sizes: &[f32]) -> HeadingLevelMap {
        let mut h = FontHistogram::new();
        for s in sizes {
            h.add(FontSize::from_points(*s));
        }
        HeadingLevelMap::classify(&h)
    }

    fn line(runs: &[(&str, f32, &str)]) -> Line {
        Line::new(runs.iter().map(|(t, s, f)| Run::new(*t, *s, *f)).collect())
    }

    #[test]
    fn test_format_run() {
        assert_eq!(format_run(&Run::new("Net", 10.0, "Arial-BoldItalic")), "***Net***");
        assert_eq!(format_run(&Run::new("Net", 10.0, "Helvetica-Bold")), "**Net**");
        assert_eq!(format_run(&Run::new("Net", 10.0, "Arial-Black")), "**Net**");
        assert_eq!(format_run(&Run::new("Net", 10.0, "Times-Oblique")), "*Net*");
        assert_eq!(format_run(&Run::new("Net", 10.0, "Times-Roman")), "Net");
        assert_eq!(format_run(&Run::new("  ", 10.0, "Helvetica-Bold")), "  ");
    }

    #[test]
    fn test_assemble_plain_and_empty() {
        let map = headings(&[10.0]);
        let out = assemble_line(&line(&[("  Revenue\tQ1\r ", 10.0, "F")]), &map).unwrap();
        assert_eq!(out.text, "Revenue    Q1");
        assert_eq!(out.kind, LineKind::Paragraph);

        assert!(assemble_line(&line(&[(" \t ", 10.0, "F")]), &map).is_none());
        assert!(assemble_line(&Line::default(), &map).is_none());
    }

    #[test]
    fn test_assemble_heading() {
        let map = headings(&[20.0, 14.0, 10.0]);
        let out = assemble_line(&line(&[("Overview", 20.0, "F")]), &map).unwrap();
        assert_eq!(out.text, "# Overview");
        assert_eq!(out.kind, LineKind::Heading(1));

        let out = assemble_line(
            &line(&[("Q1 ", 10.0, "F"), ("Results", 14.0, "Arial-Bold")]),
            &map,
        )
        .unwrap();
        assert_eq!(out.text, "## Q1 **Results**");
    }

    #[test]
    fn test_assemble_bullets() {
        let map = headings(&[20.0, 16.0, 14.0, 10.0]);
        for glyph in ["•", "‣", "◦", "⁃", "-", "*"] {
            let text = format!("{}  Revenue up", glyph);
            let out = assemble_line(&line(&[(text.as_str(), 10.0, "F")]), &map).unwrap();
            assert_eq!(out.text, "- Revenue up");
            assert_eq!(out.kind, LineKind::ListItem);
        }

        // Bullets win over headings.
        let out = assemble_line(&line(&[("• Summary", 20.0, "F")]), &map).unwrap();
        assert_eq!(out.text, "- Summary");

        // A glyph without following whitespace is not a bullet.
        let out = assemble_line(&line(&[("-5%", 10.0, "F")]), &map).unwrap();
        assert_eq!(out.text, "-5%");
    }

    #[test]
    fn test_render_page_breaks() {
        let mut doc = Document::new();
        for n in 1..=3 {
            let text = format!("page {}", n);
            doc.add_page(Page::with_blocks(
                n,
                vec![Block::text(vec![line(&[(text.as_str(), 10.0, "F")])])],
            ));
        }

        let options = RenderOptions::default();
        let result = PdfMarkdownRenderer::new(&NoImages, &options).render(&doc);
        assert_eq!(result.content, "page 1\n\n---\n\npage 2\n\n---\n\npage 3");
        assert_eq!(result.content.matches("\n---\n").count(), 2);
        assert_eq!(result.stats.page_count, 3);
        assert_eq!(result.stats.paragraph_count, 3);
    }

    #[test]
    fn test_render_empty_document() {
        let options = RenderOptions::default();
        let result = PdfMarkdownRenderer::new(&NoImages, &options).render(&Document::new());
        assert_eq!(result.content, "");
    }

    #[test]
    fn test_render_skips_failed_images() {
        let mut doc = Document::new();
        doc.add_page(Page::with_blocks(
            1,
            vec![
                Block::text(vec![line(&[("Title", 18.0, "F")])]),
                Block::image(5),
                Block::Ignored,
                Block::text(vec![line(&[("body", 10.0, "F")])]),
            ],
        ));

        let options = RenderOptions::default();
        let result = PdfMarkdownRenderer::new(&NoImages, &options).render(&doc);
        // With two sizes the smaller one is the second heading level.
        assert_eq!(result.content, "# Title\n## body");
        assert_eq!(result.stats.images_skipped, 1);
        assert_eq!(result.stats.heading_count, 2);
    }
}
