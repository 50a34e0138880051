//! End-to-end PDF pipeline tests over a scripted in-memory backend.

use std::collections::HashMap;

use undoc::error::{Error, Result};
use undoc::model::{Block, ImageData, Line, Page, Run};
use undoc::{convert_backend, ConvertOptions, ParseOptions, PdfBackend, RenderOptions};

/// Backend whose pages and images are given up front.
#[derive(Default)]
struct ScriptedBackend {
    pages: Vec<Result<Vec<Block>>>,
    images: HashMap<u32, ImageData>,
}

impl ScriptedBackend {
    fn page(mut self, blocks: Vec<Block>) -> Self {
        self.pages.push(Ok(blocks));
        self
    }

    fn broken_page(mut self) -> Self {
        self.pages
            .push(Err(Error::Corrupted("bad content stream".into())));
        self
    }

    fn image(mut self, xref: u32, data: &[u8], ext: &str) -> Self {
        self.images.insert(xref, ImageData::new(data.to_vec(), ext));
        self
    }
}

impl PdfBackend for ScriptedBackend {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn load_page(&self, number: u32) -> Result<Page> {
        match &self.pages[(number - 1) as usize] {
            Ok(blocks) => Ok(Page::with_blocks(number, blocks.clone())),
            Err(e) => Err(Error::Corrupted(e.to_string())),
        }
    }

    fn extract_image(&self, xref: u32) -> Result<ImageData> {
        self.images
            .get(&xref)
            .cloned()
            .ok_or_else(|| Error::ImageExtract(format!("no image {}", xref)))
    }
}

fn text(lines: &[&[(&str, f32, &str)]]) -> Block {
    Block::text(
        lines
            .iter()
            .map(|runs| Line::new(runs.iter().map(|(t, s, f)| Run::new(*t, *s, *f)).collect()))
            .collect(),
    )
}

fn convert(backend: &ScriptedBackend) -> String {
    convert_backend(backend, &ConvertOptions::default())
        .unwrap()
        .content
}

#[test]
fn test_financial_report_layout() {
    let backend = ScriptedBackend::default()
        .page(vec![text(&[
            &[("Quarterly Report", 24.0, "Helvetica-Bold")],
            &[("Highlights", 16.0, "Helvetica")],
            &[("Revenue rose ", 10.0, "Helvetica"), ("12%", 10.0, "Helvetica-Bold")],
            &[("• Margins improved", 10.0, "Helvetica")],
        ])])
        .page(vec![text(&[
            &[("Outlook", 14.0, "Helvetica-Oblique")],
            &[("Guidance unchanged.", 10.0, "Helvetica")],
            &[("Footnote", 8.0, "Helvetica")],
        ])]);

    assert_eq!(
        convert(&backend),
        "# **Quarterly Report**\n\
         ## Highlights\n\
         Revenue rose **12%**\n\
         - Margins improved\n\
         \n---\n\n\
         ### *Outlook*\n\
         Guidance unchanged.\n\
         Footnote"
    );
}

#[test]
fn test_conversion_is_deterministic() {
    let backend = ScriptedBackend::default()
        .page(vec![text(&[&[("A", 20.0, "F")], &[("b", 9.0, "F")]])])
        .page(vec![Block::image(3), text(&[&[("c", 12.0, "F")]])])
        .image(3, b"\x89PNG", "png");

    let first = convert(&backend);
    for _ in 0..5 {
        assert_eq!(convert(&backend), first);
    }
}

#[test]
fn test_single_size_document_has_no_headings() {
    let backend = ScriptedBackend::default()
        .page(vec![text(&[&[("One", 11.0, "F")], &[("Two", 11.0, "F-Bold")]])])
        .page(vec![text(&[&[("Three", 11.004, "F")]])]);

    let output = convert(&backend);
    assert!(!output.lines().any(|l| l.starts_with('#')));
    assert_eq!(output, "One\n**Two**\n\n---\n\nThree");
}

#[test]
fn test_at_most_three_heading_levels() {
    let sizes = [30.0, 26.0, 22.0, 18.0, 14.0, 10.0];
    let lines: Vec<Vec<(String, f32)>> = sizes
        .iter()
        .map(|s| vec![(format!("size {}", s), *s)])
        .collect();
    let block = Block::text(
        lines
            .iter()
            .map(|l| Line::new(l.iter().map(|(t, s)| Run::new(t.as_str(), *s, "F")).collect()))
            .collect(),
    );
    let backend = ScriptedBackend::default().page(vec![block]);

    assert_eq!(
        convert(&backend),
        "# size 30\n## size 26\n### size 22\nsize 18\nsize 14\nsize 10"
    );
}

#[test]
fn test_page_separators() {
    for pages in 1..=4u32 {
        let mut backend = ScriptedBackend::default();
        for n in 1..=pages {
            let label = format!("page {}", n);
            backend = backend.page(vec![text(&[&[(label.as_str(), 10.0, "F")]])]);
        }
        let output = convert(&backend);
        assert_eq!(output.matches("\n---\n").count() as u32, pages - 1);
    }
}

#[test]
fn test_blank_pages_still_separate() {
    let backend = ScriptedBackend::default()
        .page(vec![text(&[&[("first", 10.0, "F")]])])
        .page(vec![])
        .page(vec![text(&[&[("last", 10.0, "F")]])]);

    assert_eq!(convert(&backend), "first\n\n---\n\n\n---\n\nlast");
}

#[test]
fn test_zero_pages_yield_empty_output() {
    let result = convert_backend(&ScriptedBackend::default(), &ConvertOptions::default()).unwrap();
    assert_eq!(result.content, "");
    assert_eq!(result.metadata.page_count, 0);
}

#[test]
fn test_image_failure_is_isolated() {
    let backend = ScriptedBackend::default()
        .page(vec![
            text(&[&[("before", 10.0, "F")]]),
            Block::image(7),
            Block::image(8),
            Block::Ignored,
            text(&[&[("after", 10.0, "F")]]),
        ])
        .image(8, &[0xFF, 0xD8, 0xFF], "jpeg");

    let options = ConvertOptions::new().with_stats(true);
    let result = convert_backend(&backend, &options).unwrap();

    assert_eq!(
        result.content,
        "before\n![image](data:image/jpeg;base64,/9j/)\nafter"
    );
    let stats = result.stats.unwrap();
    assert_eq!(stats.images_skipped, 1);
    assert_eq!(stats.images_embedded, 1);
}

#[test]
fn test_images_written_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let images = dir.path().join("images");
    let backend = ScriptedBackend::default()
        .page(vec![text(&[&[("cover", 10.0, "F")]])])
        .page(vec![Block::image(12)])
        .image(12, b"png-bytes", "png");

    let options = ConvertOptions::new()
        .with_render_options(RenderOptions::new().with_images_dir(&images));
    let output = convert_backend(&backend, &options).unwrap().content;

    let expected = images.join("page2_img12.png");
    assert_eq!(
        output,
        format!("cover\n\n---\n\n![image]({})", expected.display())
    );
    assert_eq!(std::fs::read(expected).unwrap(), b"png-bytes");
}

#[test]
fn test_images_disabled() {
    let backend = ScriptedBackend::default()
        .page(vec![Block::image(1), text(&[&[("text", 10.0, "F")]])])
        .image(1, b"x", "png");

    let options =
        ConvertOptions::new().with_render_options(RenderOptions::new().without_images());
    assert_eq!(convert_backend(&backend, &options).unwrap().content, "text");
}

#[test]
fn test_strict_mode_fails_on_broken_page() {
    let backend = ScriptedBackend::default()
        .page(vec![text(&[&[("ok", 10.0, "F")]])])
        .broken_page();

    let err = convert_backend(&backend, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Corrupted(_)));
}

#[test]
fn test_lenient_mode_keeps_page_structure() {
    let backend = ScriptedBackend::default()
        .page(vec![text(&[&[("ok", 10.0, "F")]])])
        .broken_page()
        .page(vec![text(&[&[("end", 10.0, "F")]])]);

    let options = ConvertOptions::new().with_parse_options(ParseOptions::new().lenient());
    let output = convert_backend(&backend, &options).unwrap().content;
    assert_eq!(output, "ok\n\n---\n\n\n---\n\nend");
}

#[test]
fn test_stats_only_when_requested() {
    let backend = ScriptedBackend::default().page(vec![text(&[
        &[("Title", 20.0, "F")],
        &[("- item", 10.0, "F")],
        &[("body", 10.0, "F")],
    ])]);

    let plain = convert_backend(&backend, &ConvertOptions::default()).unwrap();
    assert!(plain.stats.is_none());

    let stats = convert_backend(&backend, &ConvertOptions::new().with_stats(true))
        .unwrap()
        .stats
        .unwrap();
    assert_eq!(stats.page_count, 1);
    assert_eq!(stats.heading_count, 2);
    assert_eq!(stats.list_item_count, 1);
    assert_eq!(stats.paragraph_count, 0);
}
