//! Font-size statistics for heading detection.
//!
//! Heading levels are inferred purely from font-size magnitude: the whole
//! document is scanned once to collect every distinct rounded size, then
//! the three largest sizes become heading levels 1 to 3.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Document, FontSize};

/// Maximum number of heading levels derived from font sizes.
pub const MAX_HEADING_LEVELS: usize = 3;

/// Frequency of each distinct rounded font size across a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FontHistogram {
    sizes: BTreeMap<FontSize, usize>,
}

impl FontHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally every run of every text block in the document.
    pub fn collect(doc: &Document) -> Self {
        let mut histogram = Self::new();
        for run in doc.lines().flat_map(|line| line.runs.iter()) {
            histogram.add(run.font_size);
        }
        histogram
    }

    /// Add a font size observation.
    pub fn add(&mut self, size: FontSize) {
        *self.sizes.entry(size).or_insert(0) += 1;
    }

    /// Occurrences of a size.
    pub fn count(&self, size: FontSize) -> usize {
        self.sizes.get(&size).copied().unwrap_or(0)
    }

    /// Whether the size was observed.
    pub fn contains(&self, size: FontSize) -> bool {
        self.sizes.contains_key(&size)
    }

    /// Number of distinct sizes.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Check if no sizes were observed.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Distinct sizes, largest first.
    pub fn sizes_descending(&self) -> impl Iterator<Item = FontSize> + '_ {
        self.sizes.keys().rev().copied()
    }

    /// The most frequent size (ties resolve to the smaller size).
    pub fn body_size(&self) -> Option<FontSize> {
        self.sizes
            .iter()
            .max_by(|(sa, ca), (sb, cb)| ca.cmp(cb).then(sb.cmp(sa)))
            .map(|(size, _)| *size)
    }
}

/// Lookup from font size to heading level.
///
/// Holds at most [`MAX_HEADING_LEVELS`] entries. A document with a single
/// distinct size has no headings at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadingLevelMap {
    levels: Vec<FontSize>,
}

impl HeadingLevelMap {
    /// Rank distinct sizes by magnitude: largest is level 1.
    pub fn classify(histogram: &FontHistogram) -> Self {
        if histogram.len() < 2 {
            return Self::default();
        }

        let levels: Vec<FontSize> = histogram
            .sizes_descending()
            .take(MAX_HEADING_LEVELS)
            .collect();

        log::debug!(
            "Heading sizes: {}",
            levels
                .iter()
                .enumerate()
                .map(|(i, s)| format!("h{}={}", i + 1, s))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Self { levels }
    }

    /// Heading level for a size, or 0 when the size is not a heading size.
    pub fn level_for(&self, size: FontSize) -> u8 {
        self.levels
            .iter()
            .position(|s| *s == size)
            .map(|i| (i + 1) as u8)
            .unwrap_or(0)
    }

    /// Number of mapped sizes.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if no size maps to a heading.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Mapped sizes in level order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, FontSize)> + '_ {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, s)| ((i + 1) as u8, *s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Line, Page, Run};

    fn size(points: f32) -> FontSize {
        FontSize::from_points(points)
    }

    fn histogram_of(sizes: &[f32]) -> FontHistogram {
        let mut h = FontHistogram::new();
        for s in sizes {
            h.add(size(*s));
        }
        h
    }

    #[test]
    fn test_collect_counts_every_run() {
        let mut doc = Document::new();
        doc.add_page(Page::with_blocks(
            1,
            vec![
                Block::text(vec![
                    Line::new(vec![Run::new("Title", 18.0, "F"), Run::new(" ", 18.0, "F")]),
                    Line::new(vec![Run::new("body", 10.0, "F")]),
                ]),
                Block::image(4),
            ],
        ));

        let h = FontHistogram::collect(&doc);
        assert_eq!(h.len(), 2);
        assert_eq!(h.count(size(18.0)), 2);
        assert_eq!(h.count(size(10.0)), 1);
        assert_eq!(h.body_size(), Some(size(18.0)));
    }

    #[test]
    fn test_rounding_merges_sizes() {
        let h = histogram_of(&[11.999, 12.0, 12.004]);
        assert_eq!(h.len(), 1);
        assert_eq!(h.count(size(12.0)), 3);
    }

    #[test]
    fn test_image_only_document_has_empty_histogram() {
        let mut doc = Document::new();
        doc.add_page(Page::with_blocks(1, vec![Block::image(1)]));
        assert!(FontHistogram::collect(&doc).is_empty());
    }

    #[test]
    fn test_classify_top_three() {
        let h = histogram_of(&[24.0, 18.0, 14.0, 12.0, 10.0, 10.0]);
        let map = HeadingLevelMap::classify(&h);

        assert_eq!(map.len(), 3);
        assert_eq!(map.level_for(size(24.0)), 1);
        assert_eq!(map.level_for(size(18.0)), 2);
        assert_eq!(map.level_for(size(14.0)), 3);
        assert_eq!(map.level_for(size(12.0)), 0);
        assert_eq!(map.level_for(size(10.0)), 0);
    }

    #[test]
    fn test_classify_ignores_frequency() {
        // The most common size still ranks by magnitude.
        let h = histogram_of(&[12.0, 12.0, 12.0, 12.0, 9.0]);
        let map = HeadingLevelMap::classify(&h);
        assert_eq!(map.level_for(size(12.0)), 1);
        assert_eq!(map.level_for(size(9.0)), 2);
    }

    #[test]
    fn test_single_size_has_no_headings() {
        let map = HeadingLevelMap::classify(&histogram_of(&[11.0, 11.0]));
        assert!(map.is_empty());
        assert_eq!(map.level_for(size(11.0)), 0);

        assert!(HeadingLevelMap::classify(&FontHistogram::new()).is_empty());
    }

    #[test]
    fn test_levels_strictly_decreasing() {
        let map = HeadingLevelMap::classify(&histogram_of(&[8.0, 30.0, 16.5, 16.0]));
        let sizes: Vec<FontSize> = map.iter().map(|(_, s)| s).collect();
        assert!(sizes.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(sizes[0], size(30.0));
    }
}
