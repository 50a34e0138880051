//! Rendering result with metadata and statistics.

use crate::model::Metadata;
use serde::{Deserialize, Serialize};

/// Result of rendering a document, including content and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered Markdown
    pub content: String,

    /// Document metadata (copied from source document)
    pub metadata: Metadata,

    /// Conversion statistics
    pub stats: ConversionStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, metadata: Metadata, stats: ConversionStats) -> Self {
        Self {
            content,
            metadata,
            stats,
        }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Statistics collected while rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages rendered (0 for DOCX)
    pub page_count: u32,

    /// Lines or paragraphs emitted as headings
    pub heading_count: u32,

    /// Lines or paragraphs emitted as list items
    pub list_item_count: u32,

    /// Lines or paragraphs emitted as plain text
    pub paragraph_count: u32,

    /// Images embedded as data URIs
    pub images_embedded: u32,

    /// Images written to the image directory
    pub images_written: u32,

    /// Image blocks that produced no output because extraction failed
    pub images_skipped: u32,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment page count.
    pub fn add_page(&mut self) {
        self.page_count += 1;
    }

    /// Increment heading count.
    pub fn add_heading(&mut self) {
        self.heading_count += 1;
    }

    /// Increment list item count.
    pub fn add_list_item(&mut self) {
        self.list_item_count += 1;
    }

    /// Increment paragraph count.
    pub fn add_paragraph(&mut self) {
        self.paragraph_count += 1;
    }

    /// Total images that made it into the output.
    pub fn image_count(&self) -> u32 {
        self.images_embedded + self.images_written
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ConversionStats) {
        self.page_count += other.page_count;
        self.heading_count += other.heading_count;
        self.list_item_count += other.list_item_count;
        self.paragraph_count += other.paragraph_count;
        self.images_embedded += other.images_embedded;
        self.images_written += other.images_written;
        self.images_skipped += other.images_skipped;
    }
}
