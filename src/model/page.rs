//! Page-level types.

use super::{ImageRef, Line, TextBlock};
use serde::{Deserialize, Serialize};

/// A page-level unit in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Lines of text
    Text(TextBlock),

    /// A raster image
    Image(ImageRef),

    /// Any other block kind (vector drawings, form objects)
    Ignored,
}

impl Block {
    /// Create a text block from lines.
    pub fn text(lines: Vec<Line>) -> Self {
        Block::Text(TextBlock::new(lines))
    }

    /// Create an image block referencing an object number.
    pub fn image(xref: u32) -> Self {
        Block::Image(ImageRef::new(xref))
    }

    /// Lines of a text block; empty for other kinds.
    pub fn lines(&self) -> &[Line] {
        match self {
            Block::Text(block) => &block.lines,
            _ => &[],
        }
    }
}

/// A single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Blocks in source order
    pub blocks: Vec<Block>,
}

impl Page {
    /// Create a new empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            blocks: Vec::new(),
        }
    }

    /// Create a page from blocks.
    pub fn with_blocks(number: u32, blocks: Vec<Block>) -> Self {
        Self { number, blocks }
    }

    /// Append a block.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Iterate every line on the page in order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.blocks.iter().flat_map(|b| b.lines().iter())
    }

    /// Check if the page has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Run;

    #[test]
    fn test_page_lines_skip_non_text_blocks() {
        let mut page = Page::new(1);
        page.add_block(Block::text(vec![Line::new(vec![Run::new(
            "a",
            10.0,
            "F",
        )])]));
        page.add_block(Block::image(7));
        page.add_block(Block::Ignored);
        page.add_block(Block::text(vec![Line::new(vec![Run::new(
            "b",
            10.0,
            "F",
        )])]));

        let texts: Vec<String> = page.lines().map(|l| l.plain_text()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }
}
