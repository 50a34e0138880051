//! Document decoding module.
//!
//! PDF input is decoded through the [`PdfBackend`] trait into the
//! page/block/line/run model; DOCX input is read into body paragraphs
//! with resolved style names.

mod backend;
mod content;
#[cfg(feature = "docx")]
mod docx;
mod fonts;
mod options;
mod walker;

pub use backend::{LopdfBackend, PdfBackend};
#[cfg(feature = "docx")]
pub use docx::{DocxDocument, DocxParagraph, DocxReader};
pub use fonts::{FontHistogram, HeadingLevelMap, MAX_HEADING_LEVELS};
pub use options::{ErrorMode, ParseOptions};
pub use walker::PageWalker;
