//! Rendering module for converting decoded documents to Markdown.

pub mod docx;
mod image;
pub mod markdown;
mod options;
mod result;

pub use image::ImageHandler;
pub use markdown::{
    assemble_line, format_run, AssembledLine, LineKind, PdfMarkdownRenderer, PAGE_BREAK,
};
pub use options::{ImageNaming, RenderOptions};
pub use result::{ConversionStats, RenderResult};
