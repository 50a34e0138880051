//! Document model types for decoded document content.
//!
//! This module defines the intermediate representation that bridges
//! decoding (pages, blocks, lines, runs) and Markdown rendering.

mod document;
mod page;
mod resource;
mod text;

pub use document::{Document, Metadata};
pub use page::{Block, Page};
pub use resource::{ImageData, ImageRef};
pub use text::{FontSize, Line, Run, TextBlock};
