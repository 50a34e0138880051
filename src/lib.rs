//! # undoc
//!
//! Financial document to Markdown conversion for Rust.
//!
//! This library converts PDF and DOCX documents into clean Markdown whose
//! structure (headings, emphasis, lists, images, page boundaries) is
//! reconstructed from typographic signals alone.
//!
//! ## Quick Start
//!
//! ```no_run
//! use undoc::{convert_file, ConvertOptions};
//!
//! fn main() -> undoc::Result<()> {
//!     let result = convert_file("annual-report.pdf", &ConvertOptions::default())?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Heading inference**: the three largest font sizes become `#`, `##`, `###`
//! - **Emphasis**: bold and italic from font names
//! - **Lists**: bullet glyphs normalized to `- `
//! - **Images**: written to a directory or embedded as data URIs
//! - **DOCX**: paragraph styles mapped to headings and lists (`docx` feature)
//! - **Batch conversion**: independent documents converted in parallel with Rayon

pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use convert::{
    convert_backend, ConvertOptions, ConvertResult, ConverterRegistry, DocumentConverter,
    DocxConverter, PdfConverter,
};
pub use detect::{detect_pdf_from_bytes, detect_pdf_from_path, DocumentFormat, PdfFormat};
pub use error::{Error, Result};
pub use model::{Block, Document, FontSize, ImageData, ImageRef, Line, Metadata, Page, Run};
pub use parser::{
    ErrorMode, FontHistogram, HeadingLevelMap, LopdfBackend, PageWalker, ParseOptions, PdfBackend,
};
pub use render::{ConversionStats, ImageNaming, RenderOptions};

use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Convert a PDF or DOCX file to Markdown.
///
/// The pipeline is chosen by the file extension (case-insensitive). Any
/// other extension fails with [`Error::UnsupportedFileType`] before the
/// file is opened.
///
/// # Example
///
/// ```no_run
/// use undoc::{convert_file, ConvertOptions, RenderOptions};
///
/// let options = ConvertOptions::new()
///     .with_render_options(RenderOptions::new().with_images_dir("./images"));
/// let result = convert_file("report.pdf", &options).unwrap();
/// std::fs::write("report.md", result.content).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<ConvertResult> {
    ConverterRegistry::with_defaults().convert(path.as_ref(), options)
}

/// Convert a file to Markdown with default options.
///
/// # Example
///
/// ```no_run
/// let markdown = undoc::to_markdown("report.docx").unwrap();
/// println!("{}", markdown);
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(convert_file(path, &ConvertOptions::default())?.content)
}

/// Convert an in-memory document; `extension` selects the pipeline.
///
/// # Example
///
/// ```no_run
/// use undoc::{convert_bytes, ConvertOptions};
///
/// let data = std::fs::read("report.pdf").unwrap();
/// let result = convert_bytes(&data, "pdf", &ConvertOptions::default()).unwrap();
/// ```
pub fn convert_bytes(
    data: &[u8],
    extension: &str,
    options: &ConvertOptions,
) -> Result<ConvertResult> {
    ConverterRegistry::with_defaults().convert_bytes(data, extension, options)
}

/// Convert independent documents in parallel.
///
/// Returns one result per input, in input order. A failing document does
/// not affect the others.
pub fn convert_many<P>(paths: &[P], options: &ConvertOptions) -> Vec<Result<ConvertResult>>
where
    P: AsRef<Path> + Sync,
{
    let registry = ConverterRegistry::with_defaults();
    paths
        .par_iter()
        .map(|path| registry.convert(path.as_ref(), options))
        .collect()
}

/// Convert a file on Tokio's blocking thread pool.
#[cfg(feature = "async")]
pub async fn convert_file_async(
    path: impl Into<PathBuf>,
    options: ConvertOptions,
) -> Result<ConvertResult> {
    let path = path.into();
    tokio::task::spawn_blocking(move || convert_file(&path, &options))
        .await
        .map_err(|e| Error::Other(format!("Conversion task failed: {}", e)))?
}

/// Builder for converting documents.
///
/// # Example
///
/// ```no_run
/// use undoc::Undoc;
///
/// let result = Undoc::new()
///     .with_images_dir("./images")
///     .unique_image_names()
///     .lenient()
///     .with_stats()
///     .convert("report.pdf")?;
/// println!("{:?}", result.stats);
/// # Ok::<(), undoc::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Undoc {
    options: ConvertOptions,
}

impl Undoc {
    /// Create a new Undoc builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit undecodable PDF pages empty instead of failing.
    pub fn lenient(mut self) -> Self {
        self.options.parse = self.options.parse.lenient();
        self
    }

    /// Enable or disable image output.
    pub fn with_images(mut self, include: bool) -> Self {
        self.options.render = self.options.render.with_images(include);
        self
    }

    /// Write images to a directory instead of embedding them.
    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.render = self.options.render.with_images_dir(dir);
        self
    }

    /// Prefix image file names with a per-call token.
    pub fn unique_image_names(mut self) -> Self {
        self.options.render = self.options.render.unique_image_names();
        self
    }

    /// Attach conversion statistics to results.
    pub fn with_stats(mut self) -> Self {
        self.options.collect_stats = true;
        self
    }

    /// The accumulated options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a file.
    pub fn convert<P: AsRef<Path>>(&self, path: P) -> Result<ConvertResult> {
        convert_file(path, &self.options)
    }

    /// Convert an in-memory document.
    pub fn convert_bytes(&self, data: &[u8], extension: &str) -> Result<ConvertResult> {
        convert_bytes(data, extension, &self.options)
    }

    /// Convert files in parallel.
    pub fn convert_many<P>(&self, paths: &[P]) -> Vec<Result<ConvertResult>>
    where
        P: AsRef<Path> + Sync,
    {
        convert_many(paths, &self.options)
    }
}
