//! PDF document converter implementation.

use crate::error::Result;
use crate::parser::{LopdfBackend, PageWalker, PdfBackend};
use crate::render::PdfMarkdownRenderer;
use std::path::Path;

use super::{ConvertOptions, ConvertResult, DocumentConverter};

/// Convert any decoded PDF backend to Markdown.
///
/// Decodes every page first, then renders with heading levels derived from
/// the whole document.
pub fn convert_backend<B: PdfBackend + ?Sized>(
    backend: &B,
    options: &ConvertOptions,
) -> Result<ConvertResult> {
    let doc = PageWalker::new(backend, &options.parse).collect_document()?;
    let rendered = PdfMarkdownRenderer::new(backend, &options.render).render(&doc);
    log::debug!(
        "Rendered {} pages into {} bytes",
        doc.page_count(),
        rendered.content.len()
    );
    Ok(ConvertResult::from_render(rendered, options))
}

/// PDF document converter.
#[derive(Debug, Clone, Default)]
pub struct PdfConverter {
    _private: (),
}

impl PdfConverter {
    /// Create a new PDF converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentConverter for PdfConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let backend = LopdfBackend::load_file(path)?;
        convert_backend(&backend, options)
    }

    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        convert_backend(&backend, options)
    }
}
