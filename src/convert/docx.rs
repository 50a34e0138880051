//! DOCX document converter implementation.

use crate::error::Result;
use std::path::Path;

use super::{ConvertOptions, ConvertResult, DocumentConverter};

/// DOCX document converter.
///
/// Without the `docx` feature every conversion fails with
/// [`Error::CapabilityUnavailable`](crate::Error::CapabilityUnavailable).
#[derive(Debug, Clone, Default)]
pub struct DocxConverter {
    _private: (),
}

impl DocxConverter {
    /// Create a new DOCX converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(feature = "docx")]
fn render(doc: crate::parser::DocxDocument, options: &ConvertOptions) -> ConvertResult {
    let rendered = crate::render::docx::render_paragraphs(
        doc.paragraphs
            .iter()
            .map(|p| (p.text.as_str(), p.style_name.as_deref())),
        doc.metadata,
    );
    ConvertResult::from_render(rendered, options)
}

impl DocumentConverter for DocxConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    #[cfg(feature = "docx")]
    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let doc = crate::parser::DocxReader::open(path)?.read()?;
        Ok(render(doc, options))
    }

    #[cfg(feature = "docx")]
    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
        let doc = crate::parser::DocxReader::from_bytes(bytes)?.read()?;
        Ok(render(doc, options))
    }

    #[cfg(not(feature = "docx"))]
    fn convert(&self, _path: &Path, _options: &ConvertOptions) -> Result<ConvertResult> {
        Err(crate::Error::CapabilityUnavailable("docx"))
    }

    #[cfg(not(feature = "docx"))]
    fn convert_bytes(&self, _bytes: &[u8], _options: &ConvertOptions) -> Result<ConvertResult> {
        Err(crate::Error::CapabilityUnavailable("docx"))
    }
}
