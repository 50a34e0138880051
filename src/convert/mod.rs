//! Document converter module providing a plugin architecture for multiple formats.
//!
//! A converter turns one input document into Markdown. The registry maps
//! file extensions to converters and dispatches conversions on them.
//!
//! # Example
//!
//! ```no_run
//! use undoc::convert::{ConverterRegistry, ConvertOptions};
//! use std::path::Path;
//!
//! fn main() -> undoc::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let result = registry.convert(Path::new("report.pdf"), &ConvertOptions::default())?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```

mod docx;
mod pdf;

pub use docx::DocxConverter;
pub use pdf::{convert_backend, PdfConverter};

use crate::error::{Error, Result};
use crate::model::Metadata;
use crate::parser::ParseOptions;
use crate::render::{ConversionStats, RenderOptions, RenderResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Options for document conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Decoding options
    pub parse: ParseOptions,

    /// Rendering options
    pub render: RenderOptions,

    /// Whether to attach statistics to the result
    pub collect_stats: bool,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set decoding options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Enable statistics collection.
    pub fn with_stats(mut self, collect: bool) -> Self {
        self.collect_stats = collect;
        self
    }
}

/// Result of document conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    /// Converted Markdown
    pub content: String,

    /// Source document metadata
    pub metadata: Metadata,

    /// Conversion statistics (if collected)
    pub stats: Option<ConversionStats>,

    /// MIME type of the output
    pub mime_type: &'static str,
}

impl ConvertResult {
    /// Create a new conversion result.
    pub fn new(content: String, metadata: Metadata) -> Self {
        Self {
            content,
            metadata,
            stats: None,
            mime_type: "text/markdown",
        }
    }

    /// Build from a render result, keeping statistics only when requested.
    pub fn from_render(result: RenderResult, options: &ConvertOptions) -> Self {
        let converted = Self::new(result.content, result.metadata);
        if options.collect_stats {
            converted.with_stats(result.stats)
        } else {
            converted
        }
    }

    /// Set conversion statistics.
    pub fn with_stats(mut self, stats: ConversionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Get content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Trait for document converters.
///
/// Implement this trait to add support for a new document format.
pub trait DocumentConverter: Send + Sync {
    /// Get the supported file extensions for this converter.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["pdf"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert a file at the given path.
    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult>;

    /// Convert from bytes.
    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult>;

    /// Check if this converter supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for document converters.
///
/// The registry maps file extensions to converters and provides
/// convenient methods for converting documents.
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn DocumentConverter>>,
    by_name: HashMap<String, Arc<dyn DocumentConverter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the default converters (PDF, DOCX).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfConverter::new()));
        registry.register(Arc::new(DocxConverter::new()));
        registry
    }

    /// Register a converter.
    ///
    /// The converter will be registered for all its supported extensions.
    pub fn register(&mut self, converter: Arc<dyn DocumentConverter>) {
        for ext in converter.supported_extensions() {
            self.converters
                .insert(ext.to_lowercase(), converter.clone());
        }
        self.by_name
            .insert(converter.name().to_lowercase(), converter);
    }

    /// Get a converter by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.converters.get(&ext.to_lowercase()).cloned()
    }

    /// Get a converter by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.converters.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.converters.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Convert a file using the converter registered for its extension.
    ///
    /// Unsupported extensions fail before the file is opened.
    pub fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFileType(path.display().to_string()))?;

        let converter = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFileType(format!(".{}", ext)))?;

        log::debug!("Converting {} with the {} converter", path.display(), converter.name());
        converter.convert(path, options)
    }

    /// Convert bytes using the specified extension to determine the converter.
    pub fn convert_bytes(
        &self,
        bytes: &[u8],
        ext: &str,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        let ext = ext.trim_start_matches('.');
        let converter = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFileType(format!(".{}", ext)))?;

        converter.convert_bytes(bytes, options)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_parse_options(ParseOptions::new().lenient())
            .with_render_options(RenderOptions::new().without_images())
            .with_stats(true);

        assert!(options.parse.is_lenient());
        assert!(!options.render.include_images);
        assert!(options.collect_stats);
    }

    #[test]
    fn test_convert_options_from_json() {
        let options: ConvertOptions = serde_json::from_str(
            r#"{"render":{"include_images":false},"parse":{"error_mode":"lenient"}}"#,
        )
        .unwrap();
        assert!(!options.render.include_images);
        assert!(options.parse.is_lenient());
        assert!(!options.collect_stats);
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.supports("pdf"));
        assert!(registry.supports("PDF"));
        assert!(registry.supports("docx"));
        assert!(!registry.supports("txt"));
        assert_eq!(registry.supported_extensions(), vec!["docx", "pdf"]);
    }

    #[test]
    fn test_registry_get_by_extension() {
        let registry = ConverterRegistry::with_defaults();
        let converter = registry.get_by_extension("pdf");
        assert!(converter.is_some());
        assert_eq!(converter.unwrap().name(), "pdf");
        assert_eq!(registry.get_by_name("DOCX").unwrap().name(), "docx");
    }

    #[test]
    fn test_registry_rejects_unsupported_without_opening() {
        let registry = ConverterRegistry::with_defaults();
        let options = ConvertOptions::default();

        let err = registry
            .convert(Path::new("/nonexistent/notes.txt"), &options)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(ref ext) if ext == ".txt"));

        let err = registry
            .convert(Path::new("/nonexistent/README"), &options)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));

        let err = registry.convert_bytes(b"hello", "txt", &options).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn test_convert_result_stats_opt_in() {
        let render = RenderResult::new("x".into(), Metadata::default(), ConversionStats::new());
        let plain = ConvertResult::from_render(render.clone(), &ConvertOptions::default());
        assert!(plain.stats.is_none());

        let with = ConvertResult::from_render(render, &ConvertOptions::new().with_stats(true));
        assert!(with.stats.is_some());
        assert_eq!(with.mime_type, "text/markdown");
    }
}
