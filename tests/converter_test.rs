//! Integration tests for the converter module.

use std::path::Path;
use std::sync::Arc;
use undoc::convert::{
    ConvertOptions, ConvertResult, ConverterRegistry, DocumentConverter, DocxConverter,
    PdfConverter,
};
use undoc::error::{Error, Result};
use undoc::{ParseOptions, RenderOptions};

/// Mock converter for testing.
struct MockConverter {
    extensions: Vec<&'static str>,
    name: &'static str,
}

impl MockConverter {
    fn new(extensions: Vec<&'static str>, name: &'static str) -> Self {
        Self { extensions, name }
    }
}

impl DocumentConverter for MockConverter {
    fn supported_extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn name(&self) -> &str {
        self.name
    }

    fn convert(&self, _path: &Path, _options: &ConvertOptions) -> Result<ConvertResult> {
        Ok(ConvertResult::new(
            format!("Converted by {}", self.name),
            Default::default(),
        ))
    }

    fn convert_bytes(&self, _bytes: &[u8], _options: &ConvertOptions) -> Result<ConvertResult> {
        Ok(ConvertResult::new(
            format!("Converted bytes by {}", self.name),
            Default::default(),
        ))
    }
}

#[test]
fn test_convert_options_builder() {
    let options = ConvertOptions::new()
        .with_parse_options(ParseOptions::new().lenient())
        .with_render_options(RenderOptions::new().with_images_dir("imgs"))
        .with_stats(true);

    assert!(options.parse.is_lenient());
    assert!(options.render.images_dir.is_some());
    assert!(options.collect_stats);
}

#[test]
fn test_converter_registry_new() {
    let registry = ConverterRegistry::new();

    // Empty registry should support nothing
    assert!(!registry.supports("pdf"));
    assert!(!registry.supports("docx"));
}

#[test]
fn test_converter_registry_with_defaults() {
    let registry = ConverterRegistry::with_defaults();

    assert!(registry.supports("pdf"));
    assert!(registry.supports("PDF")); // Case insensitive
    assert!(registry.supports("docx"));
    assert!(registry.supports("Docx"));
    assert!(!registry.supports("doc"));
}

#[test]
fn test_converter_registry_register() {
    let mut registry = ConverterRegistry::new();
    let converter = Arc::new(MockConverter::new(vec!["txt", "text"], "text"));

    registry.register(converter);

    assert!(registry.supports("txt"));
    assert!(registry.supports("text"));
    assert!(registry.supports("TXT")); // Case insensitive
}

#[test]
fn test_converter_registry_get_by_name() {
    let registry = ConverterRegistry::with_defaults();

    assert!(registry.get_by_name("pdf").is_some());
    assert!(registry.get_by_name("DOCX").is_some()); // Case insensitive
    assert!(registry.get_by_name("unknown").is_none());
}

#[test]
fn test_converter_registry_multiple_converters() {
    let mut registry = ConverterRegistry::new();

    registry.register(Arc::new(PdfConverter::new()));
    registry.register(Arc::new(DocxConverter::new()));
    registry.register(Arc::new(MockConverter::new(vec!["md", "markdown"], "markdown")));

    assert_eq!(
        registry.supported_extensions(),
        vec!["docx", "markdown", "md", "pdf"]
    );
    assert_eq!(registry.get_by_extension("pdf").unwrap().name(), "pdf");
    assert_eq!(registry.get_by_extension("md").unwrap().name(), "markdown");
}

#[test]
fn test_converter_registry_override() {
    let mut registry = ConverterRegistry::with_defaults();
    registry.register(Arc::new(MockConverter::new(vec!["pdf"], "custom-pdf")));

    let result = registry
        .convert_bytes(b"ignored", "pdf", &ConvertOptions::default())
        .unwrap();
    assert_eq!(result.content, "Converted bytes by custom-pdf");
}

#[test]
fn test_registry_convert_dispatches_by_extension() {
    let mut registry = ConverterRegistry::new();
    registry.register(Arc::new(MockConverter::new(vec!["txt"], "text")));

    let result = registry
        .convert(Path::new("NOTES.TXT"), &ConvertOptions::default())
        .unwrap();
    assert_eq!(result.content, "Converted by text");
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let err = undoc::convert_file("/does/not/exist/quotes.txt", &ConvertOptions::default())
        .unwrap_err();
    match err {
        Error::UnsupportedFileType(ext) => assert_eq!(ext, ".txt"),
        other => panic!("unexpected error: {other}"),
    }

    let err = undoc::convert_bytes(b"%PDF-1.4", "xlsx", &ConvertOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Only PDF and DOCX"));
}

#[test]
fn test_mismatched_content_is_not_guessed() {
    let err = undoc::convert_bytes(b"PK\x03\x04zip", "pdf", &ConvertOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownFormat("PDF")));
}
