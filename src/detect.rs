//! Document format selection and header validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Supported input document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word-processing document
    Docx,
}

impl DocumentFormat {
    /// Select a format from a file extension (case-insensitive, no leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    /// Select a format from a path's extension.
    ///
    /// Any extension other than `.pdf` or `.docx` (including none at all)
    /// is an [`Error::UnsupportedFileType`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| {
            let shown = if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", ext)
            };
            Error::UnsupportedFileType(shown)
        })
    }

    /// Canonical lowercase extension.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "PDF"),
            DocumentFormat::Docx => write!(f, "DOCX"),
        }
    }
}

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Local file header signature of a zip archive (DOCX container).
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect PDF format from a file path.
pub fn detect_pdf_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut header = Vec::with_capacity(16);
    reader.take(16).read_to_end(&mut header)?;
    detect_pdf_from_bytes(&header)
}

/// Detect PDF format from bytes.
///
/// # Returns
/// * `Ok(PdfFormat)` if the data starts with a valid PDF header
/// * `Err(Error::UnknownFormat)` if the data is not a PDF
pub fn detect_pdf_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN {
        return Err(Error::UnknownFormat("PDF"));
    }

    if !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat("PDF"));
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat { version })
}

/// Check that bytes begin with a zip local file header.
pub fn detect_docx_from_bytes(data: &[u8]) -> Result<()> {
    if data.starts_with(ZIP_MAGIC) {
        Ok(())
    } else {
        Err(Error::UnknownFormat("DOCX"))
    }
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if bytes represent a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_pdf_from_bytes(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_extension("PDF"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_extension("DocX"),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(DocumentFormat::from_extension("doc"), None);
    }

    #[test]
    fn test_format_from_path_unsupported() {
        let err = DocumentFormat::from_path("report.txt").unwrap_err();
        match err {
            Error::UnsupportedFileType(ext) => assert_eq!(ext, ".txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_format_from_path_without_extension() {
        let err = DocumentFormat::from_path(PathBuf::from("README")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn test_detect_valid_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        let format = detect_pdf_from_bytes(data).unwrap();
        assert_eq!(format.version, "1.7");
        assert_eq!(format.to_string(), "PDF 1.7");
    }

    #[test]
    fn test_detect_invalid_pdf() {
        assert!(matches!(
            detect_pdf_from_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat("PDF"))
        ));
        assert!(matches!(
            detect_pdf_from_bytes(b"%PDF"),
            Err(Error::UnknownFormat("PDF"))
        ));
        assert!(matches!(
            detect_pdf_from_bytes(b"%PDF-x.y\n"),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_detect_docx_signature() {
        assert!(detect_docx_from_bytes(b"PK\x03\x04rest").is_ok());
        assert!(detect_docx_from_bytes(b"%PDF-1.4").is_err());
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
    }

    #[test]
    fn test_detect_pdf_from_path_reads_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.pdf");
        let mut data = b"%PDF-1.6\n".to_vec();
        data.extend(std::iter::repeat(b'x').take(4096));
        std::fs::write(&path, data).unwrap();

        assert_eq!(detect_pdf_from_path(&path).unwrap().version, "1.6");
        assert!(matches!(
            detect_pdf_from_path(dir.path().join("missing.pdf")),
            Err(Error::Io(_))
        ));
    }
}
