//! DOCX reading: body paragraphs with resolved style names.
//!
//! A DOCX file is a zip package; the body lives in `word/document.xml`,
//! style display names in `word/styles.xml` and document properties in
//! `docProps/core.xml`.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::detect::{detect_docx_from_bytes, DocumentFormat};
use crate::error::{Error, Result};
use crate::model::Metadata;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const CORE_PROPS_PART: &str = "docProps/core.xml";

/// A body paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocxParagraph {
    /// Concatenated run text (tabs as `\t`, breaks as `\n`)
    pub text: String,
    /// Display name of the paragraph style (e.g., "Heading 2")
    pub style_name: Option<String>,
}

impl DocxParagraph {
    /// Create a paragraph.
    pub fn new(text: impl Into<String>, style_name: Option<&str>) -> Self {
        Self {
            text: text.into(),
            style_name: style_name.map(str::to_string),
        }
    }
}

/// A decoded DOCX document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocxDocument {
    /// Document properties
    pub metadata: Metadata,
    /// Body paragraphs in document order
    pub paragraphs: Vec<DocxParagraph>,
}

/// Reader for DOCX packages.
pub struct DocxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl DocxReader<std::fs::File> {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }
}

impl<'a> DocxReader<Cursor<&'a [u8]>> {
    /// Read a DOCX package from memory.
    pub fn from_bytes(data: &'a [u8]) -> Result<Self> {
        detect_docx_from_bytes(data)?;
        Self::from_reader(Cursor::new(data))
    }
}

impl<R: Read + Seek> DocxReader<R> {
    /// Read a DOCX package from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Decode body paragraphs, style names and properties.
    pub fn read(mut self) -> Result<DocxDocument> {
        let document_xml = self
            .read_part(DOCUMENT_PART)?
            .ok_or_else(|| Error::DocxParse(format!("missing {}", DOCUMENT_PART)))?;

        let styles = match self.read_part(STYLES_PART)? {
            Some(xml) => StyleSheet::parse(&xml)?,
            None => StyleSheet::default(),
        };

        let mut metadata = match self.read_part(CORE_PROPS_PART)? {
            Some(xml) => parse_core_properties(&xml)?,
            None => Metadata::default(),
        };
        metadata.format = Some(DocumentFormat::Docx);

        let paragraphs = parse_body(&document_xml, &styles)?;
        log::debug!(
            "DOCX: {} body paragraphs, {} styles",
            paragraphs.len(),
            styles.names.len()
        );

        Ok(DocxDocument {
            metadata,
            paragraphs,
        })
    }

    fn read_part(&mut self, name: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| Error::DocxParse(format!("{}: {}", name, e)))?;
        Ok(Some(xml))
    }
}

/// Paragraph style ids mapped to display names.
#[derive(Debug, Clone, Default)]
struct StyleSheet {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl StyleSheet {
    fn parse(xml: &str) -> Result<Self> {
        let mut reader = XmlReader::from_str(xml);
        let mut buf = Vec::new();
        let mut sheet = StyleSheet::default();

        // (style id, is default) of the paragraph style being read
        let mut current: Option<(String, bool)> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.local_name().as_ref() == b"style" => {
                    current = paragraph_style_header(e);
                }
                Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"name" => {
                    if let (Some((id, is_default)), Some(name)) = (&current, attr_value(e, b"val"))
                    {
                        if *is_default && sheet.default_paragraph.is_none() {
                            sheet.default_paragraph = Some(id.clone());
                        }
                        sheet.names.insert(id.clone(), name);
                    }
                }
                Event::End(ref e) if e.local_name().as_ref() == b"style" => current = None,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(sheet)
    }

    fn resolve(&self, style_id: Option<&str>) -> Option<String> {
        let id = style_id.or(self.default_paragraph.as_deref())?;
        Some(self.names.get(id).cloned().unwrap_or_else(|| id.to_string()))
    }
}

fn paragraph_style_header(e: &BytesStart) -> Option<(String, bool)> {
    if attr_value(e, b"type").as_deref() != Some("paragraph") {
        return None;
    }
    let id = attr_value(e, b"styleId")?;
    let is_default = matches!(attr_value(e, b"default").as_deref(), Some("1" | "true"));
    Some((id, is_default))
}

fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse body-level paragraphs from `word/document.xml`.
///
/// Paragraphs nested in tables, text boxes or other containers are not part
/// of the body sequence.
fn parse_body(xml: &str, styles: &StyleSheet) -> Result<Vec<DocxParagraph>> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraph: Option<(String, Option<String>)> = None;
    let mut in_text = false;
    // Depth of containers whose text is not part of the paragraph
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"p" if paragraph.is_none() && parent_is_body(&stack) => {
                        paragraph = Some((String::new(), None));
                    }
                    b"txbxContent" | b"Fallback" | b"delText" | b"instrText" => skip_depth += 1,
                    b"t" if skip_depth == 0 => in_text = paragraph.is_some(),
                    b"pStyle" => set_style(&mut paragraph, e),
                    _ => {}
                }
                stack.push(local);
            }
            Event::Empty(ref e) => {
                // Tab stops in paragraph properties are also `w:tab`; only runs carry text.
                let in_run = stack.last().is_some_and(|name| name.as_slice() == b"r");
                if let Some((text, _)) = paragraph.as_mut().filter(|_| skip_depth == 0 && in_run) {
                    match e.local_name().as_ref() {
                        b"tab" => text.push('\t'),
                        b"br" | b"cr" => text.push('\n'),
                        _ => {}
                    }
                }
                if e.local_name().as_ref() == b"pStyle" {
                    set_style(&mut paragraph, e);
                }
                if e.local_name().as_ref() == b"p" && parent_is_body(&stack) {
                    paragraphs.push(DocxParagraph {
                        text: String::new(),
                        style_name: styles.resolve(None),
                    });
                }
            }
            Event::Text(ref e) if in_text => {
                if let Some((text, _)) = paragraph.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::End(ref e) => {
                stack.pop();
                match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"txbxContent" | b"Fallback" | b"delText" | b"instrText" => {
                        skip_depth = skip_depth.saturating_sub(1)
                    }
                    b"p" if parent_is_body(&stack) => {
                        if let Some((text, style_id)) = paragraph.take() {
                            paragraphs.push(DocxParagraph {
                                text,
                                style_name: styles.resolve(style_id.as_deref()),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn parent_is_body(stack: &[Vec<u8>]) -> bool {
    stack.last().is_some_and(|name| name.as_slice() == b"body")
}

fn set_style(paragraph: &mut Option<(String, Option<String>)>, e: &BytesStart) {
    if let Some((_, style)) = paragraph.as_mut() {
        if style.is_none() {
            *style = attr_value(e, b"val");
        }
    }
}

/// Parse `docProps/core.xml` (Dublin Core properties).
fn parse_core_properties(xml: &str) -> Result<Metadata> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut metadata = Metadata::default();
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => field = Some(e.local_name().as_ref().to_vec()),
            Event::Text(ref e) => {
                let value = e.unescape()?.trim().to_string();
                if value.is_empty() {
                    buf.clear();
                    continue;
                }
                match field.as_deref() {
                    Some(b"title") => metadata.title = Some(value),
                    Some(b"creator") => metadata.author = Some(value),
                    Some(b"subject") => metadata.subject = Some(value),
                    Some(b"created") => metadata.created = parse_w3c_date(&value),
                    Some(b"modified") => metadata.modified = parse_w3c_date(&value),
                    _ => {}
                }
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(metadata)
}

fn parse_w3c_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}
