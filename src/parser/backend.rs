//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the decoder the conversion engine
//! depends on, isolating the concrete PDF library (lopdf) from traversal
//! and rendering.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect::{detect_pdf_from_bytes, DocumentFormat};
use crate::error::{Error, Result};
use crate::model::{ImageData, Metadata, Page};

use super::content::{get_number, ContentInterpreter, PageFonts, XObjectKind};

/// Abstract interface for decoded PDF document access.
///
/// Implementations expose page traversal and image-byte extraction without
/// leaking any concrete PDF library types.
pub trait PdfBackend {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Decode one page (1-indexed) into blocks, lines and runs.
    fn load_page(&self, number: u32) -> Result<Page>;

    /// Extract the encoded bytes of the image with the given object number.
    fn extract_image(&self, xref: u32) -> Result<ImageData>;

    /// Document metadata.
    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::for_format(DocumentFormat::Pdf);
        metadata.page_count = self.page_count();
        metadata
    }
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        detect_pdf_from_bytes(data)?;

        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }

        let pages = doc.get_pages().into_values().collect();
        Ok(Self { doc, pages })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, number: u32) -> Result<ObjectId> {
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .copied()
            .ok_or(Error::PageOutOfRange(number, self.pages.len() as u32))
    }

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id).map_err(|_| {
            Error::Corrupted(format!(
                "page object {} {} is not a dictionary",
                page_id.0, page_id.1
            ))
        })?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(stream_data(s)?),
                Object::Array(arr) => Ok(self.concat_streams(arr)),
                other => Err(invalid_contents(page_id, other)),
            },
            Object::Array(arr) => Ok(self.concat_streams(arr)),
            other => Err(invalid_contents(page_id, other)),
        }
    }

    fn concat_streams(&self, refs: &[Object]) -> Vec<u8> {
        let mut content = Vec::new();
        for obj in refs {
            if let Ok(r) = obj.as_reference() {
                if let Ok(Object::Stream(s)) = self.doc.get_object(r) {
                    match stream_data(s) {
                        Ok(data) => {
                            content.extend_from_slice(&data);
                            content.push(b' ');
                        }
                        Err(e) => log::warn!("Skipping undecodable content stream {:?}: {}", r, e),
                    }
                }
            }
        }
        content
    }

    /// Resolve an object that may be an indirect reference to a dictionary.
    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok(),
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Find the resources dictionary of a page, following inheritance.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut current = self.doc.get_dictionary(page_id).ok()?;
        // Bounded walk up the page tree.
        for _ in 0..32 {
            if let Some(res) = current.get(b"Resources").ok().and_then(|r| self.resolve_dict(r)) {
                return Some(res);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Map XObject resource names of a page to what they refer to.
    fn page_xobjects(&self, page_id: ObjectId) -> HashMap<Vec<u8>, XObjectKind> {
        let mut xobjects = HashMap::new();

        let Some(xobj_dict) = self
            .page_resources(page_id)
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|x| self.resolve_dict(x))
        else {
            return xobjects;
        };

        for (name, obj) in xobj_dict.iter() {
            let kind = match obj.as_reference() {
                Ok(obj_ref) => match self.doc.get_object(obj_ref) {
                    Ok(Object::Stream(stream)) if is_image_stream(&stream.dict) => {
                        XObjectKind::Image(obj_ref.0)
                    }
                    _ => XObjectKind::Other,
                },
                Err(_) => XObjectKind::Other,
            };
            xobjects.insert(name.clone(), kind);
        }

        xobjects
    }

    /// Find a stream object by object number, trying generation 0 first.
    fn image_stream(&self, xref: u32) -> Result<&lopdf::Stream> {
        let obj = self
            .doc
            .objects
            .iter()
            .find(|((id, _), _)| *id == xref)
            .map(|(_, obj)| obj)
            .ok_or_else(|| Error::ImageExtract(format!("object {} not found", xref)))?;

        match obj {
            Object::Stream(stream) if is_image_stream(&stream.dict) => Ok(stream),
            Object::Stream(_) => Err(Error::ImageExtract(format!(
                "object {} is not an image XObject",
                xref
            ))),
            _ => Err(Error::ImageExtract(format!(
                "object {} is not a stream",
                xref
            ))),
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn load_page(&self, number: u32) -> Result<Page> {
        let page_id = self.page_id(number)?;

        let content = self.page_content(page_id)?;
        let fonts = PageFonts::new(self.doc.get_page_fonts(page_id)?);
        let xobjects = self.page_xobjects(page_id);

        let operations = if content.is_empty() {
            Vec::new()
        } else {
            lopdf::content::Content::decode(&content)
                .map_err(|e| Error::PdfParse(format!("Page {}: {}", number, e)))?
                .operations
        };

        let blocks = ContentInterpreter::new(&self.doc, &fonts, &xobjects).interpret(&operations);
        log::debug!(
            "Page {}: {} operations, {} blocks",
            number,
            operations.len(),
            blocks.len()
        );

        Ok(Page::with_blocks(number, blocks))
    }

    fn extract_image(&self, xref: u32) -> Result<ImageData> {
        let stream = self.image_stream(xref)?;
        let dict = &stream.dict;

        let width = dict_u32(dict, b"Width");
        let height = dict_u32(dict, b"Height");

        let image = match last_filter(dict).as_deref() {
            Some("DCTDecode") => ImageData::new(stream.content.clone(), "jpeg"),
            Some("JPXDecode") => ImageData::new(stream.content.clone(), "jpx"),
            Some("JBIG2Decode") => ImageData::new(stream.content.clone(), "jb2"),
            Some("CCITTFaxDecode") => {
                return Err(Error::ImageExtract(format!(
                    "object {}: CCITT fax images are not supported",
                    xref
                )))
            }
            _ => {
                let samples = stream_data(stream)
                    .map_err(|e| Error::ImageExtract(format!("object {}: {}", xref, e)))?;
                let (w, h) = width.zip(height).ok_or_else(|| {
                    Error::ImageExtract(format!("object {}: missing dimensions", xref))
                })?;
                let png = encode_png(&samples, w, h, dict, &self.doc)
                    .map_err(|e| Error::ImageExtract(format!("object {}: {}", xref, e)))?;
                ImageData::new(png, "png")
            }
        };

        Ok(match width.zip(height) {
            Some((w, h)) => image.with_dimensions(w, h),
            None => image,
        })
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::for_format(DocumentFormat::Pdf);
        metadata.page_count = self.page_count();
        metadata.pdf_version = Some(self.version());

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| self.resolve_dict(info));

        if let Some(info_dict) = info {
            metadata.title = get_string_from_dict(info_dict, b"Title");
            metadata.author = get_string_from_dict(info_dict, b"Author");
            metadata.subject = get_string_from_dict(info_dict, b"Subject");
            metadata.creator = get_string_from_dict(info_dict, b"Creator");
            metadata.producer = get_string_from_dict(info_dict, b"Producer");
            metadata.created =
                get_string_from_dict(info_dict, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified =
                get_string_from_dict(info_dict, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata
    }
}

fn invalid_contents(page_id: ObjectId, contents: &Object) -> Error {
    Error::Corrupted(format!(
        "page object {} {}: /Contents is a {}, not a stream",
        page_id.0,
        page_id.1,
        contents.enum_variant()
    ))
}

/// Decoded stream bytes; unfiltered streams are returned as stored.
fn stream_data(stream: &lopdf::Stream) -> lopdf::Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content()
    } else {
        Ok(stream.content.clone())
    }
}

fn is_image_stream(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .ok()
        .and_then(|s| s.as_name().ok())
        .map(|n| n == b"Image")
        .unwrap_or(false)
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    dict.get(key)
        .ok()
        .and_then(get_number)
        .filter(|v| *v > 0.0)
        .map(|v| v as u32)
}

/// The last filter in the chain decides the encoded format.
fn last_filter(dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter").ok()? {
        Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
        Object::Array(arr) => arr
            .last()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string()),
        _ => None,
    }
}

/// Upper bound on decoded pixels per image.
const MAX_IMAGE_PIXELS: usize = 1 << 27;

/// Color model of raw image samples.
#[derive(Debug, Clone, PartialEq)]
enum ImageColorSpace {
    /// Gray, RGB or CMYK with the given number of components
    Direct(u8),
    /// One sample per pixel indexing a palette of `base`-component colors
    Indexed { base: u8, palette: Vec<u8> },
}

fn resolve<'a>(obj: &'a Object, doc: &'a LopdfDocument) -> Option<&'a Object> {
    match obj {
        Object::Reference(r) => doc.get_object(*r).ok(),
        other => Some(other),
    }
}

fn image_color_space(cs: &Object, doc: &LopdfDocument) -> Option<ImageColorSpace> {
    let cs = resolve(cs, doc)?;
    let name = match cs {
        Object::Name(n) => n.as_slice(),
        Object::Array(arr) => arr.first()?.as_name().ok()?,
        _ => return None,
    };
    match name {
        b"DeviceGray" | b"CalGray" | b"G" => Some(ImageColorSpace::Direct(1)),
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ImageColorSpace::Direct(3)),
        b"DeviceCMYK" | b"CMYK" => Some(ImageColorSpace::Direct(4)),
        b"ICCBased" => {
            let Object::Array(arr) = cs else { return None };
            let stream = resolve(arr.get(1)?, doc)?.as_stream().ok()?;
            let n = get_number(stream.dict.get(b"N").ok()?)?;
            Some(ImageColorSpace::Direct(n as u8))
        }
        b"Indexed" | b"I" => {
            let Object::Array(arr) = cs else { return None };
            let ImageColorSpace::Direct(base) = image_color_space(arr.get(1)?, doc)? else {
                return None;
            };
            let palette = match resolve(arr.get(3)?, doc)? {
                Object::String(bytes, _) => bytes.clone(),
                Object::Stream(stream) => stream_data(stream).ok()?,
                _ => return None,
            };
            Some(ImageColorSpace::Indexed { base, palette })
        }
        _ => None,
    }
}

/// Expand packed samples to one byte each. Rows are padded to whole bytes;
/// 16-bit samples keep their high byte.
fn unpack_samples(
    data: &[u8],
    bits: u32,
    per_row: usize,
    rows: usize,
) -> std::result::Result<Vec<u8>, String> {
    let row_bytes = match bits {
        1 | 2 | 4 | 8 => per_row
            .checked_mul(bits as usize)
            .map(|row_bits| row_bits.div_ceil(8)),
        16 => per_row.checked_mul(2),
        other => return Err(format!("unsupported bits per component: {}", other)),
    }
    .ok_or("image dimensions overflow")?;
    let needed = row_bytes
        .checked_mul(rows)
        .ok_or("image dimensions overflow")?;
    if data.len() < needed {
        return Err(format!(
            "sample data too short: {} < {}",
            data.len(),
            needed
        ));
    }

    let data = &data[..needed];
    match bits {
        8 => Ok(data.to_vec()),
        16 => Ok(data.iter().step_by(2).copied().collect()),
        _ => {
            let bits = bits as usize;
            let mask = (1u8 << bits) - 1;
            let mut out = Vec::with_capacity(per_row * rows);
            for row in data.chunks_exact(row_bytes) {
                for i in 0..per_row {
                    let bit = i * bits;
                    let shift = 8 - bits - bit % 8;
                    out.push((row[bit / 8] >> shift) & mask);
                }
            }
            Ok(out)
        }
    }
}

/// Re-encode raw image samples as PNG.
fn encode_png(
    samples: &[u8],
    width: u32,
    height: u32,
    dict: &Dictionary,
    doc: &LopdfDocument,
) -> std::result::Result<Vec<u8>, String> {
    let bits = dict_u32(dict, b"BitsPerComponent").unwrap_or(8);
    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| image_color_space(cs, doc))
        .ok_or("unsupported color space")?;

    let pixels = (width as usize)
        .checked_mul(height as usize)
        .filter(|p| *p <= MAX_IMAGE_PIXELS)
        .ok_or("image dimensions overflow")?;

    let (components, pixel_data) = match color_space {
        ImageColorSpace::Direct(n) if (1..=4).contains(&n) => {
            let per_row = width as usize * n as usize;
            let mut data = unpack_samples(samples, bits, per_row, height as usize)?;
            if bits < 8 {
                let max = (1u16 << bits) - 1;
                for v in &mut data {
                    *v = (*v as u16 * 255 / max) as u8;
                }
            }
            (n, data)
        }
        ImageColorSpace::Direct(n) => return Err(format!("unsupported component count: {}", n)),
        ImageColorSpace::Indexed { base, palette } => {
            if bits > 8 {
                return Err(format!("unsupported bits per index: {}", bits));
            }
            let indices = unpack_samples(samples, bits, width as usize, height as usize)?;
            let base_len = base as usize;
            let mut data = Vec::with_capacity(pixels * base_len);
            for index in indices {
                let start = index as usize * base_len;
                match palette.get(start..start + base_len) {
                    Some(color) => data.extend_from_slice(color),
                    None => data.extend(std::iter::repeat(0).take(base_len)),
                }
            }
            (base, data)
        }
    };

    let image = match components {
        1 => image::GrayImage::from_raw(width, height, pixel_data)
            .map(image::DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, pixel_data)
            .map(image::DynamicImage::ImageRgb8),
        4 => {
            let rgb: Vec<u8> = pixel_data
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = 255 - px[3] as u16;
                    [px[0], px[1], px[2]].map(|c| ((255 - c as u16) * k / 255) as u8)
                })
                .collect();
            image::RgbImage::from_raw(width, height, rgb).map(image::DynamicImage::ImageRgb8)
        }
        n => return Err(format!("unsupported component count: {}", n)),
    }
    .ok_or("sample buffer does not match dimensions")?;

    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(buf)
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(super::content::decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
    .filter(|s| !s.trim().is_empty())
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
