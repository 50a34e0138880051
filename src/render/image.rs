//! Image extraction and embedding.
//!
//! Every image block goes through [`ImageHandler::handle`]: the bytes are
//! pulled from the backend and either written to the image directory or
//! inlined as a base64 data URI. A failure affects only that image.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result};
use crate::model::{ImageData, ImageRef};
use crate::parser::PdfBackend;

use super::options::{ImageNaming, RenderOptions};
use super::result::ConversionStats;

/// Per-conversion image handler.
pub struct ImageHandler<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    options: &'a RenderOptions,
    token: Option<String>,
    embedded: u32,
    written: u32,
    skipped: u32,
}

impl<'a, B: PdfBackend + ?Sized> ImageHandler<'a, B> {
    /// Create a handler for one conversion call.
    pub fn new(backend: &'a B, options: &'a RenderOptions) -> Self {
        let token = match options.image_naming {
            ImageNaming::Deterministic => None,
            ImageNaming::Unique => Some(uuid::Uuid::new_v4().simple().to_string()),
        };
        Self {
            backend,
            options,
            token,
            embedded: 0,
            written: 0,
            skipped: 0,
        }
    }

    /// Produce the Markdown line for an image block, if any.
    ///
    /// Returns `None` when images are disabled, the block has no resource
    /// reference, or extraction/writing failed (logged at `warn`).
    pub fn handle(&mut self, page_number: u32, image: &ImageRef) -> Option<String> {
        if !self.options.include_images {
            return None;
        }
        let xref = image.xref?;

        let result = self
            .backend
            .extract_image(xref)
            .and_then(|data| self.emit(page_number, xref, &data));

        match result {
            Ok(line) => Some(line),
            Err(e) => {
                log::warn!("Skipping image {} on page {}: {}", xref, page_number, e);
                self.skipped += 1;
                None
            }
        }
    }

    /// Deterministic file name for an image.
    pub fn file_name(&self, page_number: u32, xref: u32, extension: &str) -> String {
        let name = format!("page{}_img{}.{}", page_number, xref, extension);
        match &self.token {
            Some(token) => format!("{}_{}", token, name),
            None => name,
        }
    }

    /// Add this handler's image counts to conversion statistics.
    pub fn record(&self, stats: &mut ConversionStats) {
        stats.images_embedded += self.embedded;
        stats.images_written += self.written;
        stats.images_skipped += self.skipped;
    }

    fn emit(&mut self, page_number: u32, xref: u32, data: &ImageData) -> Result<String> {
        match self.options.images_dir() {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path: PathBuf = dir.join(self.file_name(page_number, xref, &data.extension));
                std::fs::write(&path, &data.data).map_err(|e| {
                    Error::ImageExtract(format!("failed to write {}: {}", path.display(), e))
                })?;
                self.written += 1;
                Ok(format!("![image]({})", path.display()))
            }
            None => {
                self.embedded += 1;
                Ok(format!(
                    "![image](data:image/{};base64,{})",
                    data.extension,
                    STANDARD.encode(&data.data)
                ))
            }
        }
    }
}
