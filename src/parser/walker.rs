//! Lazy page traversal over a [`PdfBackend`].

use crate::error::Result;
use crate::model::{Document, Page};

use super::backend::PdfBackend;
use super::options::ParseOptions;

/// Iterates a decoded document's pages in order.
///
/// Each item is one fully decoded page. In lenient mode a page that fails
/// to decode is logged and yielded empty so that page numbering and page
/// separators stay intact.
pub struct PageWalker<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    options: &'a ParseOptions,
    next: u32,
    count: u32,
}

impl<'a, B: PdfBackend + ?Sized> PageWalker<'a, B> {
    /// Create a walker starting at page 1.
    pub fn new(backend: &'a B, options: &'a ParseOptions) -> Self {
        Self {
            backend,
            options,
            next: 1,
            count: backend.page_count(),
        }
    }

    /// Decode every page into a [`Document`] carrying the backend's metadata.
    ///
    /// Stops at the first page error in strict mode.
    pub fn collect_document(self) -> Result<Document> {
        let metadata = self.backend.metadata();
        let pages = self.collect::<Result<Vec<Page>>>()?;
        Ok(Document { metadata, pages })
    }
}

impl<B: PdfBackend + ?Sized> Iterator for PageWalker<'_, B> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.count {
            return None;
        }
        let number = self.next;
        self.next += 1;

        match self.backend.load_page(number) {
            Ok(page) => Some(Ok(page)),
            Err(e) if self.options.is_lenient() => {
                log::warn!("Page {} could not be decoded, emitting it empty: {}", number, e);
                Some(Ok(Page::new(number)))
            }
            Err(e) => Some(Err(e)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count + 1).saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}
