//! Image references and extracted image payloads.

use serde::{Deserialize, Serialize};

/// Reference from an image block to its embedded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageRef {
    /// Object number of the image XObject, if the block names one.
    ///
    /// Inline images and unresolvable names carry `None` and produce no output.
    pub xref: Option<u32>,
}

impl ImageRef {
    /// Reference an image by object number.
    pub fn new(xref: u32) -> Self {
        Self { xref: Some(xref) }
    }

    /// An image block with nothing to extract.
    pub fn unresolved() -> Self {
        Self { xref: None }
    }
}

/// Raw bytes of an extracted image plus the extension they should be stored with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// Encoded image bytes
    #[serde(skip_serializing)]
    pub data: Vec<u8>,

    /// File extension without the dot (e.g., "png", "jpeg")
    pub extension: String,

    /// Width in pixels
    pub width: Option<u32>,

    /// Height in pixels
    pub height: Option<u32>,
}

impl ImageData {
    /// Create a new image payload.
    pub fn new(data: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            data,
            extension: extension.into(),
            width: None,
            height: None,
        }
    }

    /// Set image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Get the size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the MIME type based on the extension.
    pub fn mime_type(&self) -> &str {
        match self.extension.as_str() {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "jpx" => "image/jp2",
            "jb2" => "image/jbig2",
            "tiff" => "image/tiff",
            _ => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_constructors() {
        assert_eq!(ImageRef::new(12).xref, Some(12));
        assert_eq!(ImageRef::unresolved().xref, None);
    }

    #[test]
    fn test_image_data_mime_type() {
        assert_eq!(ImageData::new(vec![1], "jpeg").mime_type(), "image/jpeg");
        assert_eq!(ImageData::new(vec![1], "png").mime_type(), "image/png");
        assert_eq!(
            ImageData::new(vec![1], "bin").mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_image_data_dimensions() {
        let img = ImageData::new(vec![0; 12], "png").with_dimensions(2, 2);
        assert_eq!(img.width, Some(2));
        assert_eq!(img.height, Some(2));
        assert_eq!(img.size(), 12);
    }
}
