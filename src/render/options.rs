//! Rendering options and configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Options for rendering document content to Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Directory to save extracted images; `None` embeds them as data URIs
    pub images_dir: Option<PathBuf>,

    /// Whether image blocks produce output at all
    pub include_images: bool,

    /// How extracted image files are named
    pub image_naming: ImageNaming,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image directory.
    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = Some(dir.into());
        self
    }

    /// Enable or disable image output.
    pub fn with_images(mut self, include: bool) -> Self {
        self.include_images = include;
        self
    }

    /// Disable image output.
    pub fn without_images(self) -> Self {
        self.with_images(false)
    }

    /// Set the image naming scheme.
    pub fn with_image_naming(mut self, naming: ImageNaming) -> Self {
        self.image_naming = naming;
        self
    }

    /// Prefix image file names with a per-call token.
    pub fn unique_image_names(self) -> Self {
        self.with_image_naming(ImageNaming::Unique)
    }

    /// The image directory, if any.
    pub fn images_dir(&self) -> Option<&Path> {
        self.images_dir.as_deref()
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            images_dir: None,
            include_images: true,
            image_naming: ImageNaming::Deterministic,
        }
    }
}

/// Naming scheme for image files written to `images_dir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageNaming {
    /// `page<N>_img<ref>.<ext>`; repeated runs overwrite each other
    #[default]
    Deterministic,
    /// `<token>_page<N>_img<ref>.<ext>` with a token unique to one conversion
    Unique,
}
