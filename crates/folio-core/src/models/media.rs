use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse media classification that decides the storage folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Other,
}

impl MediaCategory {
    /// Classify from an HTML-style accept pattern (`image/*`, `video/mp4,video/webm`, `.pdf`).
    ///
    /// Image wins over video when a pattern names both.
    pub fn from_accept(accept: &str) -> Self {
        let accept = accept.to_ascii_lowercase();
        if accept.contains("image") {
            MediaCategory::Image
        } else if accept.contains("video") {
            MediaCategory::Video
        } else {
            MediaCategory::Other
        }
    }

    /// Top-level folder objects of this category are stored under.
    pub fn folder(&self) -> &'static str {
        match self {
            MediaCategory::Image => "images",
            MediaCategory::Video => "videos",
            MediaCategory::Other => "files",
        }
    }

    /// Human label used in upload messages.
    pub fn label(&self) -> &'static str {
        match self {
            MediaCategory::Image => "Image",
            MediaCategory::Video => "Video",
            MediaCategory::Other => "File",
        }
    }
}

/// A file selected for upload. Lives only for the duration of one transfer.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub original_filename: String,
    pub content_type: String,
    pub category: MediaCategory,
    pub data: Vec<u8>,
}

impl UploadTarget {
    pub fn new(
        original_filename: impl Into<String>,
        content_type: impl Into<String>,
        category: MediaCategory,
        data: Vec<u8>,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            content_type: content_type.into(),
            category,
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
