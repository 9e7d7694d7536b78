//! Upload-specific helpers and invariants.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default ceiling for a single image, matching the founder editor limit.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Storage buckets known to the content service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    BlogImages,
    FounderImages,
    GalleryImages,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [
        Bucket::BlogImages,
        Bucket::FounderImages,
        Bucket::GalleryImages,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::BlogImages => "blog-images",
            Bucket::FounderImages => "founder-images",
            Bucket::GalleryImages => "gallery-images",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == value)
            .ok_or(())
    }
}

/// Image payload handed to the workflow by the HTTP layer.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: bytes::Bytes,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageValidationError {
    #[error("`{content_type}` is not an image")]
    NotAnImage { content_type: String },
    #[error("image is empty")]
    Empty,
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
}

impl ImageUpload {
    /// Reject non-image, empty, or oversized payloads.
    pub fn validate(&self, max_bytes: u64) -> Result<(), ImageValidationError> {
        if !self.content_type.starts_with("image/") {
            return Err(ImageValidationError::NotAnImage {
                content_type: self.content_type.clone(),
            });
        }
        if self.data.is_empty() {
            return Err(ImageValidationError::Empty);
        }
        let size = self.data.len() as u64;
        if size > max_bytes {
            return Err(ImageValidationError::TooLarge {
                size,
                limit: max_bytes,
            });
        }
        Ok(())
    }

    /// File name up to its first dot, used as gallery alt text. Dot-files
    /// keep their name without the final extension.
    pub fn stem(&self) -> String {
        match self.filename.split('.').next() {
            Some(head) if !head.trim().is_empty() => head.to_string(),
            _ => Path::new(&self.filename)
                .file_stem()
                .and_then(|value| value.to_str())
                .map(str::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Random blob key that keeps the original (lowercased) extension.
pub fn random_blob_key(original_name: &str) -> String {
    let identifier = Uuid::new_v4();
    match file_extension(original_name) {
        Some(ext) => format!("{identifier}.{ext}"),
        None => identifier.to_string(),
    }
}

fn file_extension(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Whether a blob key is a bare file name (no separators or traversal).
pub fn is_safe_blob_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
}
