//! Image storage for uploaded food photos.

pub mod filesystem;

pub use filesystem::FileImageStore;

use std::path::Path;

use crate::error::StorageError;

/// Extensions the pipeline recognizes as images.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Content type served for anything outside [`ACCEPTED_EXTENSIONS`].
pub const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

/// Public path prefix images are served under by the routing layer.
pub const IMAGE_URL_PREFIX: &str = "/api/v1/food-images";

/// Durable byte storage keyed by a flat image key.
pub trait ImageStore: Send + Sync {
    /// Writes `bytes` under `key`, or a suffixed variant of it if `key` is taken.
    /// Returns the key actually used.
    fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;

    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    fn exists(&self, key: &str) -> bool;

    fn content_type(&self, key: &str) -> &'static str {
        content_type_for(key)
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether `name` carries one of the accepted image extensions.
pub fn is_recognized_image(name: &str) -> bool {
    extension_of(name)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Content type an image key is served with.
pub fn content_type_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => GENERIC_CONTENT_TYPE,
    }
}

/// Builds the storage key for an upload: `<owner>_<file name>`.
///
/// Only the final path component of `image_name` is kept, and characters
/// outside `[A-Za-z0-9._-]` are replaced with `_`. Returns `None` when no
/// usable file name remains.
pub fn image_key(owner: &str, image_name: &str) -> Option<String> {
    let file_name = Path::new(image_name.trim())
        .file_name()
        .and_then(|n| n.to_str())?;
    let file_name = sanitize_component(file_name);
    if file_name.trim_matches(|c| c == '.' || c == '_').is_empty() {
        return None;
    }
    Some(format!("{}_{}", sanitize_component(owner), file_name))
}

fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Public URL of a stored image.
pub fn image_url(key: &str) -> String {
    format!("{}/{}", IMAGE_URL_PREFIX, key)
}
