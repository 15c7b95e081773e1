//! Helpers for scrubbing values before they enter logs and span fields.

use std::path::Path;

/// Returns only the file-name component of a path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Drops credentials and the query string from an endpoint URL.
///
/// - `https://key@vision.example/analyze?token=x` → `https://****@vision.example/analyze`
/// - `http://localhost:8000/analyze-food` → unchanged
pub fn redact_endpoint(endpoint: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse(endpoint) else {
        return "<invalid endpoint>".to_string();
    };

    let had_credentials = !url.username().is_empty() || url.password().is_some();
    url.set_query(None);
    url.set_fragment(None);
    if had_credentials {
        let _ = url.set_password(None);
        let _ = url.set_username("****");
    }
    url.to_string()
}
