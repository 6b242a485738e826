//! Content types
//!
//! Fixed extension table; anything unknown is served as an opaque byte stream.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for a path, keyed on its extension (case-insensitive)
pub fn classify(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "ico" => "image/vnd.microsoft.icon",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(classify(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(classify(Path::new("old.htm")), "text/html; charset=utf-8");
        assert_eq!(classify(Path::new("style.css")), "text/css; charset=utf-8");
        assert_eq!(classify(Path::new("a/b/app.js")), "application/javascript; charset=utf-8");
        assert_eq!(classify(Path::new("data.json")), "application/json; charset=utf-8");
        assert_eq!(classify(Path::new("favicon.ico")), "image/vnd.microsoft.icon");
        assert_eq!(classify(Path::new("logo.png")), "image/png");
        assert_eq!(classify(Path::new("photo.jpeg")), "image/jpeg");
    }

    #[test]
    fn test_extension_case_ignored() {
        assert_eq!(classify(Path::new("INDEX.HTML")), "text/html; charset=utf-8");
        assert_eq!(classify(Path::new("Photo.JPG")), "image/jpeg");
    }

    #[test]
    fn test_unknown_and_missing_extensions() {
        assert_eq!(classify(Path::new("notes.tid")), OCTET_STREAM);
        assert_eq!(classify(Path::new("Makefile")), OCTET_STREAM);
        assert_eq!(classify(Path::new(".css")), OCTET_STREAM);
    }
}
