//! Content-type lookup by file extension.
//!
//! A fixed table keeps responses identical across platforms; nothing is sniffed
//! from file contents.

use std::path::Path;

use mime::Mime;

/// Returns the content type for `path` based on its extension (case-insensitive).
///
/// Unknown or missing extensions map to `application/octet-stream`.
pub fn content_type_for(path: &Path) -> Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => mime::TEXT_HTML,
        Some("css") => mime::TEXT_CSS,
        Some("js") | Some("mjs") => mime::TEXT_JAVASCRIPT,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN,
        Some("xml") => mime::TEXT_XML,
        Some("csv") => mime::TEXT_CSV,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("ico") => parsed("image/x-icon"),
        Some("webp") => parsed("image/webp"),
        Some("pdf") => mime::APPLICATION_PDF,
        Some("wasm") => parsed("application/wasm"),
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn parsed(essence: &str) -> Mime {
    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_plain_text_html() {
        assert_eq!(content_type_for(Path::new("index.html")).essence_str(), "text/html");
        assert_eq!(content_type_for(Path::new("INDEX.HTM")).essence_str(), "text/html");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(content_type_for(Path::new("data.xyz")).essence_str(), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("Makefile")).essence_str(), "application/octet-stream");
    }

    #[test]
    fn common_assets() {
        assert_eq!(content_type_for(Path::new("app.css")).essence_str(), "text/css");
        assert_eq!(content_type_for(Path::new("logo.png")).essence_str(), "image/png");
        assert_eq!(content_type_for(Path::new("photo.jpeg")).essence_str(), "image/jpeg");
    }
}
