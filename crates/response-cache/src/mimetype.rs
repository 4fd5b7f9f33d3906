//! MIME type constants used by the cache

pub const APPLICATION_XHTML_XML: &str = "application/xhtml+xml";
pub const APPLICATION_XML: &str = "application/xml";
pub const TEXT_CSS: &str = "text/css";
pub const TEXT_HTML: &str = "text/html";

/// Whether a content type describes a page that belongs in a sitemap
pub fn is_page(content_type: &str) -> bool {
    content_type == TEXT_HTML || content_type == APPLICATION_XHTML_XML
}
