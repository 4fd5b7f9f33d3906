//! XML sitemap over the pages held in a store

use crate::entry::Entry;
use crate::mimetype;
use crate::store::Store;
use chrono::SecondsFormat;
use std::fmt::Write;

const URLSET_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.sitemaps.org/schemas/sitemap/0.9 http://www.sitemaps.org/schemas/sitemap/0.9/sitemap.xsd">
"#;
const URLSET_CLOSE: &str = "</urlset>";

impl Store {
    /// Render a sitemap of every HTML or XHTML entry, as served from `host`
    ///
    /// URLs are sorted so the document is stable between calls.
    pub fn sitemap(&self, host: &str) -> String {
        let mut pages: Vec<(&str, &Entry)> = self
            .enumerate(|entry| mimetype::is_page(entry.content_type()))
            .collect();
        pages.sort_unstable_by_key(|(uri, _)| *uri);

        let mut sitemap = String::from(URLSET_OPEN);
        for (uri, entry) in pages {
            let loc = escape_xml(&format!("https://{}/{}", host, encode_path(uri)));
            // Writing into a String cannot fail
            let _ = match entry.last_modified() {
                Some(modified) => writeln!(
                    sitemap,
                    "<url><loc>{}</loc><lastmod>{}</lastmod></url>",
                    loc,
                    modified.to_rfc3339_opts(SecondsFormat::AutoSi, true)
                ),
                None => writeln!(sitemap, "<url><loc>{}</loc></url>", loc),
            };
        }
        sitemap.push_str(URLSET_CLOSE);
        sitemap
    }
}

/// Percent-encode each `/`-separated segment of a store key
fn encode_path(uri: &str) -> String {
    uri.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
