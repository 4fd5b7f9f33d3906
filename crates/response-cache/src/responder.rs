//! Response assembly for cached entries

use crate::entry::Entry;
use crate::negotiate::{negotiate, Encoding};
use crate::store::Store;
use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use tracing::{debug, error};

/// `strftime` pattern for IMF-fixdate, the HTTP date format
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Derive the store key from a percent-encoded request path
///
/// Returns `None` for the root path, which belongs to the caller's fallback
/// rather than to the cache, and for paths whose escapes do not decode to
/// UTF-8, which can never name a stored entry.
pub fn cache_key(path: &str) -> Option<Cow<'_, str>> {
    let key = path.strip_prefix('/').unwrap_or(path);
    if key.is_empty() {
        return None;
    }
    match urlencoding::decode(key) {
        Ok(key) => Some(key),
        Err(err) => {
            debug!(path = %path, error = %err, "Request path is not UTF-8");
            None
        }
    }
}

/// Serve `key` from `store`, or `None` on a miss
pub fn respond(store: &Store, key: &str, request: &HeaderMap) -> Option<Response> {
    let entry = store.lookup(key)?;
    Some(serve_entry(entry, request))
}

/// Build the response for a cache hit
pub fn serve_entry(entry: &Entry, request: &HeaderMap) -> Response {
    serve_entry_at(entry, request, Utc::now())
}

/// Build the response for a cache hit as of `now`
///
/// `Expires` is derived from `now` on every call; it is never cached on the
/// entry. The entry's ETag is computed here on first serve.
pub fn serve_entry_at(entry: &Entry, request: &HeaderMap, now: DateTime<Utc>) -> Response {
    let negotiated = negotiate(entry.content_type(), request);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, negotiated.content_type)
        .header(header::ETAG, entry.etag());

    if let Some(last_modified) = entry.last_modified() {
        builder = builder.header(header::LAST_MODIFIED, http_date(last_modified));
    }

    if let Some(max_age) = entry.max_age() {
        let expires = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| now.checked_add_signed(age))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        builder = builder
            .header(header::EXPIRES, http_date(expires))
            .header(
                header::CACHE_CONTROL,
                format!("max-age={}", max_age.as_secs()),
            );
    }

    if let Some(content_encoding) = negotiated.encoding.content_encoding() {
        builder = builder.header(header::CONTENT_ENCODING, content_encoding);
    }

    let body = match negotiated.encoding {
        Encoding::Gzip => entry.gzip_body().clone(),
        Encoding::Plain => entry.body().clone(),
    };

    debug!(
        uri = %entry.uri(),
        encoding = ?negotiated.encoding,
        bytes = body.len(),
        "Serving cache entry"
    );

    builder.body(Body::from(body)).unwrap_or_else(|e| {
        error!(uri = %entry.uri(), error = %e, "Failed to build cache response");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::NewEntry;
    use crate::mimetype::{APPLICATION_XHTML_XML, TEXT_HTML};
    use axum::http::HeaderValue;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use std::time::Duration;

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn header_value<'a>(response: &'a Response, name: header::HeaderName) -> Option<&'a str> {
        response.headers().get(name).map(|v| v.to_str().unwrap())
    }

    fn gzip_request() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        headers
    }

    fn time(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_http_date() {
        assert_eq!(
            http_date(time("1994-11-06T08:49:37Z")),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("/index.html").as_deref(), Some("index.html"));
        assert_eq!(cache_key("/css/site.css").as_deref(), Some("css/site.css"));
        assert_eq!(cache_key("/"), None);
        assert_eq!(cache_key(""), None);
    }

    #[test]
    fn test_cache_key_percent_decodes() {
        assert_eq!(
            cache_key("/about%20us.html").as_deref(),
            Some("about us.html")
        );
        assert_eq!(cache_key("/caf%C3%A9.html").as_deref(), Some("café.html"));
        assert_eq!(cache_key("/docs/a%2Bb.txt").as_deref(), Some("docs/a+b.txt"));
    }

    #[test]
    fn test_cache_key_rejects_non_utf8_escapes() {
        assert_eq!(cache_key("/%FF.html"), None);
        assert_eq!(cache_key("/caf%C3.html"), None);
    }

    #[tokio::test]
    async fn test_plain_response_headers() {
        let entry = Entry::from(
            NewEntry::new("index.html", &b"<p>home</p>"[..], TEXT_HTML)
                .with_last_modified(time("2024-03-01T12:00:00Z")),
        );

        let response = serve_entry(&entry, &HeaderMap::new());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_value(&response, header::CONTENT_TYPE), Some(TEXT_HTML));
        assert_eq!(header_value(&response, header::ETAG), Some(entry.etag()));
        assert_eq!(
            header_value(&response, header::LAST_MODIFIED),
            Some("Fri, 01 Mar 2024 12:00:00 GMT")
        );
        assert!(response.headers().get(header::EXPIRES).is_none());
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        assert_eq!(body_bytes(response).await, b"<p>home</p>");
    }

    #[tokio::test]
    async fn test_gzip_response() {
        let body = "compress me ".repeat(100);
        let entry = Entry::from(NewEntry::new("a.txt", body.clone(), "text/plain"));

        let response = serve_entry(&entry, &gzip_request());

        assert_eq!(header_value(&response, header::CONTENT_ENCODING), Some("gzip"));
        let compressed = body_bytes(response).await;
        assert_eq!(compressed, entry.gzip_body().to_vec());

        let mut decoded = String::new();
        GzDecoder::new(&compressed[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_expires_is_computed_per_request() {
        let entry = Entry::from(
            NewEntry::new("a.txt", vec![b'z'; 4096], "text/plain")
                .with_max_age(Duration::from_secs(3600)),
        );

        let first = serve_entry_at(&entry, &HeaderMap::new(), time("2024-01-01T00:00:00Z"));
        let second = serve_entry_at(&entry, &HeaderMap::new(), time("2024-01-01T00:00:10Z"));

        assert_eq!(
            header_value(&first, header::EXPIRES),
            Some("Mon, 01 Jan 2024 01:00:00 GMT")
        );
        assert_eq!(
            header_value(&second, header::EXPIRES),
            Some("Mon, 01 Jan 2024 01:00:10 GMT")
        );
        assert_eq!(header_value(&first, header::CACHE_CONTROL), Some("max-age=3600"));
        assert_eq!(header_value(&second, header::CACHE_CONTROL), Some("max-age=3600"));
        assert_eq!(header_value(&first, header::ETAG), header_value(&second, header::ETAG));
    }

    #[test]
    fn test_zero_max_age_emits_no_freshness_headers() {
        let entry = Entry::from(
            NewEntry::new("a.txt", &b"x"[..], "text/plain").with_max_age(Duration::ZERO),
        );
        let response = serve_entry(&entry, &HeaderMap::new());
        assert!(response.headers().get(header::EXPIRES).is_none());
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[test]
    fn test_first_serve_computes_etag() {
        let entry = Entry::from(NewEntry::new("a.txt", &b"x"[..], "text/plain"));
        assert!(entry.cached_etag().is_none());

        let response = serve_entry(&entry, &HeaderMap::new());
        assert_eq!(header_value(&response, header::ETAG), entry.cached_etag());
    }

    #[test]
    fn test_crawler_content_type_rewrite() {
        let entry = Entry::from(NewEntry::new("page.xhtml", &b"<html/>"[..], APPLICATION_XHTML_XML));

        let mut crawler = HeaderMap::new();
        crawler.insert(header::USER_AGENT, HeaderValue::from_static("Twitterbot/1.0"));
        let response = serve_entry(&entry, &crawler);
        assert_eq!(header_value(&response, header::CONTENT_TYPE), Some(TEXT_HTML));

        let mut browser = HeaderMap::new();
        browser.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        let response = serve_entry(&entry, &browser);
        assert_eq!(
            header_value(&response, header::CONTENT_TYPE),
            Some(APPLICATION_XHTML_XML)
        );
    }

    #[test]
    fn test_respond_hit_and_miss() {
        let mut store = Store::new();
        store.insert(NewEntry::new("index.html", &b"home"[..], TEXT_HTML));

        assert!(respond(&store, "index.html", &HeaderMap::new()).is_some());
        assert!(respond(&store, "missing.html", &HeaderMap::new()).is_none());
    }
}
