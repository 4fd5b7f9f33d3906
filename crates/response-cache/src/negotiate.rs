//! Per-request content negotiation
//!
//! Encoding selection is presence-based: a client that lists `gzip` anywhere
//! in `Accept-Encoding` gets the compressed body. Quality values are not
//! interpreted.

use crate::mimetype::{APPLICATION_XHTML_XML, TEXT_HTML};
use axum::http::{header, HeaderMap};

/// User-agent substrings of crawlers that misrender XHTML previews
const XHTML_AVERSE_AGENTS: [&str; 2] = ["Twitter", "LinkedIn"];

/// Response body encoding chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Gzip,
}

impl Encoding {
    /// Value for the `Content-Encoding` header, if one is needed
    pub fn content_encoding(self) -> Option<&'static str> {
        match self {
            Encoding::Plain => None,
            Encoding::Gzip => Some("gzip"),
        }
    }
}

/// Pick the body encoding from an `Accept-Encoding` header value
pub fn select_encoding(accept_encoding: &str) -> Encoding {
    if accept_encoding.split(',').any(|token| token.trim() == "gzip") {
        Encoding::Gzip
    } else {
        Encoding::Plain
    }
}

/// Rewrite `application/xhtml+xml` to `text/html` for social-media crawlers
///
/// No other content type is ever touched.
pub fn fix_content_type<'a>(declared: &'a str, user_agent: &str) -> &'a str {
    if declared != APPLICATION_XHTML_XML {
        return declared;
    }
    if XHTML_AVERSE_AGENTS
        .iter()
        .any(|agent| user_agent.contains(agent))
    {
        return TEXT_HTML;
    }
    declared
}

/// Negotiation outcome for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated<'a> {
    pub encoding: Encoding,
    pub content_type: &'a str,
}

/// Run both negotiation rules against a request's headers
///
/// Missing or non-UTF-8 headers are treated as empty.
pub fn negotiate<'a>(declared_type: &'a str, headers: &HeaderMap) -> Negotiated<'a> {
    let accept_encoding = header_str(headers, header::ACCEPT_ENCODING);
    let user_agent = header_str(headers, header::USER_AGENT);

    Negotiated {
        encoding: select_encoding(accept_encoding),
        content_type: fix_content_type(declared_type, user_agent),
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
