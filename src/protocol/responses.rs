//! Save protocol responses
//!
//! Status codes, protocol headers and the transport-independent response.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::SystemTime;

use crate::error::reason_phrase;

pub const OK: u16 = 200;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const INTERNAL_SERVER_ERROR: u16 = 500;
pub const NOT_IMPLEMENTED: u16 = 501;

pub const ALLOWED_METHODS: &str = "GET,HEAD,OPTIONS,PUT";
/// Tells the wiki client the document can be saved in place
pub const API_ACCESS_TYPE_HEADER: &str = "x-api-access-type";
pub const API_ACCESS_TYPE: &str = "file";
/// Marks support for the TiddlyWiki PUT saver
pub const DAV_HEADER: &str = "dav";
pub const DAV_TW5_PUT: &str = "tw5/put";

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// IMF-fixdate, as used by `Last-Modified`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Response produced by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct SaveResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl SaveResponse {
    /// 200 with no headers and no body
    pub fn ok() -> Self {
        Self {
            status: OK,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// 200 carrying a document
    pub fn document(content_type: &str, body: Vec<u8>, modified: Option<SystemTime>) -> Self {
        let mut headers = vec![("Content-Type", content_type.to_string())];
        if let Some(modified) = modified {
            headers.push(("Last-Modified", http_date(modified)));
        }

        Self {
            status: OK,
            headers,
            body: Bytes::from(body),
        }
    }

    /// 200 with a document's headers but no body
    pub fn document_head(content_type: &str, length: u64, modified: Option<SystemTime>) -> Self {
        let mut headers = vec![
            ("Content-Type", content_type.to_string()),
            ("Content-Length", length.to_string()),
        ];
        if let Some(modified) = modified {
            headers.push(("Last-Modified", http_date(modified)));
        }

        Self {
            status: OK,
            headers,
            body: Bytes::new(),
        }
    }

    /// Capability probe answer
    pub fn options() -> Self {
        Self {
            status: OK,
            headers: vec![
                ("Allow", ALLOWED_METHODS.to_string()),
                (API_ACCESS_TYPE_HEADER, API_ACCESS_TYPE.to_string()),
                (DAV_HEADER, DAV_TW5_PUT.to_string()),
            ],
            body: Bytes::new(),
        }
    }

    /// Error with its reason phrase as a plain text body (headers only for HEAD)
    pub fn error(status: u16, head_only: bool) -> Self {
        let reason = reason_phrase(status);
        let mut headers = vec![("Content-Type", PLAIN_TEXT.to_string())];

        let body = if head_only {
            headers.push(("Content-Length", reason.len().to_string()));
            Bytes::new()
        } else {
            Bytes::from_static(reason.as_bytes())
        };

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
