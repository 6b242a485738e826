//! Error handlers
//!
//! Maps request errors onto the bounded set of HTTP statuses the server emits.

use crate::error::types::RequestError;
use crate::protocol::responses::{
    FORBIDDEN, INTERNAL_SERVER_ERROR, NOT_FOUND, NOT_IMPLEMENTED, OK,
};

/// Convert error to HTTP status code
pub fn error_to_status(err: &RequestError) -> u16 {
    match err {
        RequestError::AccessDenied(_) => FORBIDDEN,
        RequestError::PathTraversal(_) => FORBIDDEN,
        RequestError::ProtectedFile(_) => FORBIDDEN,
        RequestError::NotFound(_) => NOT_FOUND,
        RequestError::UnsupportedMethod(_) => NOT_IMPLEMENTED,
        RequestError::IoError(_) => INTERNAL_SERVER_ERROR,
        RequestError::ArchiveError(_) => INTERNAL_SERVER_ERROR,
    }
}

/// Reason phrase for the statuses this server produces
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        OK => "OK",
        FORBIDDEN => "Forbidden",
        NOT_FOUND => "Not Found",
        NOT_IMPLEMENTED => "Not Implemented",
        _ => "Internal Server Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_status_mapping() {
        assert_eq!(error_to_status(&RequestError::AccessDenied("10.0.0.9".into())), 403);
        assert_eq!(error_to_status(&RequestError::PathTraversal("/../x".into())), 403);
        assert_eq!(error_to_status(&RequestError::ProtectedFile("/x-tw5.zip".into())), 403);
        assert_eq!(error_to_status(&RequestError::NotFound("/x".into())), 404);
        assert_eq!(error_to_status(&RequestError::UnsupportedMethod("POST".into())), 501);
        assert_eq!(
            error_to_status(&RequestError::IoError(io::Error::new(io::ErrorKind::Other, "disk"))),
            500
        );
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(403), "Forbidden");
        assert_eq!(reason_phrase(404), "Not Found");
        assert_eq!(reason_phrase(501), "Not Implemented");
        assert_eq!(reason_phrase(500), "Internal Server Error");
    }
}
