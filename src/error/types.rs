//! Error types
//!
//! Every failure a single request can hit. None of these outlive the request
//! that produced them.

use std::fmt;
use std::io;

use zip::result::ZipError;

/// Request handling errors
#[derive(Debug)]
pub enum RequestError {
    /// Client address is not on the allow-list
    AccessDenied(String),
    /// Request path resolves outside the document root
    PathTraversal(String),
    /// Write aimed at a file the server maintains itself (backup archive,
    /// access log, allow-list)
    ProtectedFile(String),
    /// Target is missing or not a regular file
    NotFound(String),
    UnsupportedMethod(String),
    IoError(io::Error),
    /// Backup archive could not be opened or appended to
    ArchiveError(ZipError),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::AccessDenied(a) => write!(f, "Access denied: {}", a),
            RequestError::PathTraversal(p) => write!(f, "Path traversal attempt: {}", p),
            RequestError::ProtectedFile(p) => write!(f, "Refusing to overwrite server file: {}", p),
            RequestError::NotFound(p) => write!(f, "File not found: {}", p),
            RequestError::UnsupportedMethod(m) => write!(f, "Unsupported method: {}", m),
            RequestError::IoError(e) => write!(f, "I/O error: {}", e),
            RequestError::ArchiveError(e) => write!(f, "Backup archive error: {}", e),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::IoError(e) => Some(e),
            RequestError::ArchiveError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RequestError {
    fn from(error: io::Error) -> Self {
        RequestError::IoError(error)
    }
}

impl From<ZipError> for RequestError {
    fn from(error: ZipError) -> Self {
        RequestError::ArchiveError(error)
    }
}
