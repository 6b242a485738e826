//! Path sandboxing
//!
//! Confines every request path to the document root. A request path is
//! percent-decoded, normalized lexically, joined onto the root, and the
//! canonical form of the result (following symlinks as far as the path
//! exists) must still lie under the canonical root.

use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::RequestError;

/// Document root that request paths are resolved against
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    /// Canonicalizes `document_root`; fails when it does not exist
    pub fn new(document_root: &Path) -> io::Result<Self> {
        Ok(Self {
            root: document_root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a raw URL path to a filesystem path under the root.
    ///
    /// Returns `PathTraversal` for anything that would escape.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, RequestError> {
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| RequestError::PathTraversal(request_path.to_string()))?;

        let segments = normalize_segments(&decoded)
            .ok_or_else(|| RequestError::PathTraversal(request_path.to_string()))?;

        let mut resolved = self.root.clone();
        resolved.extend(segments);

        let canonical = canonicalize_existing_prefix(&resolved)?;
        if !canonical.starts_with(&self.root) {
            return Err(RequestError::PathTraversal(request_path.to_string()));
        }

        Ok(resolved)
    }
}

/// Collapses `.` and `..` segments. `None` if `..` climbs above the start or a
/// segment carries a separator or NUL of its own.
pub fn normalize_segments(path: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s if s.contains(['\\', '\0']) => return None,
            s => segments.push(s),
        }
    }

    Some(segments)
}

/// Canonical form of `path`: the deepest existing ancestor is canonicalized
/// and the not-yet-existing remainder appended to it.
fn canonicalize_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut remainder = Vec::new();

    loop {
        match existing.canonicalize() {
            Ok(mut canonical) => {
                canonical.extend(remainder.iter().rev());
                return Ok(canonical);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        remainder.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}
