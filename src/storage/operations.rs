//! Storage operations
//!
//! Reads, metadata lookups and whole-file writes on already-sandboxed paths.

use log::info;
use std::fs::{self, Metadata};
use std::path::Path;

use crate::error::RequestError;

/// Reads a document in full. Missing targets and anything that is not a
/// regular file are `NotFound`.
pub fn read_document(file_path: &Path, request_path: &str) -> Result<Vec<u8>, RequestError> {
    stat_document(file_path, request_path)?;
    let data = fs::read(file_path)?;

    info!(
        "Read {} bytes from {} (real: {})",
        data.len(),
        request_path,
        file_path.display()
    );

    Ok(data)
}

/// Metadata of a document, with the same existence rules as `read_document`
pub fn stat_document(file_path: &Path, request_path: &str) -> Result<Metadata, RequestError> {
    match fs::metadata(file_path) {
        Ok(metadata) if metadata.is_file() => Ok(metadata),
        _ => Err(RequestError::NotFound(request_path.to_string())),
    }
}

/// Replaces a document's content, creating missing parent directories
pub fn write_document(file_path: &Path, data: &[u8]) -> Result<(), RequestError> {
    if let Some(parent_dir) = file_path.parent() {
        fs::create_dir_all(parent_dir)?;
    }
    fs::write(file_path, data)?;

    info!("Wrote {} bytes to {}", data.len(), file_path.display());
    Ok(())
}
