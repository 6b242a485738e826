//! Backup archive
//!
//! Each document `<stem>.<ext>` gets a zip archive `<stem>-tw5.zip` beside it.
//! Every accepted write appends one Deflate entry named
//! `<yyyy-MM-dd_HH·mm·ss>~<filename>` holding the bytes that were written.
//! Existing entries are never rewritten, compacted or removed.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use log::info;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::RequestError;

pub const ARCHIVE_SUFFIX: &str = "-tw5.zip";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H·%M·%S";

/// Deflate level 9
const COMPRESSION_LEVEL: i64 = 9;

/// Entry name for a backup taken at `timestamp`
pub fn entry_name(timestamp: &str, file_name: &str) -> String {
    format!("{}~{}", timestamp, file_name)
}

/// Archive that holds the history of `target`
pub fn archive_path_for(target: &Path) -> Result<PathBuf, RequestError> {
    let stem = target
        .file_stem()
        .ok_or_else(|| invalid_target(target))?
        .to_string_lossy();
    let archive_name = format!("{}{}", stem, ARCHIVE_SUFFIX);

    Ok(match target.parent() {
        Some(parent) => parent.join(archive_name),
        None => PathBuf::from(archive_name),
    })
}

/// Appends `payload` as a new entry stamped with the current local time.
///
/// Returns the name of the entry that was written.
pub fn append_backup(target: &Path, payload: &[u8]) -> Result<String, RequestError> {
    append_backup_at(target, payload, Local::now().naive_local())
}

/// Appends `payload` as a new entry stamped with `now`.
///
/// The archive is created on first use. If an entry with the same
/// second-resolution name already exists, a counter is inserted after the
/// timestamp (`<timestamp>.1~<filename>`, `.2`, ...) since zip entry names must
/// be unique; the earlier entry is left untouched.
pub fn append_backup_at(
    target: &Path,
    payload: &[u8],
    now: NaiveDateTime,
) -> Result<String, RequestError> {
    let file_name = target
        .file_name()
        .ok_or_else(|| invalid_target(target))?
        .to_string_lossy()
        .to_string();
    let archive_path = archive_path_for(target)?;
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&archive_path)?;

    let (mut writer, existing) = if file.metadata()?.len() == 0 {
        (ZipWriter::new(file), HashSet::new())
    } else {
        let existing: HashSet<String> = ZipArchive::new(&file)?
            .file_names()
            .map(str::to_owned)
            .collect();
        (ZipWriter::new_append(file)?, existing)
    };

    let name = unique_entry_name(&existing, &timestamp, &file_name);

    let mut options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));
    if let Ok(modified) = zip::DateTime::from_date_and_time(
        now.year() as u16,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    ) {
        options = options.last_modified_time(modified);
    }

    writer.start_file(name.as_str(), options)?;
    writer.write_all(payload)?;
    writer.finish()?;

    info!(
        "Archived {} bytes as {} in {}",
        payload.len(),
        name,
        archive_path.display()
    );

    Ok(name)
}

fn unique_entry_name(existing: &HashSet<String>, timestamp: &str, file_name: &str) -> String {
    let name = entry_name(timestamp, file_name);
    if !existing.contains(&name) {
        return name;
    }

    let mut counter = 1u32;
    loop {
        let candidate = entry_name(&format!("{}.{}", timestamp, counter), file_name);
        if !existing.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn invalid_target(target: &Path) -> RequestError {
    RequestError::IoError(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("No file name in {}", target.display()),
    ))
}
