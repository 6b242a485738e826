//! Access log
//!
//! One line per handled request, appended to a plain text file and mirrored
//! to the diagnostic log:
//!
//! ```text
//! 192.168.1.5 - - [2025-03-01, Sat 10:00:00] PUT /index.html - 200
//! ```

use chrono::{Local, NaiveDateTime};
use log::{error, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const AUDIT_TIME_FORMAT: &str = "%Y-%m-%d, %a %H:%M:%S";

/// Append-only access log
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Formats a record without the trailing newline
    pub fn format_record(remote: &str, time: NaiveDateTime, message: &str) -> String {
        format!("{} - - [{}] {}", remote, time.format(AUDIT_TIME_FORMAT), message)
    }

    /// Appends one record. Failing to write the file never fails the request.
    pub fn record(&self, remote: &str, message: &str) {
        let line = Self::format_record(remote, Local::now().naive_local(), message);
        info!("{}", line);

        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line));

        if let Err(e) = written {
            error!("Failed to append to access log {}: {}", self.path.display(), e);
        }
    }
}
