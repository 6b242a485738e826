//! Document storage
//!
//! Path sandboxing, content-type lookup, document reads and writes, and the
//! append-only backup archive kept beside each document.

pub mod archive;
pub mod mime;
pub mod operations;
pub mod sandbox;

pub use archive::{append_backup, append_backup_at, archive_path_for, entry_name};
pub use mime::classify;
pub use operations::{read_document, stat_document, write_document};
pub use sandbox::PathSandbox;
