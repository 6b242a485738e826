//! TiddlyWiki save server
//!
//! Serves files from a document root and accepts whole-file overwrites via
//! PUT, keeping every prior version in a zip archive beside the document.

pub mod access;
pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod storage;

pub use server::Server;
