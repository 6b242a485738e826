//! HTTP transport
//!
//! Accepts connections, converts HTTP requests into save protocol requests,
//! and serializes them through a single shared dispatcher.

pub mod core;

pub use self::core::Server;
