//! Server middleware
//!
//! Provides the access log every handled request is recorded in.

pub mod audit;

pub use audit::AuditLog;
