//! Error handling
//!
//! Defines the request error taxonomy and its mapping onto HTTP statuses.

pub mod handlers;
pub mod types;

pub use handlers::{error_to_status, reason_phrase};
pub use types::*;
