//! Save protocol implementation
//!
//! The GET/HEAD/PUT/OPTIONS convention the wiki client uses to read,
//! overwrite and probe a document, independent of the HTTP transport.

pub mod handlers;
pub mod method;
pub mod responses;

pub use handlers::{Dispatcher, SaveRequest};
pub use method::{Method, parse_method};
pub use responses::SaveResponse;
