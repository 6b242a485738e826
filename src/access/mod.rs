//! Client access control
//!
//! Network-address allow-listing, the only authentication this server does.

pub mod allow_list;

pub use allow_list::{AllowList, DEFAULT_ALLOW_LIST_FILE, LOOPBACK};
