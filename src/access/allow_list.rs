//! Allow-list of client addresses
//!
//! Built once at startup from a plain text file, one address per line.
//! Blank lines and lines starting with `#` are skipped. The loopback address
//! is always present, whatever the file says or whether it can be read at all.

use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

pub const LOOPBACK: &str = "127.0.0.1";
pub const DEFAULT_ALLOW_LIST_FILE: &str = "allowed-client-addresses.txt";

/// Immutable set of permitted client addresses
#[derive(Debug, Clone)]
pub struct AllowList {
    addresses: HashSet<String>,
    source: PathBuf,
}

impl AllowList {
    /// Parses allow-list file contents. Loopback is added unconditionally.
    pub fn from_lines(text: &str) -> Self {
        let mut addresses = HashSet::from([LOOPBACK.to_string()]);
        for line in text.lines() {
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                addresses.insert(line.to_string());
            }
        }

        Self {
            addresses,
            source: PathBuf::from(DEFAULT_ALLOW_LIST_FILE),
        }
    }

    /// Loads the allow-list from `path`.
    ///
    /// Never fails: an unreadable file degrades to loopback-only access and
    /// the read error is reported once here.
    pub fn load(path: &Path) -> Self {
        let mut allow_list = match fs::read_to_string(path) {
            Ok(text) => {
                info!("Loaded allow-list from {}", path.display());
                Self::from_lines(&text)
            }
            Err(e) => {
                warn!(
                    "Could not read allow-list {}: {} (serving loopback only)",
                    path.display(),
                    e
                );
                Self::from_lines("")
            }
        };
        allow_list.source = path.to_path_buf();
        allow_list
    }

    /// Checks a textual address against the list
    pub fn is_allowed(&self, address: &str) -> bool {
        self.addresses.contains(address.trim())
    }

    /// Checks a peer address, folding IPv4-mapped IPv6 addresses to IPv4 first
    pub fn is_allowed_ip(&self, ip: &IpAddr) -> bool {
        self.is_allowed(&ip.to_canonical().to_string())
    }

    /// True when nothing beyond loopback is permitted
    pub fn is_loopback_only(&self) -> bool {
        self.addresses.len() == 1 && self.addresses.contains(LOOPBACK)
    }

    /// Sorted addresses, for the startup banner
    pub fn addresses(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.addresses.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    /// Path the list was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the source the list was loaded from
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_loopback_always_present() {
        let allow_list = AllowList::from_lines("");
        assert!(allow_list.is_allowed(LOOPBACK));
        assert!(allow_list.is_loopback_only());
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let allow_list = AllowList::from_lines("# home network\n\n  192.168.1.5  \n#10.0.0.9\n");
        assert!(allow_list.is_allowed("192.168.1.5"));
        assert!(!allow_list.is_allowed("10.0.0.9"));
        assert!(!allow_list.is_allowed("#10.0.0.9"));
        assert_eq!(allow_list.addresses(), vec!["127.0.0.1", "192.168.1.5"]);
        assert!(!allow_list.is_loopback_only());
    }

    #[test]
    fn test_listing_loopback_explicitly_keeps_loopback_only() {
        let allow_list = AllowList::from_lines("127.0.0.1\n");
        assert!(allow_list.is_loopback_only());
    }

    #[test]
    fn test_missing_file_degrades_to_loopback() {
        let dir = tempfile::tempdir().unwrap();
        let allow_list = AllowList::load(&dir.path().join("absent.txt"));
        assert!(allow_list.is_loopback_only());
        assert_eq!(allow_list.source_name(), "absent.txt");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_ALLOW_LIST_FILE);
        fs::write(&path, "192.168.1.5\n").unwrap();

        let allow_list = AllowList::load(&path);
        assert!(allow_list.is_allowed("192.168.1.5"));
        assert!(allow_list.is_allowed("127.0.0.1"));
        assert!(!allow_list.is_allowed("10.0.0.9"));
    }

    #[test]
    fn test_ipv4_mapped_peer_is_folded() {
        let allow_list = AllowList::from_lines("192.168.1.5");
        let mapped = IpAddr::V6(Ipv4Addr::new(192, 168, 1, 5).to_ipv6_mapped());
        assert!(allow_list.is_allowed_ip(&mapped));
        assert!(allow_list.is_allowed_ip(&IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert!(!allow_list.is_allowed_ip(&IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }
}
