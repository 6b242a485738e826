//! Request handlers for the save protocol.
//!
//! The dispatcher checks the caller against the allow-list, routes by method,
//! and turns every outcome into exactly one response and one access-log
//! record. It holds no per-request state; callers serialize access to it so
//! that one request's write, backup and log append finish before the next
//! request starts.
//!
//! Writes never land on the files the server maintains itself: backup
//! archives, the access log and the allow-list.

use bytes::Bytes;
use log::{error, info};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use crate::access::AllowList;
use crate::error::{RequestError, error_to_status, reason_phrase};
use crate::middleware::AuditLog;
use crate::protocol::responses::INTERNAL_SERVER_ERROR;
use crate::protocol::{Method, SaveResponse};
use crate::storage::archive::ARCHIVE_SUFFIX;
use crate::storage::{
    PathSandbox, append_backup, classify, read_document, stat_document, write_document,
};

/// One inbound request, already detached from the transport
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub remote: IpAddr,
    pub method: Method,
    /// Raw URL path, still percent-encoded, without the query string
    pub path: String,
    pub body: Bytes,
}

/// Routes save protocol requests
#[derive(Debug)]
pub struct Dispatcher {
    allow_list: AllowList,
    sandbox: PathSandbox,
    audit: AuditLog,
}

impl Dispatcher {
    pub fn new(allow_list: AllowList, sandbox: PathSandbox, audit: AuditLog) -> Self {
        Self {
            allow_list,
            sandbox,
            audit,
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn document_root(&self) -> &Path {
        self.sandbox.root()
    }

    /// True when `remote` may talk to this server at all
    pub fn allows(&self, remote: &IpAddr) -> bool {
        self.allow_list.is_allowed_ip(remote)
    }

    /// Handles a request end to end
    pub fn handle(&self, request: &SaveRequest) -> SaveResponse {
        let remote = request.remote.to_canonical().to_string();
        let head_only = request.method == Method::Head;

        if !self.allows(&request.remote) {
            let status = error_to_status(&RequestError::AccessDenied(remote.clone()));
            self.audit.record(
                &remote,
                &format!(
                    "IP not in {}: {:?} - {} {} - {}",
                    self.allow_list.source_name(),
                    self.allow_list.addresses(),
                    request.method,
                    request.path,
                    status,
                ),
            );
            return SaveResponse::error(status, head_only);
        }

        let outcome = match &request.method {
            Method::Get => self.handle_get(&request.path),
            Method::Head => self.handle_head(&request.path),
            Method::Put => self.handle_put(&request.path, &request.body),
            Method::Options => Ok((SaveResponse::options(), String::new())),
            Method::Unsupported(method) => Err(RequestError::UnsupportedMethod(method.clone())),
        };

        match outcome {
            Ok((response, note)) => {
                self.audit.record(
                    &remote,
                    &format!(
                        "{} {} - {}{}",
                        request.method, request.path, response.status, note
                    ),
                );
                response
            }
            Err(err) => self.fail(request, err),
        }
    }

    /// Records a failed request and builds its error response.
    ///
    /// Also used by the transport for failures before dispatch, such as an
    /// aborted request body.
    pub fn fail(&self, request: &SaveRequest, err: RequestError) -> SaveResponse {
        let remote = request.remote.to_canonical().to_string();
        let status = error_to_status(&err);

        let mut message = format!(
            "{} {} - {} {}",
            status,
            reason_phrase(status),
            request.method,
            request.path
        );
        if status == INTERNAL_SERVER_ERROR {
            error!("{} {} from {} failed: {}", request.method, request.path, remote, err);
            message.push_str(&format!(" - Error: {}", err));
        } else {
            info!("{} {} from {}: {}", request.method, request.path, remote, err);
        }

        self.audit.record(&remote, &message);
        SaveResponse::error(status, request.method == Method::Head)
    }

    fn handle_get(&self, request_path: &str) -> Result<(SaveResponse, String), RequestError> {
        let file_path = self.sandbox.resolve(request_path)?;
        let modified = stat_document(&file_path, request_path)?.modified().ok();
        let data = read_document(&file_path, request_path)?;
        let content_type = classify(&file_path);

        Ok((SaveResponse::document(content_type, data, modified), String::new()))
    }

    fn handle_head(&self, request_path: &str) -> Result<(SaveResponse, String), RequestError> {
        let file_path = self.sandbox.resolve(request_path)?;
        let metadata = stat_document(&file_path, request_path)?;
        let content_type = classify(&file_path);

        Ok((
            SaveResponse::document_head(content_type, metadata.len(), metadata.modified().ok()),
            String::new(),
        ))
    }

    /// Full overwrite, then one backup entry, both before the response
    fn handle_put(
        &self,
        request_path: &str,
        body: &[u8],
    ) -> Result<(SaveResponse, String), RequestError> {
        let file_path = self.sandbox.resolve(request_path)?;
        if self.is_protected(&file_path) {
            return Err(RequestError::ProtectedFile(request_path.to_string()));
        }
        write_document(&file_path, body)?;
        let entry = append_backup(&file_path, body)?;

        Ok((
            SaveResponse::ok(),
            format!(" (Content-Length: {}, backup: {})", body.len(), entry),
        ))
    }

    /// Backup archives (by name, case-insensitively), the access log and the
    /// allow-list file
    fn is_protected(&self, file_path: &Path) -> bool {
        let is_archive = file_path
            .file_name()
            .map(|name| {
                name.to_string_lossy()
                    .to_ascii_lowercase()
                    .ends_with(ARCHIVE_SUFFIX)
            })
            .unwrap_or(false);
        if is_archive {
            return true;
        }

        let Some(target) = canonical_location(file_path) else {
            return false;
        };
        [self.audit.path(), self.allow_list.source()]
            .into_iter()
            .any(|protected| canonical_location(protected).as_ref() == Some(&target))
    }
}

/// Where a path really points: the file itself when it exists (following
/// symlinks), otherwise its canonical parent plus the file name. `None` when
/// neither exists.
fn canonical_location(path: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Some(canonical);
    }

    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|dir| dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_method;
    use std::fs;
    use std::net::Ipv4Addr;

    fn dispatcher(dir: &tempfile::TempDir) -> Dispatcher {
        Dispatcher::new(
            AllowList::from_lines("192.168.1.5"),
            PathSandbox::new(dir.path()).unwrap(),
            AuditLog::new(dir.path().join("access.log")),
        )
    }

    fn request(method: &str, path: &str, body: &'static [u8]) -> SaveRequest {
        SaveRequest {
            remote: IpAddr::V4(Ipv4Addr::LOCALHOST),
            method: parse_method(method),
            path: path.to_string(),
            body: Bytes::from_static(body),
        }
    }

    fn audit_lines(dir: &tempfile::TempDir) -> Vec<String> {
        fs::read_to_string(dir.path().join("access.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_unsupported_method_is_501() {
        let dir = tempfile::tempdir().unwrap();
        let response = dispatcher(&dir).handle(&request("POST", "/index.html", b""));
        assert_eq!(response.status, 501);

        let lines = audit_lines(&dir);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("501 Not Implemented - POST /index.html"));
        assert!(!lines[0].contains("Error:"));
    }

    #[test]
    fn test_head_applies_sandbox() {
        let dir = tempfile::tempdir().unwrap();
        let response = dispatcher(&dir).handle(&request("HEAD", "/../../etc/passwd", b""));
        assert_eq!(response.status, 403);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_head_reports_length_without_body() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), b"<html></html>").unwrap();

        let response = dispatcher(&dir).handle(&request("HEAD", "/index.html", b""));
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert_eq!(response.header("Content-Length"), Some("13"));
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_put_onto_directory_is_500_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("folder")).unwrap();

        let response = dispatcher(&dir).handle(&request("PUT", "/folder", b"data"));
        assert_eq!(response.status, 500);

        let lines = audit_lines(&dir);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("500 Internal Server Error - PUT /folder - Error:"));
        assert!(!dir.path().join("folder-tw5.zip").exists());
    }

    #[test]
    fn test_put_audit_mentions_backup_entry() {
        let dir = tempfile::tempdir().unwrap();
        let response = dispatcher(&dir).handle(&request("PUT", "/index.html", b"v1"));
        assert_eq!(response.status, 200);

        let lines = audit_lines(&dir);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("PUT /index.html - 200 (Content-Length: 2, backup: "));
        assert!(lines[0].ends_with("~index.html)"));
    }

    #[test]
    fn test_put_cannot_overwrite_backup_archive() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir);
        dispatcher.handle(&request("PUT", "/index.html", b"v1"));
        dispatcher.handle(&request("PUT", "/index.html", b"v2"));
        let archive = dir.path().join("index-tw5.zip");
        let before = fs::read(&archive).unwrap();

        for path in ["/index-tw5.zip", "/INDEX-TW5.ZIP", "/sub/../index-tw5.zip"] {
            let response = dispatcher.handle(&request("PUT", path, b"garbage"));
            assert_eq!(response.status, 403, "{}", path);
        }

        assert_eq!(fs::read(&archive).unwrap(), before);
        let lines = audit_lines(&dir);
        assert_eq!(lines.len(), 5);
        assert!(lines[2].ends_with("403 Forbidden - PUT /index-tw5.zip"));
    }

    #[test]
    fn test_put_cannot_overwrite_access_log() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir);
        dispatcher.handle(&request("OPTIONS", "/", b""));

        let response = dispatcher.handle(&request("PUT", "/access.log", b"wiped"));
        assert_eq!(response.status, 403);

        let lines = audit_lines(&dir);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("OPTIONS / - 200"));
        assert!(lines[1].ends_with("403 Forbidden - PUT /access.log"));
    }

    #[test]
    fn test_put_cannot_overwrite_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let allow_list_path = dir.path().join("allowed-client-addresses.txt");
        fs::write(&allow_list_path, "192.168.1.5\n").unwrap();
        let dispatcher = Dispatcher::new(
            AllowList::load(&allow_list_path),
            PathSandbox::new(dir.path()).unwrap(),
            AuditLog::new(dir.path().join("access.log")),
        );

        let response =
            dispatcher.handle(&request("PUT", "/allowed-client-addresses.txt", b"10.0.0.9\n"));
        assert_eq!(response.status, 403);
        assert_eq!(fs::read_to_string(&allow_list_path).unwrap(), "192.168.1.5\n");
    }

    #[test]
    fn test_get_sends_last_modified() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), b"<html></html>").unwrap();

        let dispatcher = dispatcher(&dir);
        let get = dispatcher.handle(&request("GET", "/index.html", b""));
        let head = dispatcher.handle(&request("HEAD", "/index.html", b""));
        assert!(get.header("Last-Modified").is_some_and(|v| v.ends_with(" GMT")));
        assert_eq!(get.header("Last-Modified"), head.header("Last-Modified"));
    }

    #[test]
    fn test_denied_request_logged_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request("GET", "/index.html", b"");
        req.remote = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9));

        let response = dispatcher(&dir).handle(&req);
        assert_eq!(response.status, 403);

        let lines = audit_lines(&dir);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("10.0.0.9 - - ["));
        assert!(lines[0].contains("IP not in allowed-client-addresses.txt"));
    }
}
