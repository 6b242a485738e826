//! Configuration management for the TiddlyWiki save server
//!
//! Values are layered: built-in defaults, then an optional `tw5-server.toml`
//! in the working directory, then `TW5_*` environment variables. Everything
//! here is read once at startup and never changes afterwards.

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::access::{AllowList, DEFAULT_ALLOW_LIST_FILE, LOOPBACK};

/// Optional configuration file, looked up without extension by the `config` crate
pub const CONFIG_FILE: &str = "tw5-server";
pub const ENV_PREFIX: &str = "TW5";
pub const DEFAULT_PORT: u16 = 8000;

const ALL_INTERFACES: &str = "0.0.0.0";

/// Startup configuration (restart required for any change)
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listening port
    /// Environment: TW5_PORT
    pub port: u16,

    /// Directory served and written to
    /// Environment: TW5_DOCUMENT_ROOT
    pub document_root: String,

    /// Allow-list file, one client address per line
    /// Environment: TW5_ALLOW_LIST_PATH
    pub allow_list_path: String,

    /// Access log file; empty means `tw5-server-<port>.log` in the document root
    /// Environment: TW5_LOG_FILE
    pub log_file: String,
}

impl ServerConfig {
    /// Builder pre-populated with the built-in defaults
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("document_root", ".")?
            .set_default("allow_list_path", DEFAULT_ALLOW_LIST_FILE)?
            .set_default("log_file", "")
    }

    /// Load configuration from defaults, `tw5-server.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Self::from_builder(builder)
    }

    /// Build, deserialize and validate
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.document_root.trim().is_empty() {
            return Err(ConfigError::Message(
                "document_root cannot be empty".into(),
            ));
        }

        Ok(())
    }

    pub fn document_root_path(&self) -> PathBuf {
        PathBuf::from(&self.document_root)
    }

    /// Canonical document root; the server refuses to start without one
    pub fn canonical_document_root(&self) -> std::io::Result<PathBuf> {
        self.document_root_path().canonicalize()
    }

    pub fn allow_list_path(&self) -> PathBuf {
        PathBuf::from(&self.allow_list_path)
    }

    pub fn log_file_path(&self) -> PathBuf {
        if self.log_file.trim().is_empty() {
            self.document_root_path()
                .join(format!("tw5-server-{}.log", self.port))
        } else {
            PathBuf::from(&self.log_file)
        }
    }

    /// Listening socket for the given allow-list
    pub fn listen_socket(&self, allow_list: &AllowList) -> String {
        format!("{}:{}", bind_host(allow_list), self.port)
    }
}

/// Loopback-only allow-lists keep the listener on loopback; anything else
/// binds every interface so the listed hosts can reach it.
pub fn bind_host(allow_list: &AllowList) -> &'static str {
    if allow_list.is_loopback_only() {
        LOOPBACK
    } else {
        ALL_INTERFACES
    }
}
