//! Environment-driven server configuration.

use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PHOTO_DIR: &str = "./photos";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "/photos";
const DEFAULT_DB_FILE: &str = "meevi.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub photo_dir: PathBuf,
    /// Prefix for photo URLs handed back to clients.
    pub public_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Reads `MEEVI_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_text = read("MEEVI_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_text.parse().map_err(|err| ConfigError {
            key: "MEEVI_BIND_ADDR",
            message: format!("`{bind_text}` is not a socket address: {err}"),
        })?;

        Ok(Self {
            db_path: read("MEEVI_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE)),
            bind_addr,
            photo_dir: PathBuf::from(
                read("MEEVI_PHOTO_DIR").unwrap_or_else(|| DEFAULT_PHOTO_DIR.to_string()),
            ),
            public_base_url: read("MEEVI_PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}
