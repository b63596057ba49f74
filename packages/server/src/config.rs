//! Server configuration read from the environment.

use std::path::PathBuf;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default directory holding the perimeter CSV exports.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Everything [`crate::run_server`] needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// Directory holding the CSV exports (`ZAN_DATA_DIR`).
    pub data_dir: PathBuf,
    /// Built frontend to serve at `/` (`ZAN_STATIC_DIR`).
    pub static_dir: Option<PathBuf>,
    /// Whether `POST /api/reload` is enabled (`ZAN_ALLOW_RELOAD`).
    pub allow_reload: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            static_dir: None,
            allow_reload: false,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for unset or unparsable values.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{raw}', using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            data_dir: non_empty("ZAN_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            static_dir: non_empty("ZAN_STATIC_DIR").map(PathBuf::from),
            allow_reload: non_empty("ZAN_ALLOW_RELOAD").is_some_and(|v| is_truthy(&v)),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
