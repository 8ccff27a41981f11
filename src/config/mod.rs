//! Process configuration.
//!
//! The configuration file is TOML:
//!
//! ```toml
//! port = ":8080"
//! request_timeout_secs = 30
//!
//! [github.myrepo]
//! homeserver = "https://matrix.example.org"
//! username = "hookbot"
//! password = "$BOT_PASSWORD"
//! format = "{{.Sender.Login}} pushed to {{.Repository.Name}}"
//! rooms = ["!abc:example.org"]
//! ```
//!
//! `port` is `host:port`, where the host may be an IP address or a host name
//! resolved when the listener binds. `:8080` or a bare `8080` binds every
//! interface.
//!
//! `HTM_PORT` and `HTM_REQUEST_TIMEOUT_SECS` override the top-level keys when
//! set. The `[github]` blocks are not interpreted here; see
//! [`RouteRegistry`](crate::routes::RouteRegistry).

use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Listen address used when `port` is not configured.
pub const DEFAULT_LISTEN: &str = ":8080";

/// Outbound request timeout used when `request_timeout_secs` is not configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ALL_INTERFACES: &str = "0.0.0.0";

const ENV_PORT: &str = "HTM_PORT";
const ENV_REQUEST_TIMEOUT: &str = "HTM_REQUEST_TIMEOUT_SECS";

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config key `{key}` must be {expected}, found {found}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("invalid listen address `{0}`")]
    InvalidListenAddress(String),

    #[error("`github` must be a table of repository blocks, found {0}")]
    GithubNotATable(&'static str),
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    listen: String,
    request_timeout: Duration,
    github: toml::Table,
}

impl Config {
    /// Reads and parses the configuration file, applying environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&source)
    }

    /// Parses configuration text, applying environment overrides.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Self::from_toml_str_with_env(source, |var| std::env::var(var).ok())
    }

    /// Parses configuration text, reading overrides through `lookup`.
    pub fn from_toml_str_with_env<F>(source: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut table: toml::Table = toml::from_str(source)?;

        let listen = match lookup(ENV_PORT) {
            Some(value) => value,
            None => match table.remove("port") {
                Some(toml::Value::String(value)) => value,
                Some(other) => {
                    return Err(ConfigError::WrongType {
                        key: "port",
                        expected: "a string",
                        found: other.type_str().to_string(),
                    });
                }
                None => DEFAULT_LISTEN.to_string(),
            },
        };

        let timeout_secs = match lookup(ENV_REQUEST_TIMEOUT) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::WrongType {
                    key: "request_timeout_secs",
                    expected: "a positive integer",
                    found: format!("`{}` in {}", value, ENV_REQUEST_TIMEOUT),
                })?,
            None => match table.remove("request_timeout_secs") {
                Some(toml::Value::Integer(secs)) if secs > 0 => secs.unsigned_abs(),
                Some(other) => {
                    return Err(ConfigError::WrongType {
                        key: "request_timeout_secs",
                        expected: "a positive integer",
                        found: other.to_string(),
                    });
                }
                None => DEFAULT_REQUEST_TIMEOUT_SECS,
            },
        };

        let github = match table.remove("github") {
            Some(toml::Value::Table(github)) => github,
            Some(other) => return Err(ConfigError::GithubNotATable(other.type_str())),
            None => toml::Table::new(),
        };

        for key in table.keys() {
            warn!(key = %key, "Ignoring unknown config key");
        }

        Ok(Config {
            listen: parse_listen_addr(&listen)?,
            request_timeout: Duration::from_secs(timeout_secs),
            github,
        })
    }

    /// The `host:port` the HTTP server binds to. The host may still need
    /// resolving.
    pub fn listen_addr(&self) -> &str {
        &self.listen
    }

    /// Timeout applied to every request sent to a homeserver.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The raw `[github.<repo>]` blocks.
    pub fn github(&self) -> &toml::Table {
        &self.github
    }
}

/// Normalizes a listen address to `host:port`.
///
/// The port must be numeric. An empty host (`:8080`) or a bare port (`8080`)
/// becomes `0.0.0.0`. IPv6 hosts must be bracketed.
fn parse_listen_addr(value: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidListenAddress(value.to_string());
    let value = value.trim();

    if let Ok(port) = value.parse::<u16>() {
        return Ok(format!("{}:{}", ALL_INTERFACES, port));
    }

    let (host, port) = value.rsplit_once(':').ok_or_else(invalid)?;
    let port = port.parse::<u16>().map_err(|_| invalid())?;

    let host = if host.is_empty() {
        ALL_INTERFACES
    } else if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        inner.parse::<Ipv6Addr>().map_err(|_| invalid())?;
        host
    } else if host.contains([':', '[', ']', '/']) || host.contains(char::is_whitespace) {
        return Err(invalid());
    } else {
        host
    };

    Ok(format!("{}:{}", host, port))
}
