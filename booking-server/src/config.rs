//! Service configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing_subscriber::filter::Directive;

/// Logging output format
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Logging {
    /// Additional filtering directives
    #[serde(default, deserialize_with = "Logging::deserialize_filters")]
    pub filters: Vec<Directive>,

    /// Logging format
    #[serde(default)]
    pub format: LogFormat,
}

impl Logging {
    fn deserialize_filters<'de, D>(deserializer: D) -> Result<Vec<Directive>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let dirs: Vec<String> = Deserialize::deserialize(deserializer)?;
        dirs.into_iter()
            .map(|dir| dir.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum Database {
    /// In-memory database, lost on shutdown
    #[serde(rename = "memory")]
    Memory {
        #[serde(default = "Database::default_max_connections")]
        max_connections: u32,
    },
    /// File based SQLite database
    #[serde(rename = "sqlite")]
    SqLite {
        path: PathBuf,
        #[serde(default = "Database::default_max_connections")]
        max_connections: u32,
        /// Runs migrations on startup
        #[serde(default)]
        migrate: bool,
    },
}

impl Database {
    fn default_max_connections() -> u32 {
        4
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::Memory {
            max_connections: Self::default_max_connections(),
        }
    }
}

/// Sessions maintenance
#[derive(Debug, Clone, Deserialize)]
pub struct Sessions {
    /// How often expired sessions are purged, in seconds
    #[serde(default = "Sessions::default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Sessions {
    fn default_cleanup_interval() -> u64 {
        60 * 60
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl Default for Sessions {
    fn default() -> Self {
        Self {
            cleanup_interval_secs: Self::default_cleanup_interval(),
        }
    }
}

/// Top level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address where to host the service
    #[serde(default = "Config::default_host")]
    pub host: SocketAddr,

    /// Logging configuration
    #[serde(default)]
    pub logging: Logging,

    /// Database configuration
    #[serde(default)]
    pub db: Database,

    /// Sessions configuration
    #[serde(default)]
    pub sessions: Sessions,
}

impl Config {
    fn default_host() -> SocketAddr {
        ([127, 0, 0, 1], 5000).into()
    }
}
