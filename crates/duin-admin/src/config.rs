//! Configuration file management.
//!
//! `config.toml` lives in the data directory (`$DUIN_DATA_DIR`, else a
//! platform default). Every field is optional.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete admin daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Ledger backend settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// JSON-RPC settings.
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which ledger implementation backs the daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// In-process simulated contract. State is lost on exit.
    Local,
    /// SQLite-backed ledger in the data directory.
    #[default]
    Sqlite,
}

impl LedgerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Ledger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,
    /// Database file. Empty = $data_dir/duin.db.
    #[serde(default)]
    pub database_path: String,
    /// Contract deployment time (Unix seconds). Log scans never start
    /// earlier than this.
    #[serde(default)]
    pub publish_timestamp: u64,
}

/// JSON-RPC configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Socket path. Empty = $data_dir/admin.sock.
    #[serde(default)]
    pub socket_path: String,
    /// Shared secret `mint` callers must present. Empty = mint is open.
    #[serde(default)]
    pub mint_secret: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_log_level() -> String {
    "info".to_string()
}

impl fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcConfig")
            .field("socket_path", &self.socket_path)
            .field("mint_secret", &if self.mint_secret.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AdminConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file body.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got {:?}",
                LOG_LEVELS.join("/"),
                self.logging.level
            );
        }
        let now = duin_ledger::current_timestamp();
        if self.ledger.publish_timestamp > now {
            anyhow::bail!(
                "ledger.publish_timestamp {} is in the future",
                self.ledger.publish_timestamp
            );
        }
        if self.ledger.backend == LedgerBackend::Local && !self.ledger.database_path.is_empty() {
            anyhow::bail!("ledger.database_path is only meaningful for the sqlite backend");
        }
        if self.rpc.mint_secret.trim() != self.rpc.mint_secret {
            anyhow::bail!("rpc.mint_secret must not have surrounding whitespace");
        }
        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::default_data_dir()
    }

    /// Where the SQLite database lives.
    pub fn database_path(&self) -> PathBuf {
        if self.ledger.database_path.is_empty() {
            self.data_dir().join("duin.db")
        } else {
            PathBuf::from(&self.ledger.database_path)
        }
    }

    /// Where the JSON-RPC socket is bound.
    pub fn socket_path(&self) -> PathBuf {
        if self.rpc.socket_path.is_empty() {
            self.data_dir().join("admin.sock")
        } else {
            PathBuf::from(&self.rpc.socket_path)
        }
    }

    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("DUIN_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Duin")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".duin")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/duin"))
}
