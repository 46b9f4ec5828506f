//! Driver configuration.
//!
//! Controls where the database lives and which connection pragmas are set
//! when a [`Driver`](crate::Driver) opens it.
//!
//! # Example YAML
//!
//! ```yaml
//! path: data/game.db
//! foreign_keys: true
//! busy_timeout_ms: 5000
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Connection settings for a driver.
///
/// Missing keys take their defaults when loaded from YAML.
///
/// # Examples
///
/// ```
/// use sqlite_driver::DriverConfig;
///
/// let config = DriverConfig::new("game.db");
/// assert!(config.foreign_keys);
/// assert_eq!(config.busy_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Database file; `:memory:` opens a private in-memory database.
    pub path: PathBuf,
    /// Enables `PRAGMA foreign_keys`.
    pub foreign_keys: bool,
    /// How long a statement waits on a locked database.
    pub busy_timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            foreign_keys: true,
            busy_timeout_ms: 5000,
        }
    }
}

impl DriverConfig {
    /// Default settings for the database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DriverError::IoError) if the file cannot
    /// be read, or [`ConfigError`](crate::DriverError::ConfigError) if
    /// parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DriverError::IoError) if the file cannot
    /// be written, or [`ConfigError`](crate::DriverError::ConfigError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Opens a connection with these settings applied.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`](crate::DriverError::DatabaseError) if the
    /// database cannot be opened or a pragma fails.
    pub fn connect(&self) -> Result<Connection> {
        debug!(path = %self.path.display(), "Opening database");
        let conn = if self.path.as_os_str() == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.path)?
        };
        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", self.foreign_keys)?;
        Ok(conn)
    }
}
