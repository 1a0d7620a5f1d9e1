//! Command modules for the smartplate CLI
//!
//! Each command module implements a single top-level command:
//! - `serve` - run the plate check WebSocket server
//! - `check` - one plate check from the command line
//! - `db` - create the schema and import seed data
//!
//! Handlers take their `Args` struct from `cli.rs` plus the loaded
//! configuration, and return the text to print on success.

pub mod check;
pub mod db;
pub mod serve;

pub use check::run_check;
pub use db::run_db;
pub use serve::run_serve;

use tracing_subscriber::EnvFilter;

use crate::config::SmartplateConfig;
use crate::error::{Result, SmartplateError};
use crate::store::SqliteStore;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins over the configured level; `--verbose` forces debug.
pub fn init_logging(config: &SmartplateConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smartplate={}", level)));

    // Already initialized in tests; ignore.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Open the configured database, creating its schema when new
pub fn open_store(config: &SmartplateConfig) -> Result<SqliteStore> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(SmartplateError::IoError {
                path: parent.to_path_buf(),
                message: "database directory does not exist".to_string(),
            });
        }
    }
    SqliteStore::open(path)
}
