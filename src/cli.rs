//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SmartplateConfig;

/// Real-time plate validity checks over WebSocket
#[derive(Parser, Debug)]
#[command(name = "smartplate")]
#[command(about = "Plate validity checks for vehicle registration records")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "SMARTPLATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the plate check WebSocket server
    Serve(ServeArgs),

    /// Check a single plate and print the response JSON
    Check(CheckArgs),

    /// Manage the record database
    Db(DbArgs),
}

/// Database selection shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// SQLite database file
    #[arg(long, env = "SMARTPLATE_DATABASE")]
    pub database: Option<PathBuf>,
}

impl DatabaseArgs {
    pub fn apply(&self, config: &mut SmartplateConfig) {
        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(long, env = "SMARTPLATE_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "SMARTPLATE_PORT")]
    pub port: Option<u16>,

    /// HTTP path accepting the WebSocket upgrade
    #[arg(long)]
    pub path: Option<String>,

    /// Per-lookup deadline in milliseconds (0 disables)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut SmartplateConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.path {
            config.server.path = path.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.lookup.timeout_ms = timeout_ms;
        }
        self.db.apply(config);
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Plate number to check
    pub plate: String,

    /// Pretty-print the response
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

#[derive(Args, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand, Debug)]
pub enum DbCommand {
    /// Create the database schema
    Init(DatabaseArgs),

    /// Import users, registration forms and plates from a JSON file
    Seed(SeedArgs),
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Seed document ({"users": [...], "registration_forms": [...], "plates": [...]})
    pub file: PathBuf,

    #[command(flatten)]
    pub db: DatabaseArgs,
}
