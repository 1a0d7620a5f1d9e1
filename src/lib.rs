//! Smartplate: real-time plate validity checks
//!
//! Serves a WebSocket endpoint where scanners submit plate numbers and get
//! back the plate's status together with the vehicle's registration form,
//! plate history and owner record.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use smartplate::{MemoryStore, PlateCheckService};
//!
//! let store = Arc::new(MemoryStore::new());
//! let service = PlateCheckService::for_store(store, None);
//! let response = service.check("ABC123").await;
//! println!("{}", response.to_json()?);
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod plate_check;
pub mod socket_server;
pub mod store;

// Re-export commonly used types
pub use cli::Cli;
pub use config::SmartplateConfig;
pub use error::{LookupError, LookupErrorKind, Result, SmartplateError};
pub use models::{Plate, RegistrationForm, User};
pub use plate_check::{Lookups, PlateCheckService};
pub use socket_server::{
    handle_connection, serve, CheckStatus, CloseReason, ConnectionContext, DetailPack,
    PlateCheckRequest, PlateCheckResponse, ServeStats, SessionSummary,
};
pub use store::{LookupOp, MemoryStore, RecordStore, SeedData, SqliteStore};
