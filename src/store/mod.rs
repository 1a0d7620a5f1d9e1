//! Record storage consumed by the plate checker
//!
//! The checker only needs four keyed reads. [`RecordStore`] is that seam;
//! [`SqliteStore`] backs the deployed service and [`MemoryStore`] backs tests
//! and demos.
//!
//! Implementations are synchronous and may block on I/O. Async callers go
//! through [`crate::plate_check::Lookups`], which moves each call onto the
//! blocking pool under a deadline.

pub mod memory;
pub mod sqlite;

use std::path::Path;

use serde::Deserialize;

use crate::error::{LookupError, Result, SmartplateError};
use crate::models::{Plate, RegistrationForm, User};

pub use memory::{LookupOp, MemoryStore};
pub use sqlite::SqliteStore;

/// Keyed reads against persistent storage.
///
/// Every method reports absence as `Ok(None)` (or an empty list) and storage
/// failures as a [`LookupError`].
pub trait RecordStore: Send + Sync {
    /// Find the plate with this exact plate number
    fn plate_by_number(&self, plate_number: &str) -> std::result::Result<Option<Plate>, LookupError>;

    /// All plates ever issued to a vehicle, most recently issued first
    fn plates_by_vehicle(&self, vehicle_id: i64) -> std::result::Result<Vec<Plate>, LookupError>;

    /// The registration form filed for a vehicle, if any
    fn registration_form_by_vehicle(
        &self,
        vehicle_id: i64,
    ) -> std::result::Result<Option<RegistrationForm>, LookupError>;

    /// The user owning an LTO client id
    fn user_by_client_id(&self, lto_client_id: &str) -> std::result::Result<Option<User>, LookupError>;
}

/// A user row as it appears in a seed document
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub password_hash: Option<String>,
}

/// Seed document accepted by `smartplate db seed`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub registration_forms: Vec<RegistrationForm>,
    #[serde(default)]
    pub plates: Vec<Plate>,
}

impl SeedData {
    /// Load a seed document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SmartplateError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| SmartplateError::SeedError {
            message: format!("{}: {}", path.display(), e),
        })
    }

    pub fn record_count(&self) -> usize {
        self.users.len() + self.registration_forms.len() + self.plates.len()
    }
}
