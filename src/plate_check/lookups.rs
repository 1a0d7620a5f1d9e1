//! Deadline-bounded access to the record store
//!
//! Store calls are synchronous and may block on disk or network I/O. Each one
//! runs on tokio's blocking pool so a slow store never stalls other sessions,
//! and an elapsed deadline surfaces as [`LookupError::Transient`].

use std::sync::Arc;
use std::time::Duration;

use crate::error::LookupError;
use crate::models::{Plate, RegistrationForm, User};
use crate::store::RecordStore;

/// Async front for a shared [`RecordStore`]
#[derive(Clone)]
pub struct Lookups {
    store: Arc<dyn RecordStore>,
    timeout: Option<Duration>,
}

impl Lookups {
    /// Wrap a store with no deadline
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Bound every call by `timeout` (`None` waits indefinitely)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn plate_by_number(&self, plate_number: &str) -> Result<Option<Plate>, LookupError> {
        let plate_number = plate_number.to_string();
        self.call("plate_by_number", move |store: &dyn RecordStore| {
            store.plate_by_number(&plate_number)
        })
        .await
    }

    pub async fn plates_by_vehicle(&self, vehicle_id: i64) -> Result<Vec<Plate>, LookupError> {
        self.call("plates_by_vehicle", move |store: &dyn RecordStore| {
            store.plates_by_vehicle(vehicle_id)
        })
        .await
    }

    pub async fn registration_form_by_vehicle(
        &self,
        vehicle_id: i64,
    ) -> Result<Option<RegistrationForm>, LookupError> {
        self.call("registration_form_by_vehicle", move |store: &dyn RecordStore| {
            store.registration_form_by_vehicle(vehicle_id)
        })
        .await
    }

    pub async fn user_by_client_id(&self, lto_client_id: &str) -> Result<Option<User>, LookupError> {
        let lto_client_id = lto_client_id.to_string();
        self.call("user_by_client_id", move |store: &dyn RecordStore| {
            store.user_by_client_id(&lto_client_id)
        })
        .await
    }

    async fn call<T, F>(&self, op: &'static str, f: F) -> Result<T, LookupError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RecordStore) -> Result<T, LookupError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                // The blocking call keeps running; its result is dropped.
                Err(_) => {
                    return Err(LookupError::Transient {
                        message: format!("{} timed out after {}ms", op, limit.as_millis()),
                    })
                }
            },
            None => task.await,
        };

        joined.map_err(|e| LookupError::Unknown {
            message: format!("{} worker failed: {}", op, e),
        })?
    }
}
