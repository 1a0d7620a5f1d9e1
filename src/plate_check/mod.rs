//! Plate checking
//!
//! A check runs in three steps:
//!
//! 1. look the plate up by number ([`Lookups::plate_by_number`])
//! 2. evaluate the outcome against the current time ([`evaluate`])
//! 3. when a plate was found, gather its related records ([`gather_details`])
//!
//! The result is a [`PlateCheckResponse`] ready to be written to the client.

pub mod aggregator;
pub mod evaluator;
pub mod lookups;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::socket_server::protocol::{CheckStatus, PlateCheckResponse};
use crate::store::RecordStore;

pub use aggregator::gather_details;
pub use evaluator::{evaluate, found_plate, PlateLookup};
pub use lookups::Lookups;

/// Source of the evaluation instant
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs plate checks against a shared record store
#[derive(Clone)]
pub struct PlateCheckService {
    lookups: Lookups,
    clock: Clock,
}

impl PlateCheckService {
    pub fn new(lookups: Lookups) -> Self {
        Self {
            lookups,
            clock: Arc::new(Utc::now),
        }
    }

    /// Service over `store` with an optional per-lookup deadline
    pub fn for_store(store: Arc<dyn RecordStore>, timeout: Option<std::time::Duration>) -> Self {
        Self::new(Lookups::new(store).with_timeout(timeout))
    }

    /// Replace the wall clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Check one plate number.
    ///
    /// Surrounding whitespace is not part of a plate number; the response
    /// echoes the trimmed form.
    pub async fn check(&self, plate_number: &str) -> PlateCheckResponse {
        let plate_number = plate_number.trim();
        let outcome = self.lookups.plate_by_number(plate_number).await;
        let now = (self.clock)();
        let status = evaluate(&outcome, now);

        if let Err(e) = &outcome {
            if status == CheckStatus::Error {
                tracing::warn!(plate = %plate_number, error = %e, "Plate lookup failed");
            }
        }

        let details = match found_plate(&outcome) {
            Some(plate) => Some(gather_details(&self.lookups, plate).await),
            None => None,
        };

        PlateCheckResponse::new(plate_number, status, details)
    }
}
