//! Plate validity evaluation
//!
//! Maps the outcome of the primary plate lookup to a [`CheckStatus`]. Pure:
//! the caller reads the clock once and passes the instant in.

use chrono::{DateTime, Utc};

use crate::error::LookupError;
use crate::models::Plate;
use crate::socket_server::protocol::CheckStatus;

/// Result of looking a plate up by its number
pub type PlateLookup = Result<Option<Plate>, LookupError>;

/// Evaluate a lookup outcome at `now`.
///
/// - lookup failed: `Error` (a `NotFound` error counts as absence)
/// - no record: `NotFound`
/// - expiration strictly before `now`: `Expired`
/// - otherwise: `Valid`
pub fn evaluate(outcome: &PlateLookup, now: DateTime<Utc>) -> CheckStatus {
    match outcome {
        Err(e) if e.is_not_found() => CheckStatus::NotFound,
        Err(_) => CheckStatus::Error,
        Ok(None) => CheckStatus::NotFound,
        Ok(Some(plate)) if plate.is_expired_at(now) => CheckStatus::Expired,
        Ok(Some(_)) => CheckStatus::Valid,
    }
}

/// The plate record, when the lookup found one
pub fn found_plate(outcome: &PlateLookup) -> Option<&Plate> {
    match outcome {
        Ok(Some(plate)) => Some(plate),
        _ => None,
    }
}
