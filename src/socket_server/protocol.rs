//! Socket server protocol message types
//!
//! Defines the JSON payloads exchanged over the plate-check WebSocket.
//!
//! ```json
//! // Client -> Server
//! {"plate": "ABC123", "timestamp": "2025-01-01T08:00:00Z"}
//!
//! // Server -> Client
//! {"plate": "ABC123", "status": "valid", "details": {"registration_form": {...}, "plates": [...], "user_record": {...}}}
//! {"plate": "XYZ999", "status": "not_found"}
//! {"status": "bad_request"}
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Plate, RegistrationForm, User};

/// Client-to-server plate check request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateCheckRequest {
    pub plate: String,
    /// Client-side capture time; only logged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Outcome of a plate check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Valid,
    NotFound,
    Expired,
    Error,
    BadRequest,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::Error => "error",
            Self::BadRequest => "bad_request",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-to-client plate check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateCheckResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plate: String,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<DetailPack>,
}

/// Records related to a found plate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailPack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_form: Option<RegistrationForm>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plates: Vec<Plate>,
    #[serde(rename = "user_record", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl PlateCheckResponse {
    pub fn new(plate: impl Into<String>, status: CheckStatus, details: Option<DetailPack>) -> Self {
        Self {
            plate: plate.into(),
            status,
            details,
        }
    }

    /// Reply to a frame that could not be decoded
    pub fn bad_request() -> Self {
        Self::new(String::new(), CheckStatus::BadRequest, None)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `error` reply for `plate`, used when a response cannot be encoded
pub fn error_reply(plate: &str) -> String {
    let mut reply = serde_json::Map::new();
    if !plate.is_empty() {
        reply.insert("plate".to_string(), plate.into());
    }
    reply.insert("status".to_string(), CheckStatus::Error.as_str().into());
    serde_json::Value::Object(reply).to_string()
}

/// Why an inbound frame was rejected
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed plate check request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plate number is blank")]
    BlankPlate,
}

/// Decode a frame payload into a request
pub fn decode_request(payload: &[u8]) -> Result<PlateCheckRequest, DecodeError> {
    let req: PlateCheckRequest = serde_json::from_slice(payload)?;
    if req.plate.trim().is_empty() {
        return Err(DecodeError::BlankPlate);
    }
    Ok(req)
}
