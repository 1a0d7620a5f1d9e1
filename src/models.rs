//! Read-only record views consumed by the plate checker
//!
//! These mirror the rows the registration backend keeps for plates,
//! registration forms and users. The checker never mutates them; they are
//! loaded by a [`crate::store::RecordStore`] and attached to a response.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A license plate issued to a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    #[serde(default)]
    pub plate_id: String,
    pub vehicle_id: i64,
    pub plate_number: String,
    #[serde(default)]
    pub plate_type: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub plate_issue_date: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub plate_expiration_date: DateTime<Utc>,
    #[serde(default)]
    pub status: String,
}

/// Registration form filed for a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub registration_form_id: String,
    pub vehicle_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lto_client_id: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub submitted_date: DateTime<Utc>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub registration_type: String,
}

/// Public view of a user account.
///
/// The credential hash lives only in storage; this view has no field for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, with = "timestamp::optional")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub updated: Option<DateTime<Utc>>,
    pub lto_client_id: String,
}

impl Plate {
    /// True when the expiration instant is strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.plate_expiration_date < now
    }
}

/// Timestamp parsing shared by seed files and the SQLite store.
///
/// Accepts RFC 3339 (`2099-01-01T00:00:00Z`) or a bare date
/// (`2099-01-01`, read as midnight UTC).
pub mod timestamp {
    use super::*;
    use serde::Deserializer;

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        // SQLite's datetime('now') format
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD or RFC 3339", raw))
        })
    }

    pub mod optional {
        use super::*;
        use serde::Serializer;

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(dt) => dt.serialize(serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid date '{}'", raw))
                }),
            }
        }
    }
}
