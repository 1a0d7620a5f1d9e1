//! SQLite-backed record store
//!
//! Serves the checker's lookups from a single SQLite file. The schema is
//! created on open when missing, so a fresh path is immediately usable.
//!
//! Dates are stored as RFC 3339 text. Rows written by other tools with bare
//! `YYYY-MM-DD` dates are read as midnight UTC.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{RecordStore, SeedData};
use crate::error::{LookupError, Result, SmartplateError};
use crate::models::{timestamp, Plate, RegistrationForm, User};

const SCHEMA_VERSION: &str = "1";

const PLATE_COLUMNS: &str = "plate_id, vehicle_id, plate_number, plate_type, \
     plate_issue_date, plate_expiration_date, status";

const FORM_COLUMNS: &str = "registration_form_id, vehicle_id, lto_client_id, \
     submitted_date, status, registration_type";

// password_hash is never selected
const USER_COLUMNS: &str = "user_id, last_name, first_name, middle_name, email, \
     role, status, created, updated, lto_client_id";

/// SQLite [`super::RecordStore`]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| SmartplateError::IoError {
            path: path.to_path_buf(),
            message: format!("Failed to open database: {}", e),
        })?;
        Self::from_connection(conn, path.to_path_buf())
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| SmartplateError::IoError {
            path: PathBuf::from(":memory:"),
            message: format!("Failed to open database: {}", e),
        })?;
        Self::from_connection(conn, PathBuf::from(":memory:"))
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(2))
            .map_err(|e| SmartplateError::IoError {
                path: db_path.clone(),
                message: format!("Failed to configure database: {}", e),
            })?;

        let has_schema: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='plates'",
                [],
                |_| Ok(true),
            )
            .optional()
            .map_err(LookupError::from)?
            .unwrap_or(false);

        if !has_schema {
            Self::create_schema(&conn, &db_path)?;
            tracing::info!(path = %db_path.display(), "Created plate database schema");
        }

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn create_schema(conn: &Connection, db_path: &Path) -> Result<()> {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE schema_info (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            INSERT INTO schema_info VALUES ('version', '{version}');
            INSERT INTO schema_info VALUES ('created_at', datetime('now'));

            CREATE TABLE users (
                user_id INTEGER PRIMARY KEY,
                last_name TEXT NOT NULL DEFAULT '',
                first_name TEXT NOT NULL DEFAULT '',
                middle_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                password_hash TEXT,
                role TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT '',
                created TEXT,
                updated TEXT,
                lto_client_id TEXT NOT NULL UNIQUE
            );

            CREATE TABLE registration_form (
                registration_form_id TEXT PRIMARY KEY,
                vehicle_id INTEGER NOT NULL,
                lto_client_id TEXT NOT NULL DEFAULT '',
                submitted_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT '',
                registration_type TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX idx_registration_form_vehicle ON registration_form(vehicle_id);

            CREATE TABLE plates (
                plate_id TEXT PRIMARY KEY,
                vehicle_id INTEGER NOT NULL,
                plate_number TEXT NOT NULL,
                plate_type TEXT NOT NULL DEFAULT '',
                plate_issue_date TEXT NOT NULL,
                plate_expiration_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX idx_plates_number ON plates(plate_number);
            CREATE INDEX idx_plates_vehicle ON plates(vehicle_id);
            "#,
            version = SCHEMA_VERSION
        ))
        .map_err(|e| SmartplateError::IoError {
            path: db_path.to_path_buf(),
            message: format!("Failed to create schema: {}", e),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Stored schema version
    pub fn schema_version(&self) -> Option<String> {
        self.conn
            .lock()
            .query_row(
                "SELECT value FROM schema_info WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .ok()
    }

    /// Insert every record of a seed document in one transaction.
    ///
    /// Plates without an id get a generated one. Returns the number of rows
    /// written.
    pub fn import(&self, seed: &SeedData) -> Result<usize> {
        let seed_err = |e: rusqlite::Error| SmartplateError::SeedError {
            message: e.to_string(),
        };

        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(seed_err)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO users (user_id, last_name, first_name, middle_name, email, \
                     password_hash, role, status, created, updated, lto_client_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )
                .map_err(seed_err)?;
            for entry in &seed.users {
                let u = &entry.user;
                stmt.execute(params![
                    u.user_id,
                    u.last_name,
                    u.first_name,
                    u.middle_name,
                    u.email,
                    entry.password_hash,
                    u.role,
                    u.status,
                    u.created.map(format_timestamp),
                    u.updated.map(format_timestamp),
                    u.lto_client_id,
                ])
                .map_err(seed_err)?;
            }
        }
        {
            let mut stmt = tx
                .prepare_cached(&format!(
                    "INSERT INTO registration_form ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    FORM_COLUMNS
                ))
                .map_err(seed_err)?;
            for f in &seed.registration_forms {
                stmt.execute(params![
                    f.registration_form_id,
                    f.vehicle_id,
                    f.lto_client_id,
                    format_timestamp(f.submitted_date),
                    f.status,
                    f.registration_type,
                ])
                .map_err(seed_err)?;
            }
        }
        {
            let mut stmt = tx
                .prepare_cached(&format!(
                    "INSERT INTO plates ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    PLATE_COLUMNS
                ))
                .map_err(seed_err)?;
            for p in &seed.plates {
                let plate_id = if p.plate_id.is_empty() {
                    uuid::Uuid::new_v4().to_string()
                } else {
                    p.plate_id.clone()
                };
                stmt.execute(params![
                    plate_id,
                    p.vehicle_id,
                    p.plate_number,
                    p.plate_type,
                    format_timestamp(p.plate_issue_date),
                    format_timestamp(p.plate_expiration_date),
                    p.status,
                ])
                .map_err(seed_err)?;
            }
        }
        tx.commit().map_err(seed_err)?;

        Ok(seed.record_count())
    }
}

impl RecordStore for SqliteStore {
    fn plate_by_number(&self, plate_number: &str) -> std::result::Result<Option<Plate>, LookupError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM plates WHERE plate_number = ?1 LIMIT 2",
            PLATE_COLUMNS
        ))?;
        let mut rows: Vec<Plate> = stmt
            .query_map([plate_number], plate_from_row)?
            .collect::<rusqlite::Result<_>>()?;

        if rows.len() > 1 {
            return Err(LookupError::Conflict {
                entity: "plate",
                message: format!("more than one plate numbered '{}'", plate_number),
            });
        }
        Ok(rows.pop())
    }

    fn plates_by_vehicle(&self, vehicle_id: i64) -> std::result::Result<Vec<Plate>, LookupError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM plates WHERE vehicle_id = ?1",
            PLATE_COLUMNS
        ))?;
        let mut plates: Vec<Plate> = stmt
            .query_map([vehicle_id], plate_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        // Stored dates may mix formats and offsets, so order on parsed values.
        plates.sort_by(|a, b| b.plate_issue_date.cmp(&a.plate_issue_date));
        Ok(plates)
    }

    fn registration_form_by_vehicle(
        &self,
        vehicle_id: i64,
    ) -> std::result::Result<Option<RegistrationForm>, LookupError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM registration_form WHERE vehicle_id = ?1",
            FORM_COLUMNS
        ))?;
        let forms: Vec<RegistrationForm> = stmt
            .query_map([vehicle_id], form_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(forms.into_iter().max_by_key(|f| f.submitted_date))
    }

    fn user_by_client_id(&self, lto_client_id: &str) -> std::result::Result<Option<User>, LookupError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM users WHERE lto_client_id = ?1",
            USER_COLUMNS
        ))?;
        Ok(stmt.query_row([lto_client_id], user_from_row).optional()?)
    }
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    timestamp::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("invalid timestamp '{}'", raw).into(),
        )
    })
}

fn optional_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw.as_deref().and_then(timestamp::parse))
}

fn plate_from_row(row: &Row<'_>) -> rusqlite::Result<Plate> {
    Ok(Plate {
        plate_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        plate_number: row.get(2)?,
        plate_type: row.get(3)?,
        plate_issue_date: timestamp_column(row, 4)?,
        plate_expiration_date: timestamp_column(row, 5)?,
        status: row.get(6)?,
    })
}

fn form_from_row(row: &Row<'_>) -> rusqlite::Result<RegistrationForm> {
    Ok(RegistrationForm {
        registration_form_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        lto_client_id: row.get(2)?,
        submitted_date: timestamp_column(row, 3)?,
        status: row.get(4)?,
        registration_type: row.get(5)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        last_name: row.get(1)?,
        first_name: row.get(2)?,
        middle_name: row.get(3)?,
        email: row.get(4)?,
        role: row.get(5)?,
        status: row.get(6)?,
        created: optional_timestamp_column(row, 7)?,
        updated: optional_timestamp_column(row, 8)?,
        lto_client_id: row.get(9)?,
    })
}
