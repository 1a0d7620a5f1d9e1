//! In-memory record store
//!
//! Holds plates, registration forms and users in plain collections. Used by
//! tests and demos; each lookup can be forced to fail or slowed down so the
//! degraded paths of the checker can be exercised.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;

use super::{RecordStore, SeedData};
use crate::error::LookupError;
use crate::models::{Plate, RegistrationForm, User};

/// Identifies one of the four lookups a store serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupOp {
    PlateByNumber,
    PlatesByVehicle,
    RegistrationFormByVehicle,
    UserByClientId,
}

/// In-memory [`RecordStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    plates: RwLock<Vec<Plate>>,
    forms: RwLock<Vec<RegistrationForm>>,
    users: RwLock<HashMap<String, User>>,
    failures: RwLock<HashMap<LookupOp, LookupError>>,
    delay: RwLock<Option<Duration>>,
    calls: RwLock<Vec<LookupOp>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding every record of a seed document
    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        for entry in seed.users {
            store.insert_user(entry.user);
        }
        for form in seed.registration_forms {
            store.insert_registration_form(form);
        }
        for plate in seed.plates {
            store.insert_plate(plate);
        }
        store
    }

    pub fn insert_plate(&self, plate: Plate) {
        self.plates.write().push(plate);
    }

    pub fn insert_registration_form(&self, form: RegistrationForm) {
        self.forms.write().push(form);
    }

    pub fn insert_user(&self, user: User) {
        self.users.write().insert(user.lto_client_id.clone(), user);
    }

    /// Make every subsequent call of `op` fail with `error`
    pub fn fail(&self, op: LookupOp, error: LookupError) {
        self.failures.write().insert(op, error);
    }

    /// Stop failing `op`
    pub fn heal(&self, op: LookupOp) {
        self.failures.write().remove(&op);
    }

    /// Sleep this long inside every lookup
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    /// Lookups served so far, in call order
    pub fn calls(&self) -> Vec<LookupOp> {
        self.calls.read().clone()
    }

    fn enter(&self, op: LookupOp) -> Result<(), LookupError> {
        self.calls.write().push(op);
        let delay = *self.delay.read();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        match self.failures.read().get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl RecordStore for MemoryStore {
    fn plate_by_number(&self, plate_number: &str) -> Result<Option<Plate>, LookupError> {
        self.enter(LookupOp::PlateByNumber)?;
        let plates = self.plates.read();
        let mut matches = plates.iter().filter(|p| p.plate_number == plate_number);
        let first = matches.next().cloned();
        if matches.next().is_some() {
            return Err(LookupError::Conflict {
                entity: "plate",
                message: format!("more than one plate numbered '{}'", plate_number),
            });
        }
        Ok(first)
    }

    fn plates_by_vehicle(&self, vehicle_id: i64) -> Result<Vec<Plate>, LookupError> {
        self.enter(LookupOp::PlatesByVehicle)?;
        let mut list: Vec<Plate> = self
            .plates
            .read()
            .iter()
            .filter(|p| p.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.plate_issue_date.cmp(&a.plate_issue_date));
        Ok(list)
    }

    fn registration_form_by_vehicle(
        &self,
        vehicle_id: i64,
    ) -> Result<Option<RegistrationForm>, LookupError> {
        self.enter(LookupOp::RegistrationFormByVehicle)?;
        Ok(self
            .forms
            .read()
            .iter()
            .filter(|f| f.vehicle_id == vehicle_id)
            .max_by_key(|f| f.submitted_date)
            .cloned())
    }

    fn user_by_client_id(&self, lto_client_id: &str) -> Result<Option<User>, LookupError> {
        self.enter(LookupOp::UserByClientId)?;
        Ok(self.users.read().get(lto_client_id).cloned())
    }
}
