//! Database management commands

use crate::cli::{DbArgs, DbCommand};
use crate::config::SmartplateConfig;
use crate::error::Result;
use crate::store::SeedData;

use super::open_store;

pub fn run_db(args: &DbArgs, mut config: SmartplateConfig) -> Result<String> {
    match &args.command {
        DbCommand::Init(db) => {
            db.apply(&mut config);
            let store = open_store(&config)?;
            Ok(format!(
                "Database ready at {} (schema v{})\n",
                store.db_path().display(),
                store.schema_version().unwrap_or_else(|| "?".to_string())
            ))
        }
        DbCommand::Seed(seed_args) => {
            seed_args.db.apply(&mut config);
            let seed = SeedData::load(&seed_args.file)?;
            let store = open_store(&config)?;
            let written = store.import(&seed)?;
            tracing::info!(
                users = seed.users.len(),
                registration_forms = seed.registration_forms.len(),
                plates = seed.plates.len(),
                "Seed imported"
            );
            Ok(format!(
                "Imported {} record(s) into {}\n",
                written,
                store.db_path().display()
            ))
        }
    }
}
