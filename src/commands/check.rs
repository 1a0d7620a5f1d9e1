//! Single plate check from the command line
//!
//! Runs the same check a WebSocket frame triggers and prints the response
//! JSON, which makes it handy for verifying a seeded database.

use std::sync::Arc;

use crate::cli::CheckArgs;
use crate::config::SmartplateConfig;
use crate::error::{Result, SmartplateError};
use crate::plate_check::PlateCheckService;
use crate::socket_server::protocol::PlateCheckResponse;

use super::open_store;

pub fn run_check(args: &CheckArgs, mut config: SmartplateConfig) -> Result<String> {
    args.db.apply(&mut config);
    config.validate()?;

    let store = open_store(&config)?;
    let service = PlateCheckService::for_store(Arc::new(store), config.lookup.timeout());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SmartplateError::ServerError {
            message: format!("Failed to create tokio runtime: {}", e),
        })?;
    let response = runtime.block_on(service.check(&args.plate));

    render(&response, args.pretty)
}

fn render(response: &PlateCheckResponse, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    }
    .map_err(|e| SmartplateError::ServerError {
        message: format!("JSON serialization failed: {}", e),
    })?;
    Ok(format!("{}\n", json))
}
