//! Plate check socket server
//!
//! Accepts TCP connections, upgrades them to WebSocket on a single HTTP path,
//! and runs one session task per connection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 SMARTPLATE SOCKET SERVER                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  TcpListener ──► session task per client (JoinSet)           │
//! │                    - frame decode                            │
//! │                    - PlateCheckService::check                │
//! │                    - one response per request, in order      │
//! │                                                              │
//! │  PlateCheckService (Arc, shared)                             │
//! │    └─► Lookups ──► RecordStore on the blocking pool          │
//! │                                                              │
//! │  watch::Sender<bool> ──► shutdown for listener and sessions  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol
//!
//! See [`protocol`] for the JSON payloads.

pub mod connection;
pub mod protocol;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::plate_check::PlateCheckService;

pub use connection::{handle_connection, CloseReason, ConnectionContext, SessionState, SessionSummary};
pub use protocol::{CheckStatus, DetailPack, PlateCheckRequest, PlateCheckResponse};

/// Totals reported when the server stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub connections: u64,
    pub frames_handled: u64,
}

/// Accept connections on `listener` until `shutdown` flips to `true`.
///
/// Open sessions are told to close and awaited before returning.
pub async fn serve(
    listener: TcpListener,
    service: Arc<PlateCheckService>,
    path: &str,
    mut shutdown: watch::Receiver<bool>,
) -> ServeStats {
    let ctx = ConnectionContext {
        service,
        path: Arc::from(path),
        shutdown: shutdown.clone(),
    };

    let mut sessions: JoinSet<SessionSummary> = JoinSet::new();
    let mut stats = ServeStats::default();

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Plate check server listening on ws://{}{}", addr, path);
    }

    if !*shutdown.borrow_and_update() {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        tracing::info!("Accepted connection from {}", addr);
                        stats.connections += 1;
                        let ctx = ctx.clone();
                        sessions.spawn(async move { handle_connection(stream, Some(addr), ctx).await });
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                    }
                },

                Some(done) = sessions.join_next(), if !sessions.is_empty() => {
                    record(&mut stats, done);
                }
            }
        }
    }

    drop(listener);
    tracing::info!("Shutting down, waiting for {} open session(s)", sessions.len());
    while let Some(done) = sessions.join_next().await {
        record(&mut stats, done);
    }

    stats
}

fn record(stats: &mut ServeStats, done: Result<SessionSummary, tokio::task::JoinError>) {
    match done {
        Ok(summary) => stats.frames_handled += summary.frames_handled,
        Err(e) => tracing::error!("Session task failed: {}", e),
    }
}
