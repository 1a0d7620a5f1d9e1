//! WebSocket connection handler
//!
//! One session per upgraded connection. A session reads frames strictly one
//! at a time and writes exactly one response per data frame, so responses
//! leave in the order requests arrived.
//!
//! ```text
//! Connecting --upgrade ok--> Open --read/write error, close, shutdown--> Closed
//!                             ^ |
//!                             +-+ frame handled
//! ```
//!
//! A frame that fails to decode gets a `bad_request` reply and the session
//! stays open. Only transport failures, a client Close, or server shutdown
//! end it.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

use crate::plate_check::PlateCheckService;
use crate::socket_server::protocol::{decode_request, error_reply, PlateCheckResponse};

/// Everything a connection needs from the server
#[derive(Clone)]
pub struct ConnectionContext {
    pub service: Arc<PlateCheckService>,
    /// HTTP path accepted for the upgrade
    pub path: Arc<str>,
    /// Flips to `true` when the server shuts down
    pub shutdown: watch::Receiver<bool>,
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Upgrade rejected or failed; the session never opened
    HandshakeFailed(String),
    /// Client sent a Close frame
    ClientClosed,
    /// Transport ended without a Close frame
    StreamEnded,
    ReadError(String),
    WriteError(String),
    /// Server shutdown was signalled
    Shutdown,
}

/// What happened on a finished connection
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub peer: Option<SocketAddr>,
    pub frames_handled: u64,
    pub reason: CloseReason,
}

/// Handle a single WebSocket connection from upgrade to close
pub async fn handle_connection<S>(
    stream: S,
    peer: Option<SocketAddr>,
    ctx: ConnectionContext,
) -> SessionSummary
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let session_id = new_session_id();
    tracing::debug!(session = %session_id, ?peer, "Connection accepted");

    let path = Arc::clone(&ctx.path);
    let check_path = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() == path.as_ref() {
            Ok(resp)
        } else {
            let mut err =
                ErrorResponse::new(Some(format!("no plate check endpoint at {}", req.uri().path())));
            *err.status_mut() = StatusCode::NOT_FOUND;
            Err(err)
        }
    };

    let ws = match accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(session = %session_id, ?peer, "WebSocket handshake failed: {}", e);
            return SessionSummary {
                session_id,
                peer,
                frames_handled: 0,
                reason: CloseReason::HandshakeFailed(e.to_string()),
            };
        }
    };

    let mut session = Session::new(ws, session_id, ctx);
    session.transition(SessionState::Open);
    let reason = session.run().await;
    session.transition(SessionState::Closed);

    tracing::info!(
        session = %session.session_id,
        ?peer,
        frames = session.frames_handled,
        reason = ?reason,
        "Connection closed"
    );

    SessionSummary {
        session_id: session.session_id,
        peer,
        frames_handled: session.frames_handled,
        reason,
    }
}

fn new_session_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("ses_{}", &id[..8])
}

/// State for a single connection
struct Session<S> {
    ws: WebSocketStream<S>,
    service: Arc<PlateCheckService>,
    shutdown: watch::Receiver<bool>,
    session_id: String,
    state: SessionState,
    frames_handled: u64,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(ws: WebSocketStream<S>, session_id: String, ctx: ConnectionContext) -> Self {
        Self {
            ws,
            service: ctx.service,
            shutdown: ctx.shutdown,
            session_id,
            state: SessionState::Connecting,
            frames_handled: 0,
        }
    }

    fn transition(&mut self, to: SessionState) {
        tracing::debug!(session = %self.session_id, from = ?self.state, ?to, "Session state");
        self.state = to;
    }

    async fn run(&mut self) -> CloseReason {
        if *self.shutdown.borrow_and_update() {
            self.send_going_away().await;
            return CloseReason::Shutdown;
        }

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    // A dropped sender means the server is gone too.
                    if changed.is_err() || *self.shutdown.borrow() {
                        self.send_going_away().await;
                        return CloseReason::Shutdown;
                    }
                }

                msg = self.ws.next() => {
                    let result = match msg {
                        Some(Ok(Message::Text(text))) => self.respond(text.as_bytes()).await,
                        Some(Ok(Message::Binary(data))) => self.respond(&data).await,
                        Some(Ok(Message::Ping(data))) => self.ws.send(Message::Pong(data)).await,
                        Some(Ok(Message::Close(_))) => {
                            tracing::debug!(session = %self.session_id, "Client requested close");
                            return CloseReason::ClientClosed;
                        }
                        Some(Ok(_)) => Ok(()),
                        Some(Err(e)) => {
                            tracing::info!(session = %self.session_id, "WebSocket read error: {}", e);
                            return CloseReason::ReadError(e.to_string());
                        }
                        None => return CloseReason::StreamEnded,
                    };

                    if let Err(e) = result {
                        tracing::info!(session = %self.session_id, "WebSocket write error: {}", e);
                        return CloseReason::WriteError(e.to_string());
                    }
                }
            }
        }
    }

    /// Decode one frame, run the check, write the reply
    async fn respond(&mut self, payload: &[u8]) -> Result<(), WsError> {
        let response = match decode_request(payload) {
            Ok(req) => {
                tracing::debug!(
                    session = %self.session_id,
                    plate = %req.plate,
                    timestamp = ?req.timestamp,
                    "Plate check request"
                );
                self.service.check(&req.plate).await
            }
            Err(e) => {
                tracing::warn!(session = %self.session_id, "Rejected frame: {}", e);
                PlateCheckResponse::bad_request()
            }
        };

        self.frames_handled += 1;
        tracing::debug!(
            session = %self.session_id,
            plate = %response.plate,
            status = %response.status,
            "Sending response"
        );

        let json = response.to_json().unwrap_or_else(|e| {
            tracing::error!(
                session = %self.session_id,
                plate = %response.plate,
                "Failed to encode response: {}",
                e
            );
            error_reply(&response.plate)
        });
        self.ws.send(Message::Text(json)).await
    }

    async fn send_going_away(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "server shutting down".into(),
        };
        if let Err(e) = self.ws.send(Message::Close(Some(frame))).await {
            tracing::debug!(session = %self.session_id, "Close frame not delivered: {}", e);
        }
    }
}
