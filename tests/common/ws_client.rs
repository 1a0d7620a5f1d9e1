//! WebSocket client helpers
//!
//! `open_duplex_session` runs a server-side session over an in-memory pipe,
//! so session behavior can be tested without binding a port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use smartplate::{handle_connection, serve, ConnectionContext, PlateCheckService, ServeStats, SessionSummary};

pub const WS_PATH: &str = "/ws";
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A server-side session driven through an in-memory pipe
pub struct DuplexSession {
    pub client: WebSocketStream<DuplexStream>,
    pub session: JoinHandle<SessionSummary>,
    pub shutdown: watch::Sender<bool>,
}

pub async fn open_duplex_session(service: Arc<PlateCheckService>) -> DuplexSession {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let ctx = ConnectionContext {
        service,
        path: Arc::from(WS_PATH),
        shutdown: shutdown_rx,
    };
    let session = tokio::spawn(handle_connection(server_io, None, ctx));

    let (client, _response) = tokio_tungstenite::client_async("ws://localhost/ws", client_io)
        .await
        .expect("WebSocket handshake failed");

    DuplexSession {
        client,
        session,
        shutdown,
    }
}

/// A running TCP server on an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: watch::Sender<bool>,
    pub handle: JoinHandle<ServeStats>,
}

impl TestServer {
    pub async fn start(service: Arc<PlateCheckService>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
        let addr = listener.local_addr().expect("no local addr");
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { serve(listener, service, WS_PATH, shutdown_rx).await });
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Signal shutdown and wait for the server to drain
    pub async fn stop(self) -> ServeStats {
        self.shutdown.send(true).expect("server already gone");
        tokio::time::timeout(RECV_TIMEOUT, self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

pub async fn send_text<S>(client: &mut WebSocketStream<S>, text: &str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    client
        .send(Message::Text(text.to_string()))
        .await
        .expect("send failed");
}

/// Send a plate check request for `plate`
pub async fn send_check<S>(client: &mut WebSocketStream<S>, plate: &str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let frame = serde_json::json!({"plate": plate, "timestamp": "2025-06-01T09:30:00Z"});
    send_text(client, &frame.to_string()).await;
}

/// Next data frame from the server, parsed as JSON
pub async fn recv_json<S>(client: &mut WebSocketStream<S>) -> Value
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a response")
            .expect("connection ended")
            .expect("WebSocket error");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text)
                    .unwrap_or_else(|e| panic!("invalid JSON response {}: {}", text, e))
            }
            Message::Close(frame) => panic!("connection closed: {:?}", frame),
            _ => continue,
        }
    }
}

/// Send a check and wait for its response
pub async fn check<S>(client: &mut WebSocketStream<S>, plate: &str) -> Value
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    send_check(client, plate).await;
    recv_json(client).await
}
