//! WebSocket plate check tests
//!
//! - `session_tests` drive a single session over an in-memory pipe
//! - `server_tests` run the full TCP server with real clients

pub mod server_tests;
pub mod session_tests;
