//! Shared type aliases used across the project to keep signatures concise.
use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

/// Writer half of one peer connection, shared between the reader thread and senders.
pub type SharedStream = Arc<Mutex<TcpStream>>;

/// A registered peer connection.
#[derive(Debug, Clone)]
pub struct PeerLink {
    pub writer: SharedStream,
    /// We opened the connection rather than accepted it.
    pub dialed: bool,
}

/// A map of peer address -> connection protected by a mutex and shared across threads.
pub type SharedConnections = Arc<Mutex<HashMap<String, PeerLink>>>;
