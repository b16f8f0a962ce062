//! Comm - peer-to-peer terminal chat.
//!
//! The library holds everything except argument parsing: the wire codec
//! for peer announcements and chats, the peer roster, the interactive
//! client loop with its terminal UI, and a small TCP node that moves
//! envelopes between peers.
//!
//! The node and the client only know each other through traits: the node
//! pushes inbound events into a [`ChatObserver`] and the client hands
//! outgoing lines to a [`Node`].

pub mod client;
pub mod input;
pub mod net;
pub mod node;
pub mod roster;
pub mod tui;
pub mod types;
pub mod utils;
pub mod wire;

pub use client::{ChatObserver, Client, ClientError, ClientHandle, Node};
pub use input::{CrosstermKeys, InputBuffer, KeyInput, KeySource};
pub use node::{NodeConfig, NodeError, TcpNode};
pub use roster::PeerRoster;
pub use wire::{decode, encode, Chat, Envelope, Message, Peer, WireError};
