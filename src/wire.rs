//! Wire envelope codec.
//!
//! Every frame exchanged between nodes carries one [`Envelope`], a protobuf
//! record with two optional children: a [`Peer`] announcement (field 1) or a
//! [`Chat`] message (field 2). In memory the envelope is validated into a
//! [`Message`], so callers match on a sum type instead of probing fields.

use std::hash::{Hash, Hasher};

use prost::Message as _;
use thiserror::Error;

/// Identity and network location of a chat participant.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct Peer {
    /// Opaque unique identifier.
    #[prost(string, required, tag = "1")]
    pub address: String,
    #[prost(string, required, tag = "2")]
    pub host: String,
    #[prost(int32, required, tag = "3")]
    pub port: i32,
}

impl Peer {
    pub fn new(address: impl Into<String>, host: impl Into<String>, port: i32) -> Self {
        Self { address: address.into(), host: host.into(), port }
    }
}

/// A chat message.
///
/// Equality and hashing only look at `address` (the sender): two chats from
/// the same sender compare equal whatever their recipient or text, and a
/// `HashSet<Chat>` keeps one entry per sender. Use [`Chat::same_content`]
/// to compare every field.
#[derive(Clone, prost::Message)]
pub struct Chat {
    /// Sender address.
    #[prost(string, required, tag = "1")]
    pub address: String,
    #[prost(string, required, tag = "2")]
    pub recipient: String,
    #[prost(string, required, tag = "3")]
    pub text: String,
}

impl Chat {
    pub fn new(
        address: impl Into<String>,
        recipient: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self { address: address.into(), recipient: recipient.into(), text: text.into() }
    }

    /// Field-by-field comparison, unlike `==`.
    pub fn same_content(&self, other: &Chat) -> bool {
        self.address == other.address && self.recipient == other.recipient && self.text == other.text
    }
}

impl PartialEq for Chat {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Chat {}

impl Hash for Chat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

/// The record actually written to the wire.
///
/// Both fields are optional at the protobuf level; [`decode`] enforces that
/// at least one is present and gives the peer precedence when both are.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Envelope {
    #[prost(message, optional, tag = "1")]
    pub peer: Option<Peer>,
    #[prost(message, optional, tag = "2")]
    pub chat: Option<Chat>,
}

/// A decoded envelope payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Peer(Peer),
    Chat(Chat),
}

impl From<Peer> for Message {
    fn from(peer: Peer) -> Self {
        Message::Peer(peer)
    }
}

impl From<Chat> for Message {
    fn from(chat: Chat) -> Self {
        Message::Chat(chat)
    }
}

impl From<Message> for Envelope {
    fn from(message: Message) -> Self {
        match message {
            Message::Peer(peer) => Envelope { peer: Some(peer), chat: None },
            Message::Chat(chat) => Envelope { peer: None, chat: Some(chat) },
        }
    }
}

impl TryFrom<Envelope> for Message {
    type Error = WireError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        match envelope {
            Envelope { peer: Some(peer), .. } => Ok(Message::Peer(peer)),
            Envelope { peer: None, chat: Some(chat) } => Ok(Message::Chat(chat)),
            Envelope { peer: None, chat: None } => Err(WireError::EmptyEnvelope),
        }
    }
}

/// Codec errors.
#[derive(Debug, Error)]
pub enum WireError {
    /// The bytes are not a valid envelope.
    #[error("malformed envelope: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A well-formed envelope with neither a peer nor a chat.
    #[error("envelope carries no message")]
    EmptyEnvelope,
}

/// Wrap `message` in an envelope and serialize it.
pub fn encode(message: impl Into<Message>) -> Vec<u8> {
    Envelope::from(message.into()).encode_to_vec()
}

/// Deserialize an envelope and return its payload.
pub fn decode(bytes: &[u8]) -> Result<Message, WireError> {
    let envelope = Envelope::decode(bytes)?;
    Message::try_from(envelope)
}
