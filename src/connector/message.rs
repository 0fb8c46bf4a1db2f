//! Events carried by the [`EventQueue`](super::EventQueue).
//!
//! Every variant owns its data. A message is moved into the queue by a
//! producer and moved out by the poll loop, which drops it after dispatch.

use std::fmt;

use crate::topic::{CommandAddress, OfframpAddress};

/// Owned copy of an inbound payload. Not assumed to be UTF-8.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Payload(Box<[u8]>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The payload as text, when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload(bytes.into())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload(bytes.into_boxed_slice())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => write!(f, "Payload({text:?})"),
            None => write!(f, "Payload({} bytes)", self.0.len()),
        }
    }
}

/// A command addressed to us by another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    pub address: CommandAddress,
    pub payload: Payload,
}

/// A value update sent by the controller to one of our characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerUpdate {
    pub actor_id: String,
    pub feed_id: String,
    pub payload: Payload,
}

/// An offramp feed from another node we subscribed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfframpMessage {
    pub address: OfframpAddress,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedMessage {
    Offramp(OfframpMessage),
    Command(CommandMessage),
    FromController(ControllerUpdate),
    Connected { session_present: bool, code: u8 },
    Disconnected,
    /// A controller service announced itself online.
    ControllerOnline { nodename: String },
}

impl QueuedMessage {
    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            QueuedMessage::Offramp(_) => "offramp",
            QueuedMessage::Command(_) => "command",
            QueuedMessage::FromController(_) => "from_controller",
            QueuedMessage::Connected { .. } => "connected",
            QueuedMessage::Disconnected => "disconnected",
            QueuedMessage::ControllerOnline { .. } => "controller_online",
        }
    }
}
