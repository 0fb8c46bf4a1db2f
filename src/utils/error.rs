//! The `error` module defines the error types used within `fabric-bridge`.
//!
//! Each concern owns an enum (topics, the value model, the transport, the device
//! bridge) and [`FabricError`] unifies them for callers that do not care which
//! layer failed. Nothing here is fatal: the worst outcome of any error is a
//! dropped message or a rejected write.

use thiserror::Error;

use crate::model::Format;

/// Failures while building or parsing a fabric topic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic is empty")]
    Empty,

    /// The first segment is not our root. The topic belongs to somebody else.
    #[error("topic root `{found}` is not `{expected}`")]
    ForeignRoot { expected: String, found: String },

    /// Segment 2 is neither `$feeds` nor `$commands`.
    #[error("unknown topic domain `{found}`")]
    UnknownDomain { found: String },

    #[error("unknown route `{found}` under `{domain}`")]
    UnknownRoute { domain: String, found: String },

    #[error("missing segment {index} ({field})")]
    MissingSegment { index: usize, field: &'static str },

    #[error("segment {index} ({field}) is empty")]
    EmptySegment { index: usize, field: &'static str },

    #[error("topic has {found} segments, expected {expected}")]
    TrailingSegments { expected: usize, found: usize },

    #[error("topic needs {needed} bytes but the buffer holds {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("could not reserve {0} bytes for a topic")]
    AllocationFailure(usize),
}

impl TopicError {
    /// True when the topic is simply not a fabric topic for our root, as opposed
    /// to a fabric topic that is malformed.
    pub fn is_foreign(&self) -> bool {
        matches!(self, TopicError::ForeignRoot { .. })
    }
}

/// Failures raised by the characteristic value model and graph lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("value of format {found} written to a {expected} characteristic")]
    FormatMismatch { expected: Format, found: Format },

    #[error("empty strings are not accepted")]
    EmptyString,

    #[error("float values must be finite")]
    NonFinite,

    #[error("bounds only apply to numeric formats, not {0}")]
    NonNumericBound(Format),

    #[error("accessory {aid} not found")]
    AccessoryNotFound { aid: u64 },

    #[error("characteristic {iid} not found on accessory {aid}")]
    CharacteristicNotFound { aid: u64, iid: u64 },

    #[error("characteristic {iid} on accessory {aid} is not writable")]
    NotWritable { aid: u64, iid: u64 },
}

/// Failures reported by a transport collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,

    #[error("transport rejected the request: {0}")]
    Rejected(String),

    #[error("connector is shutting down")]
    ShuttingDown,
}

/// Failures while moving values between the accessory graph and the wire.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("payload is not valid json: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("payload field `{0}` is missing or has the wrong type")]
    MissingField(&'static str),

    #[error("updates in format `{0}` are not handled")]
    UnsupportedFormat(String),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("no accessories attached to the connector")]
    NoDevice,
}
