//! The `connector` module keeps one device present on the fabric.
//!
//! Transport callbacks are classified by an [`InboundSink`] into
//! [`QueuedMessage`]s and pushed onto the connector's [`EventQueue`]. The
//! application calls [`Connector::run`] in a loop; each call advances the
//! connection lifecycle and dispatches at most one queued event. Shutdown is
//! polled the same way through [`Connector::close`].

pub mod engine;
pub mod inbound;
pub mod lifecycle;
pub mod message;
pub mod queue;
pub mod status;

pub use engine::{CommandCallback, Connector, ConnectorOptions, DebugLevel};
pub use inbound::InboundSink;
pub use lifecycle::{ConnectionState, RunEvent};
pub use message::{CommandMessage, ControllerUpdate, OfframpMessage, Payload, QueuedMessage};
pub use queue::EventQueue;
pub use status::{ClassType, Presence, StatusReport};
