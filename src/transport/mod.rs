//! The `transport` module abstracts the broker session and the host network.
//!
//! The connector never talks to a socket directly. It drives a [`Transport`]
//! (an MQTT 3.1.1 client session) and a [`Network`] (link state and name
//! resolution), and every inbound event flows back through an
//! [`InboundSink`](crate::connector::InboundSink) that only enqueues.
//!
//! Implementations:
//! - [`mqtt::MqttTransport`]: a `rumqttc` session pumped on the tokio runtime.
//! - [`network::HostNetwork`]: the host resolver via `tokio::net::lookup_host`.
//! - [`memory::MemoryTransport`] / [`memory::MemoryNetwork`]: in-process
//!   stand-ins used by the `describe` dry run and by tests.

use std::net::IpAddr;

use crate::connector::InboundSink;
use crate::utils::error::TransportError;

pub mod memory;
pub mod mqtt;
pub mod network;
pub mod outbound;

pub use network::{HostNetwork, Network, Resolution, ResolveHandle};
pub use outbound::{Delivery, Outbound};

#[cfg(test)]
mod tests;

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QoS {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl QoS {
    /// Maps a configured level; anything above 2 is treated as 2.
    pub fn from_level(level: u8) -> QoS {
        match level {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            _ => QoS::ExactlyOnce,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// Message the broker publishes on our behalf when the session dies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// An MQTT client session.
///
/// `connect` only starts the session; completion is reported later through
/// the attached sink. All methods are non-blocking.
pub trait Transport {
    /// Installs the sink that receives connect, disconnect and message events.
    fn attach(&mut self, sink: InboundSink);

    /// Must be called before [`connect`](Self::connect) to take effect.
    fn set_last_will(&mut self, will: LastWill);

    fn connect(&mut self, address: IpAddr, port: u16) -> Result<(), TransportError>;

    /// Requests a graceful disconnect. Completion is observed through
    /// [`is_connected`](Self::is_connected).
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError>;

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError>;

    /// Requests handed to the session that have not been written out yet.
    fn pending_outbound(&self) -> usize;
}
