use tracing::debug;

use crate::topic::TopicCodec;
use crate::utils::error::TransportError;

use super::{QoS, Transport};

/// What happened to an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport.
    Sent,
    /// Dropped because the broker session is down.
    Skipped,
}

/// Publishing handle lent to code that talks to the fabric.
///
/// Requests made while the session is down are silently skipped. Requests
/// made after shutdown began fail with [`TransportError::ShuttingDown`].
pub struct Outbound<'a> {
    codec: &'a TopicCodec,
    transport: &'a mut dyn Transport,
    accepting: bool,
}

impl<'a> Outbound<'a> {
    pub fn new(codec: &'a TopicCodec, transport: &'a mut dyn Transport, accepting: bool) -> Self {
        Self {
            codec,
            transport,
            accepting,
        }
    }

    pub fn codec(&self) -> &'a TopicCodec {
        self.codec
    }

    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, TransportError> {
        if !self.ready(topic)? {
            return Ok(Delivery::Skipped);
        }
        self.transport.publish(topic, payload, qos, retain)?;
        Ok(Delivery::Sent)
    }

    pub fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<Delivery, TransportError> {
        if !self.ready(topic)? {
            return Ok(Delivery::Skipped);
        }
        self.transport.subscribe(topic, qos)?;
        Ok(Delivery::Sent)
    }

    fn ready(&self, topic: &str) -> Result<bool, TransportError> {
        if !self.accepting {
            return Err(TransportError::ShuttingDown);
        }
        if !self.transport.is_connected() {
            debug!(topic, "broker not connected, request skipped");
            return Ok(false);
        }
        Ok(true)
    }
}
