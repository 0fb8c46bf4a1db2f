//! In-process transport and network used for dry runs and tests.

use std::net::IpAddr;

use crate::connector::InboundSink;
use crate::utils::error::TransportError;

use super::network::{Network, Resolution, ResolveHandle};
use super::{LastWill, QoS, Transport};

/// A publish recorded by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl Published {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<binary>")
    }
}

/// Records every request and lets the caller play the broker's part.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sink: Option<InboundSink>,
    will: Option<LastWill>,
    connected: bool,
    auto_connack: bool,
    linger: bool,
    connects: Vec<(IpAddr, u16)>,
    disconnects: usize,
    published: Vec<Published>,
    subscriptions: Vec<(String, QoS)>,
    pending: usize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledge every `connect` immediately.
    pub fn with_auto_connack(mut self) -> Self {
        self.auto_connack = true;
        self
    }

    /// Keep the session up after `disconnect` until
    /// [`drop_connection`](Self::drop_connection) is called.
    pub fn with_lingering_disconnect(mut self) -> Self {
        self.linger = true;
        self
    }

    /// Marks the session up and reports a CONNACK to the sink.
    pub fn accept_connection(&mut self) {
        self.connected = true;
        if let Some(sink) = &self.sink {
            sink.on_connected(false, 0);
        }
    }

    /// Marks the session down and reports it to the sink.
    pub fn drop_connection(&mut self) {
        let was_connected = std::mem::replace(&mut self.connected, false);
        if was_connected {
            if let Some(sink) = &self.sink {
                sink.on_disconnected();
            }
        }
    }

    /// Delivers an inbound PUBLISH as the broker would.
    pub fn deliver(&self, topic: &str, payload: &[u8]) {
        if let Some(sink) = &self.sink {
            sink.on_message(topic, payload, 0, false, false);
        }
    }

    pub fn set_pending(&mut self, pending: usize) {
        self.pending = pending;
    }

    pub fn last_will(&self) -> Option<&LastWill> {
        self.will.as_ref()
    }

    pub fn connects(&self) -> &[(IpAddr, u16)] {
        &self.connects
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects
    }

    pub fn published(&self) -> &[Published] {
        &self.published
    }

    /// Returns and forgets everything published so far.
    pub fn take_published(&mut self) -> Vec<Published> {
        std::mem::take(&mut self.published)
    }

    pub fn subscriptions(&self) -> &[(String, QoS)] {
        &self.subscriptions
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.iter().any(|(t, _)| t == topic)
    }
}

impl Transport for MemoryTransport {
    fn attach(&mut self, sink: InboundSink) {
        self.sink = Some(sink);
    }

    fn set_last_will(&mut self, will: LastWill) {
        self.will = Some(will);
    }

    fn connect(&mut self, address: IpAddr, port: u16) -> Result<(), TransportError> {
        self.connects.push((address, port));
        if self.auto_connack {
            self.accept_connection();
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        if !self.linger {
            self.drop_connection();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.published.push(Published {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.subscriptions.push((topic.to_string(), qos));
        Ok(())
    }

    fn pending_outbound(&self) -> usize {
        self.pending
    }
}

/// How a [`MemoryNetwork`] answers resolution requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResolution {
    Immediate(IpAddr),
    /// Keep the handle; the test completes it through
    /// [`MemoryNetwork::pending_request`].
    Deferred,
    Fail(String),
}

/// Network with a switchable link and scripted name resolution.
#[derive(Debug)]
pub struct MemoryNetwork {
    up: bool,
    script: ScriptedResolution,
    requests: Vec<String>,
    pending: Option<ResolveHandle>,
}

impl MemoryNetwork {
    pub fn new(script: ScriptedResolution) -> Self {
        Self {
            up: true,
            script,
            requests: Vec::new(),
            pending: None,
        }
    }

    pub fn set_up(&mut self, up: bool) {
        self.up = up;
    }

    pub fn set_script(&mut self, script: ScriptedResolution) {
        self.script = script;
    }

    /// Hosts asked for, in order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    /// The handle of the last deferred request.
    pub fn pending_request(&self) -> Option<&ResolveHandle> {
        self.pending.as_ref()
    }
}

impl Network for MemoryNetwork {
    fn is_up(&mut self) -> bool {
        self.up
    }

    fn resolve(&mut self, host: &str, _port: u16, handle: ResolveHandle) -> Resolution {
        self.requests.push(host.to_string());
        match &self.script {
            ScriptedResolution::Immediate(address) => Resolution::Ready(*address),
            ScriptedResolution::Deferred => {
                self.pending = Some(handle);
                Resolution::InProgress
            }
            ScriptedResolution::Fail(reason) => Resolution::Failed(reason.clone()),
        }
    }
}
