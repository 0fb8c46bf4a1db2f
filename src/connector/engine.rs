use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::device::{DeviceBridge, DeviceEvent, InboundOutcome};
use crate::model::marshal::Envelope;
use crate::model::{Container, Value, WriteOutcome};
use crate::topic::{
    ANY, FEED_DEBUG_ERROR, FEED_DEBUG_INFO, FEED_DEBUG_WARN, FEED_SECONDS, NODENAME_BROADCAST,
    PLATFORM_CHRONOS, SERVICE_ANALOG_OUT, SERVICE_DEBUG, TASK_ANALOG_WRITE, TASK_DEBUG, TopicCodec,
};
use crate::transport::{
    Delivery, LastWill, Network, Outbound, QoS, Resolution, ResolveHandle, Transport,
};
use crate::utils::error::FabricError;

use super::inbound::InboundSink;
use super::lifecycle::{ConnectionState, LinkState, RunEvent, ShutdownPhase};
use super::message::{CommandMessage, ControllerUpdate, OfframpMessage, QueuedMessage};
use super::queue::EventQueue;
use super::status::{ClassType, Presence, StatusReport};

/// Delay before a failed broker lookup is retried.
const RESOLVE_RETRY_SECS: i64 = 5;

/// Callback invoked from [`Connector::run`] for every inbound command.
pub type CommandCallback = Box<dyn FnMut(&CommandMessage) + Send>;

/// Broker endpoint and fabric identity of one connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorOptions {
    pub host: String,
    pub port: u16,
    pub root_topic: String,
    pub nodename: String,
    pub platform_id: String,
    pub class: ClassType,
    pub retain_status: bool,
    /// Used for device publishes and subscribes.
    pub qos: QoS,
}

impl From<&Settings> for ConnectorOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            host: settings.broker.host.clone(),
            port: settings.broker.port,
            root_topic: settings.fabric.root_topic.clone(),
            nodename: settings.fabric.nodename.clone(),
            platform_id: settings.fabric.platform_id.clone(),
            class: settings.fabric.class,
            retain_status: settings.fabric.retain_status,
            qos: QoS::from_level(settings.broker.qos),
        }
    }
}

/// Severity of a debug feed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugLevel {
    Info,
    Warn,
    Error,
}

impl DebugLevel {
    fn feed(self) -> &'static str {
        match self {
            DebugLevel::Info => FEED_DEBUG_INFO,
            DebugLevel::Warn => FEED_DEBUG_WARN,
            DebugLevel::Error => FEED_DEBUG_ERROR,
        }
    }
}

#[derive(Deserialize)]
struct TimeRecord {
    #[serde(rename = "_type")]
    kind: String,
    value: u64,
}

/// One device's presence on the fabric.
///
/// The connector owns the transport, the network handle and the event queue.
/// It is driven by calling [`run`](Self::run) repeatedly; nothing blocks.
/// Transport callbacks only enqueue, so all state changes happen inside
/// `run` and [`close`](Self::close).
pub struct Connector<T: Transport, N: Network> {
    options: ConnectorOptions,
    codec: TopicCodec,
    transport: T,
    network: N,
    queue: EventQueue,
    resolver: ResolveHandle,
    resolve_failed_at: Option<DateTime<Utc>>,
    link: LinkState,
    shutdown: ShutdownPhase,
    address: Option<IpAddr>,
    on_command: Option<CommandCallback>,
    periodic_source: Option<String>,
    source_time: Option<u64>,
    bridge: Option<DeviceBridge>,
    started: DateTime<Utc>,
}

impl<T: Transport, N: Network> Connector<T, N> {
    /// Registers the last will and the inbound sink with `transport`.
    pub fn new(options: ConnectorOptions, mut transport: T, network: N) -> Result<Self, FabricError> {
        let codec = TopicCodec::new(
            options.root_topic.clone(),
            options.nodename.clone(),
            options.platform_id.clone(),
        );
        let queue = EventQueue::new();

        let will = StatusReport::new(
            Presence::Disconnected,
            None,
            codec.nodename(),
            codec.platform_id(),
            options.class,
        )
        .to_json()?;
        transport.set_last_will(LastWill {
            topic: codec.encode(&codec.status_publish())?,
            payload: will.into_bytes(),
            qos: QoS::AtMostOnce,
            retain: options.retain_status,
        });
        transport.attach(InboundSink::new(queue.clone(), codec.clone()));

        Ok(Self {
            options,
            codec,
            transport,
            network,
            queue,
            resolver: ResolveHandle::default(),
            resolve_failed_at: None,
            link: LinkState::NetworkDown,
            shutdown: ShutdownPhase::Running,
            address: None,
            on_command: None,
            periodic_source: None,
            source_time: None,
            bridge: None,
            started: Utc::now(),
        })
    }

    pub fn nodename(&self) -> &str {
        self.codec.nodename()
    }

    pub fn platform_id(&self) -> &str {
        self.codec.platform_id()
    }

    pub fn codec(&self) -> &TopicCodec {
        &self.codec
    }

    pub fn is_connected(&self) -> bool {
        self.link == LinkState::BrokerConnected && self.transport.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::combine(self.link, self.shutdown)
    }

    /// Address the broker session was opened against, once resolved.
    pub fn broker_address(&self) -> Option<IpAddr> {
        self.address
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started).num_seconds()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    /// Another producer for this connector's queue.
    pub fn inbound_sink(&self) -> InboundSink {
        InboundSink::new(self.queue.clone(), self.codec.clone())
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn install_command_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&CommandMessage) + Send + 'static,
    {
        self.on_command = Some(Box::new(callback));
    }

    /// Follow the time feed published by `nodename`. Takes effect on the
    /// next broker connection.
    pub fn enable_periodic_source(&mut self, nodename: impl Into<String>) {
        self.periodic_source = Some(nodename.into());
    }

    /// Latest time received from the periodic source.
    pub fn source_time(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.source_time?).ok()?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Attaches the accessory tree. When already connected the controller
    /// subscription is made and the tree published right away.
    pub fn set_accessories(&mut self, container: Container) -> Result<(), FabricError> {
        self.bridge = Some(DeviceBridge::new(container, self.options.qos));
        if self.is_connected() {
            self.announce_device()?;
        }
        Ok(())
    }

    pub fn device(&self) -> Option<&DeviceBridge> {
        self.bridge.as_ref()
    }

    /// Writes a characteristic and publishes the stored value.
    pub fn set_value(
        &mut self,
        aid: u64,
        iid: u64,
        value: impl Into<Value>,
    ) -> Result<WriteOutcome, FabricError> {
        let bridge = self.bridge.as_mut().ok_or(FabricError::NoDevice)?;
        let mut out = Outbound::new(&self.codec, &mut self.transport, self.shutdown == ShutdownPhase::Running);
        Ok(bridge.set_value(&mut out, aid, iid, value)?)
    }

    pub fn publish_device_state(&mut self) -> Result<Delivery, FabricError> {
        let bridge = self.bridge.as_ref().ok_or(FabricError::NoDevice)?;
        let mut out = Outbound::new(&self.codec, &mut self.transport, self.shutdown == ShutdownPhase::Running);
        Ok(bridge.publish_full_state(&mut out)?)
    }

    pub fn next_device_event(&mut self) -> Option<DeviceEvent> {
        self.bridge.as_mut()?.next_event()
    }

    pub fn command_subscribe(
        &mut self,
        nodename: &str,
        actor_id: &str,
        platform_id: &str,
        feed_id: &str,
        qos: QoS,
    ) -> Result<Delivery, FabricError> {
        let topic = self
            .codec
            .encode(&self.codec.command_subscribe(nodename, actor_id, platform_id, feed_id))?;
        Ok(self.outbound().subscribe(&topic, qos)?)
    }

    pub fn command_publish(
        &mut self,
        actor_id: &str,
        platform_id: &str,
        feed_id: &str,
        data: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, FabricError> {
        let topic = self
            .codec
            .encode(&self.codec.command_publish(actor_id, platform_id, feed_id))?;
        Ok(self.outbound().publish(&topic, data, qos, retain)?)
    }

    pub fn onramp_publish(
        &mut self,
        nodename: &str,
        service_id: &str,
        feed_id: &str,
        data: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Delivery, FabricError> {
        let topic = self
            .codec
            .encode(&self.codec.onramp_publish(nodename, service_id, feed_id))?;
        Ok(self.outbound().publish(&topic, data, qos, retain)?)
    }

    /// Free-form diagnostics on `broadcast/.../dbg/<platform>/debug/<feed>`.
    pub fn debug_publish(&mut self, feed_id: &str, data: &str) -> Result<Delivery, FabricError> {
        let address = self.codec.offramp_publish(
            NODENAME_BROADCAST,
            TASK_DEBUG,
            self.codec.platform_id(),
            SERVICE_DEBUG,
            feed_id,
        );
        let topic = self.codec.encode(&address)?;
        Ok(self
            .outbound()
            .publish(&topic, data.as_bytes(), QoS::AtMostOnce, false)?)
    }

    pub fn debug(&mut self, level: DebugLevel, text: &str) -> Result<Delivery, FabricError> {
        self.debug_publish(level.feed(), text)
    }

    /// One poll step: advance the link state, then dispatch at most one
    /// queued event.
    pub fn run(&mut self) -> RunEvent {
        self.advance_link();

        match self.queue.pop() {
            Some(message) => self.dispatch(message),
            None => RunEvent::Idle,
        }
    }

    /// One shutdown step. Call until it returns `true`.
    ///
    /// The first call while connected publishes the offline status and asks
    /// the transport to disconnect. Later calls wait for the outbound queue to
    /// empty and then for the transport to report the session closed.
    pub fn close(&mut self) -> bool {
        match self.shutdown {
            ShutdownPhase::Running => {
                if !self.is_connected() {
                    info!("closed without a broker session");
                    self.transport.disconnect();
                    self.shutdown = ShutdownPhase::Closed;
                    return true;
                }
                if let Err(e) = self.publish_status(Presence::Offline) {
                    error!(error = %e, "offline status not sent");
                }
                self.transport.disconnect();
                self.shutdown = ShutdownPhase::Draining;
                info!("shutdown requested, draining");
                false
            }
            ShutdownPhase::Draining => {
                let pending = self.transport.pending_outbound();
                if pending == 0 {
                    self.shutdown = ShutdownPhase::AwaitingDisconnect;
                } else {
                    debug!(pending, "waiting for outbound queue");
                }
                false
            }
            ShutdownPhase::AwaitingDisconnect => {
                if self.transport.is_connected() {
                    return false;
                }
                self.shutdown = ShutdownPhase::Closed;
                self.link = LinkState::NetworkDown;
                info!(discarded = self.queue.len(), "connector closed");
                self.queue.clear();
                true
            }
            ShutdownPhase::Closed => true,
        }
    }

    fn outbound(&mut self) -> Outbound<'_> {
        let accepting = self.shutdown == ShutdownPhase::Running;
        Outbound::new(&self.codec, &mut self.transport, accepting)
    }

    fn advance_link(&mut self) {
        if !self.network.is_up() {
            if self.link != LinkState::NetworkDown {
                warn!(state = %self.state(), "network down");
                self.transport.disconnect();
                self.link = LinkState::NetworkDown;
                self.address = None;
            }
            return;
        }

        match self.link {
            LinkState::NetworkDown => {
                info!("network up");
                self.link = LinkState::AwaitingAddress;
                self.request_address();
            }
            LinkState::AwaitingAddress => self.request_address(),
            LinkState::AddressResolving => match self.resolver.take() {
                Some(Ok(address)) => {
                    info!(host = %self.options.host, %address, "broker address resolved");
                    self.address = Some(address);
                    self.link = LinkState::AddressResolved;
                }
                Some(Err(reason)) => self.resolve_failed(&reason),
                None => {}
            },
            LinkState::ResolveFailed if self.resolve_retry_due() => {
                debug!("retrying broker address lookup");
                self.request_address();
            }
            LinkState::AddressResolved if self.shutdown == ShutdownPhase::Running => {
                self.connect_broker();
            }
            _ => {}
        }
    }

    fn request_address(&mut self) {
        self.resolver = ResolveHandle::default();
        let resolution =
            self.network
                .resolve(&self.options.host, self.options.port, self.resolver.clone());
        match resolution {
            Resolution::Ready(address) => {
                debug!(%address, "broker address known");
                self.address = Some(address);
                self.link = LinkState::AddressResolved;
            }
            Resolution::InProgress => self.link = LinkState::AddressResolving,
            Resolution::Failed(reason) => self.resolve_failed(&reason),
        }
    }

    fn resolve_failed(&mut self, reason: &str) {
        warn!(host = %self.options.host, reason, "broker address lookup failed");
        self.link = LinkState::ResolveFailed;
        self.resolve_failed_at = Some(Utc::now());
    }

    fn resolve_retry_due(&self) -> bool {
        self.resolve_failed_at
            .is_none_or(|at| (Utc::now() - at).num_seconds() >= RESOLVE_RETRY_SECS)
    }

    fn connect_broker(&mut self) {
        let Some(address) = self.address else {
            self.link = LinkState::AwaitingAddress;
            return;
        };
        match self.transport.connect(address, self.options.port) {
            Ok(()) => {
                info!(%address, port = self.options.port, "connecting to broker");
                self.link = LinkState::BrokerConnecting;
            }
            Err(e) => warn!(error = %e, "broker connect failed, retrying"),
        }
    }

    fn dispatch(&mut self, message: QueuedMessage) -> RunEvent {
        debug!(kind = message.kind(), "dispatching");
        match message {
            QueuedMessage::Connected {
                session_present,
                code,
            } => {
                // a CONNACK queued before the link was torn down belongs to a dead session
                if self.link != LinkState::BrokerConnecting {
                    debug!(state = %self.state(), "stale connack dropped");
                    return RunEvent::Idle;
                }
                self.on_connected(session_present, code);
                RunEvent::Connected
            }
            QueuedMessage::Disconnected => {
                // after a network drop the link is already back at NetworkDown
                if self.link == LinkState::BrokerConnected {
                    self.link = LinkState::BrokerConnecting;
                }
                warn!("broker session lost");
                RunEvent::Disconnected
            }
            QueuedMessage::Command(command) => {
                match self.on_command.as_mut() {
                    Some(callback) => callback(&command),
                    None => debug!(feed = %command.address.feed_id, "no command callback installed"),
                }
                RunEvent::Idle
            }
            QueuedMessage::FromController(update) => {
                self.on_controller_update(update);
                RunEvent::Idle
            }
            QueuedMessage::ControllerOnline { nodename } => {
                info!(%nodename, "controller online");
                if self.bridge.is_some() {
                    if let Err(e) = self.publish_device_state() {
                        error!(error = %e, "accessory list not sent");
                    }
                }
                RunEvent::Idle
            }
            QueuedMessage::Offramp(offramp) => {
                self.on_periodic_source(offramp);
                RunEvent::Idle
            }
        }
    }

    fn on_connected(&mut self, session_present: bool, code: u8) {
        self.link = LinkState::BrokerConnected;
        info!(session_present, code, "connected to broker");
        if self.shutdown != ShutdownPhase::Running {
            return;
        }

        if let Err(e) = self.publish_status(Presence::Online) {
            error!(error = %e, "online status not sent");
        }
        if let Err(e) = self.subscribe_status() {
            error!(error = %e, "status subscription failed");
        }

        if let Some(source) = self.periodic_source.clone() {
            if let Err(e) = self.subscribe_periodic_source(&source) {
                error!(error = %e, %source, "periodic source subscription failed");
            }
        }
        if self.bridge.is_some() {
            if let Err(e) = self.announce_device() {
                error!(error = %e, "device announcement failed");
            }
        }
    }

    fn subscribe_status(&mut self) -> Result<Delivery, FabricError> {
        let topic = self.codec.encode(&self.codec.status_subscribe())?;
        Ok(self.outbound().subscribe(&topic, QoS::AtMostOnce)?)
    }

    fn subscribe_periodic_source(&mut self, source: &str) -> Result<Delivery, FabricError> {
        let address = self.codec.offramp_subscribe(
            NODENAME_BROADCAST,
            source,
            ANY,
            ANY,
            PLATFORM_CHRONOS,
            SERVICE_ANALOG_OUT,
            FEED_SECONDS,
        );
        let topic = self.codec.encode(&address)?;
        Ok(self.outbound().subscribe(&topic, QoS::AtMostOnce)?)
    }

    /// Controller subscription plus full tree.
    fn announce_device(&mut self) -> Result<(), FabricError> {
        let accepting = self.shutdown == ShutdownPhase::Running;
        let bridge = self.bridge.as_ref().ok_or(FabricError::NoDevice)?;
        let mut out = Outbound::new(&self.codec, &mut self.transport, accepting);
        bridge.subscribe_for_updates(&mut out)?;
        bridge.publish_full_state(&mut out)?;
        Ok(())
    }

    fn on_controller_update(&mut self, update: ControllerUpdate) {
        let accepting = self.shutdown == ShutdownPhase::Running;
        let Some(bridge) = self.bridge.as_mut() else {
            debug!(actor = %update.actor_id, "controller update without accessories");
            return;
        };
        let mut out = Outbound::new(&self.codec, &mut self.transport, accepting);
        match bridge.on_inbound_update(
            &mut out,
            &update.actor_id,
            &update.feed_id,
            update.payload.as_bytes(),
        ) {
            Ok(InboundOutcome::Applied(outcome)) => debug!(?outcome, "controller update handled"),
            Ok(InboundOutcome::Ignored { format }) => debug!(%format, "controller update ignored"),
            Err(e) => warn!(actor = %update.actor_id, feed = %update.feed_id, error = %e, "controller update rejected"),
        }
    }

    fn on_periodic_source(&mut self, offramp: OfframpMessage) {
        let parsed: Result<Envelope<TimeRecord>, _> = serde_json::from_slice(offramp.payload.as_bytes());
        match parsed {
            Ok(Envelope { d: record }) if record.kind == TASK_ANALOG_WRITE => {
                debug!(source = %offramp.address.actor_id, seconds = record.value, "source time");
                self.source_time = Some(record.value);
            }
            Ok(Envelope { d: record }) => {
                debug!(kind = %record.kind, "unexpected record on time feed");
            }
            Err(e) => warn!(error = %e, "unreadable time feed payload"),
        }
    }

    fn publish_status(&mut self, presence: Presence) -> Result<Delivery, FabricError> {
        let uptime = match presence {
            Presence::Disconnected => None,
            Presence::Online | Presence::Offline => Some(self.uptime_secs()),
        };
        let payload = StatusReport::new(
            presence,
            uptime,
            self.codec.nodename(),
            self.codec.platform_id(),
            self.options.class,
        )
        .to_json()?;
        let topic = self.codec.encode(&self.codec.status_publish())?;

        // the offline status goes out while shutdown is already underway
        let mut out = Outbound::new(&self.codec, &mut self.transport, true);
        let delivery = out.publish(&topic, payload.as_bytes(), QoS::AtMostOnce, self.options.retain_status)?;
        debug!(?presence, ?delivery, "status published");
        Ok(delivery)
    }
}
