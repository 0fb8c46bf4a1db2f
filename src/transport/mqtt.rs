//! Broker session over `rumqttc`.
//!
//! The event loop runs as a task on the tokio runtime. It only translates
//! packets into sink calls and keeps the connected flag and the outbound
//! counter current; all protocol decisions stay with the connector.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connector::InboundSink;
use crate::utils::error::TransportError;

use super::{LastWill, QoS, Transport};

const RETRY_DELAY: Duration = Duration::from_secs(2);
const MIN_KEEPALIVE: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Session {
    connected: AtomicBool,
    closing: AtomicBool,
    pending: AtomicUsize,
}

impl Session {
    fn settle(&self) {
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

pub struct MqttTransport {
    runtime: Handle,
    client_id: String,
    keepalive: Duration,
    capacity: usize,
    will: Option<LastWill>,
    sink: Option<InboundSink>,
    client: Option<AsyncClient>,
    session: Arc<Session>,
    pump: Option<JoinHandle<()>>,
}

impl MqttTransport {
    pub fn new(runtime: Handle, client_id: impl Into<String>, keepalive_secs: u64, capacity: usize) -> Self {
        Self {
            runtime,
            client_id: client_id.into(),
            keepalive: Duration::from_secs(keepalive_secs).max(MIN_KEEPALIVE),
            capacity: capacity.max(1),
            will: None,
            sink: None,
            client: None,
            session: Arc::new(Session::default()),
            pump: None,
        }
    }

    /// Stops the event loop without telling the broker.
    fn teardown(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.client = None;
        self.session.connected.store(false, Ordering::SeqCst);
        self.session.pending.store(0, Ordering::SeqCst);
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

fn to_rumqttc(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

impl Transport for MqttTransport {
    fn attach(&mut self, sink: InboundSink) {
        self.sink = Some(sink);
    }

    fn set_last_will(&mut self, will: LastWill) {
        self.will = Some(will);
    }

    fn connect(&mut self, address: IpAddr, port: u16) -> Result<(), TransportError> {
        let sink = self
            .sink
            .clone()
            .ok_or_else(|| TransportError::Rejected("no inbound sink attached".to_string()))?;
        self.teardown();

        let mut options = MqttOptions::new(self.client_id.clone(), address.to_string(), port);
        options.set_keep_alive(self.keepalive);
        if let Some(will) = &self.will {
            options.set_last_will(rumqttc::LastWill::new(
                will.topic.clone(),
                will.payload.clone(),
                to_rumqttc(will.qos),
                will.retain,
            ));
        }

        let (client, eventloop) = AsyncClient::new(options, self.capacity);
        let session = Arc::new(Session::default());
        self.pump = Some(self.runtime.spawn(pump(eventloop, sink, Arc::clone(&session))));
        self.client = Some(client);
        self.session = session;

        info!(%address, port, client_id = %self.client_id, "broker session started");
        Ok(())
    }

    fn disconnect(&mut self) {
        let graceful = self.session.connected.load(Ordering::SeqCst);
        match &self.client {
            Some(client) if graceful => {
                self.session.closing.store(true, Ordering::SeqCst);
                if let Err(e) = client.try_disconnect() {
                    warn!(error = %e, "graceful disconnect failed, dropping session");
                    self.teardown();
                }
            }
            _ => self.teardown(),
        }
    }

    fn is_connected(&self) -> bool {
        self.session.connected.load(Ordering::SeqCst)
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        let client = self.client.as_ref().ok_or(TransportError::NotConnected)?;
        client
            .try_publish(topic, to_rumqttc(qos), retain, payload.to_vec())
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        self.session.pending.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        let client = self.client.as_ref().ok_or(TransportError::NotConnected)?;
        client
            .try_subscribe(topic, to_rumqttc(qos))
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        self.session.pending.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pending_outbound(&self) -> usize {
        self.session.pending.load(Ordering::SeqCst)
    }
}

async fn pump(mut eventloop: EventLoop, sink: InboundSink, session: Arc<Session>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                session.connected.store(true, Ordering::SeqCst);
                sink.on_connected(ack.session_present, ack.code as u8);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                sink.on_message(
                    &publish.topic,
                    &publish.payload,
                    publish.qos as u8,
                    publish.retain,
                    publish.dup,
                );
            }
            Ok(Event::Outgoing(Outgoing::Publish(_) | Outgoing::Subscribe(_))) => session.settle(),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                if session.connected.swap(false, Ordering::SeqCst) {
                    sink.on_disconnected();
                }
                debug!("disconnect written, event loop finished");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                if session.connected.swap(false, Ordering::SeqCst) {
                    sink.on_disconnected();
                }
                if session.closing.load(Ordering::SeqCst) {
                    return;
                }
                warn!(error = %e, "broker connection error, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}
