use tracing::{debug, trace, warn};

use crate::topic::{
    FEED_SECONDS, FabricAddress, PLATFORM_CHRONOS, SERVICE_ANALOG_OUT,
    SERVICE_FROM_CONTROLLER, TASK_SERVICE, TopicCodec,
};

use super::message::{CommandMessage, ControllerUpdate, OfframpMessage, Payload, QueuedMessage};
use super::queue::EventQueue;
use super::status::RemoteStatus;

/// Receives transport callbacks and turns them into queued events.
///
/// May be called from any thread. It never touches connector state; it only
/// classifies and enqueues.
#[derive(Debug, Clone)]
pub struct InboundSink {
    queue: EventQueue,
    codec: TopicCodec,
}

impl InboundSink {
    pub fn new(queue: EventQueue, codec: TopicCodec) -> Self {
        Self { queue, codec }
    }

    pub fn on_connected(&self, session_present: bool, code: u8) {
        self.queue.push(QueuedMessage::Connected {
            session_present,
            code,
        });
    }

    pub fn on_disconnected(&self) {
        self.queue.push(QueuedMessage::Disconnected);
    }

    /// Only the topic and payload are consulted.
    pub fn on_message(&self, topic: &str, payload: &[u8], qos: u8, retained: bool, dup: bool) {
        trace!(topic, qos, retained, dup, len = payload.len(), "inbound publish");
        if let Some(message) = self.classify(topic, payload) {
            self.queue.push(message);
        }
    }

    /// Maps an inbound publish to the event it should raise, if any.
    pub fn classify(&self, topic: &str, payload: &[u8]) -> Option<QueuedMessage> {
        let address = match self.codec.decode(topic) {
            Ok(address) => address,
            Err(e) if e.is_foreign() => {
                debug!(topic, "ignoring topic outside our root");
                return None;
            }
            Err(e) => {
                warn!(topic, error = %e, "dropping malformed fabric topic");
                return None;
            }
        };

        let own = self.codec.nodename();
        match address {
            FabricAddress::Status(status) => {
                if status.nodename == own {
                    return None;
                }
                match RemoteStatus::parse(payload) {
                    Ok(remote) if remote.is_controller_online() => {
                        Some(QueuedMessage::ControllerOnline {
                            nodename: status.nodename,
                        })
                    }
                    Ok(_) => None,
                    Err(e) => {
                        debug!(topic, error = %e, "unreadable status payload");
                        None
                    }
                }
            }
            FabricAddress::Command(command) => {
                if command.nodename == own {
                    debug!(topic, "ignoring our own command");
                    return None;
                }
                Some(QueuedMessage::Command(CommandMessage {
                    address: command,
                    payload: Payload::from(payload),
                }))
            }
            FabricAddress::Offramp(offramp) => {
                if offramp.actor_id == own {
                    debug!(topic, "ignoring our own offramp");
                    return None;
                }
                if offramp.nodename == own
                    && offramp.task_id == TASK_SERVICE
                    && offramp.service_id == SERVICE_FROM_CONTROLLER
                {
                    return Some(QueuedMessage::FromController(ControllerUpdate {
                        actor_id: offramp.actor_id,
                        feed_id: offramp.feed_id,
                        payload: Payload::from(payload),
                    }));
                }
                if offramp.platform_id == PLATFORM_CHRONOS
                    && offramp.service_id == SERVICE_ANALOG_OUT
                    && offramp.feed_id == FEED_SECONDS
                {
                    return Some(QueuedMessage::Offramp(OfframpMessage {
                        address: offramp,
                        payload: Payload::from(payload),
                    }));
                }
                debug!(topic, "offramp not for us");
                None
            }
            FabricAddress::Onramp(_) => {
                debug!(topic, "onramp feeds are not consumed");
                None
            }
        }
    }
}
