use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::model::marshal::{accessory_list, parse_value_record, value_record};
use crate::model::{CharacteristicHandle, Container, Format, Perms, Value, WriteOutcome};
use crate::topic::{
    ANY, FEED_ACCESSORY_LIST, NODENAME_BROADCAST, SERVICE_ACCESSORIES, SERVICE_FROM_CONTROLLER,
    SERVICE_TO_CONTROLLER, TASK_SERVICE,
};
use crate::transport::{Delivery, Outbound, QoS};
use crate::utils::error::{BridgeError, ModelError};

use super::event::{DeviceEvent, InboundOutcome};

/// Moves values between the accessory graph and the fabric.
///
/// This is the only place that both mutates the graph and publishes. Every
/// operation that talks to the broker borrows an [`Outbound`] for the call.
#[derive(Debug)]
pub struct DeviceBridge {
    container: Container,
    qos: QoS,
    events: VecDeque<DeviceEvent>,
}

impl DeviceBridge {
    pub fn new(container: Container, qos: QoS) -> Self {
        Self {
            container,
            qos,
            events: VecDeque::new(),
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Publishes the whole accessory tree on
    /// `broadcast/.../svc/<platform>/accessories/list`.
    pub fn publish_full_state(&self, out: &mut Outbound<'_>) -> Result<Delivery, BridgeError> {
        let codec = out.codec();
        let address = codec.offramp_publish(
            NODENAME_BROADCAST,
            TASK_SERVICE,
            codec.platform_id(),
            SERVICE_ACCESSORIES,
            FEED_ACCESSORY_LIST,
        );
        let topic = codec.encode(&address)?;
        let document = accessory_list(&self.container)?;

        let delivery = out.publish(&topic, document.as_bytes(), self.qos, false)?;
        info!(
            accessories = self.container.accessories().len(),
            ?delivery,
            "published accessory list"
        );
        Ok(delivery)
    }

    /// Publishes one value on `broadcast/.../svc/<platform>/to_hk/<format>`.
    pub fn publish_value(
        &self,
        out: &mut Outbound<'_>,
        aid: u64,
        iid: u64,
        value: &Value,
    ) -> Result<Delivery, BridgeError> {
        let codec = out.codec();
        let address = codec.offramp_publish(
            NODENAME_BROADCAST,
            TASK_SERVICE,
            codec.platform_id(),
            SERVICE_TO_CONTROLLER,
            value.format().as_str(),
        );
        let topic = codec.encode(&address)?;
        let record = value_record(aid, iid, value)?;

        let delivery = out.publish(&topic, record.as_bytes(), self.qos, false)?;
        debug!(aid, iid, %value, ?delivery, "published value");
        Ok(delivery)
    }

    /// Subscribes to controller writes addressed to this node.
    pub fn subscribe_for_updates(&self, out: &mut Outbound<'_>) -> Result<Delivery, BridgeError> {
        let codec = out.codec();
        let address = codec.offramp_subscribe(
            codec.nodename(),
            ANY,
            ANY,
            TASK_SERVICE,
            ANY,
            SERVICE_FROM_CONTROLLER,
            ANY,
        );
        let topic = codec.encode(&address)?;
        Ok(out.subscribe(&topic, self.qos)?)
    }

    /// Device-side write. The stored value is published; a candidate refused
    /// by the step rule publishes nothing.
    pub fn set_value(
        &mut self,
        out: &mut Outbound<'_>,
        aid: u64,
        iid: u64,
        value: impl Into<Value>,
    ) -> Result<WriteOutcome, BridgeError> {
        let outcome = self.container.set_value(aid, iid, value)?;
        if let Some(stored) = outcome.stored() {
            self.publish_value(out, aid, iid, stored)?;
        }
        Ok(outcome)
    }

    /// Applies a controller write received on feed `feed_id` (the format
    /// name) and echoes the stored value back.
    pub fn on_inbound_update(
        &mut self,
        out: &mut Outbound<'_>,
        actor_id: &str,
        feed_id: &str,
        payload: &[u8],
    ) -> Result<InboundOutcome, BridgeError> {
        let record = parse_value_record(payload)?;
        if record.kind != feed_id {
            debug!(feed_id, kind = %record.kind, "record type differs from feed, using feed");
        }

        let format: Format = match feed_id.parse() {
            Ok(format) => format,
            Err(_) => {
                warn!(feed_id, "update in unknown format");
                return Err(BridgeError::UnsupportedFormat(feed_id.to_string()));
            }
        };
        let missing = || BridgeError::MissingField("value");
        let value = match format {
            Format::Bool => Value::Bool(record.value.as_bool().ok_or_else(missing)?),
            Format::Float => Value::Float(record.value.as_f64().ok_or_else(missing)?),
            Format::UInt8 => Value::UInt8(saturate_u8(&record.value).ok_or_else(missing)?),
            other => {
                debug!(format = %other, "update format not converted yet");
                return Ok(InboundOutcome::Ignored {
                    format: other.to_string(),
                });
            }
        };

        let handle = CharacteristicHandle {
            aid: record.aid,
            iid: record.iid,
        };
        let characteristic = self.container.characteristic(handle.aid, handle.iid)?;
        if !characteristic.perms().contains(Perms::WRITE) {
            return Err(ModelError::NotWritable {
                aid: handle.aid,
                iid: handle.iid,
            }
            .into());
        }

        let outcome = self.container.set_value(handle.aid, handle.iid, value)?;
        if let Some(stored) = outcome.stored() {
            info!(aid = handle.aid, iid = handle.iid, value = %stored, actor_id, "controller write applied");
            self.events.push_back(DeviceEvent {
                handle,
                value: stored.clone(),
                actor_id: actor_id.to_string(),
            });
            self.publish_value(out, handle.aid, handle.iid, stored)?;
        }
        Ok(InboundOutcome::Applied(outcome))
    }

    /// Oldest controller write not yet seen by the application.
    pub fn next_event(&mut self) -> Option<DeviceEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

/// JSON number to `u8`, saturating at both ends.
fn saturate_u8(value: &serde_json::Value) -> Option<u8> {
    if let Some(n) = value.as_u64() {
        return Some(n.min(u64::from(u8::MAX)) as u8);
    }
    value.as_f64().map(|f| f.clamp(0.0, f64::from(u8::MAX)).round() as u8)
}
