use crate::model::{CharacteristicHandle, Value, WriteOutcome};

/// A characteristic changed because the controller wrote to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub handle: CharacteristicHandle,
    /// The value as stored, after clamping.
    pub value: Value,
    /// Nodename of the controller that sent the write.
    pub actor_id: String,
}

/// Result of handling one controller update.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundOutcome {
    Applied(WriteOutcome),
    /// The feed names a format this bridge does not convert yet.
    Ignored { format: String },
}
