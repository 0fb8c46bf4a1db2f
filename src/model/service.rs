use serde::Serialize;

use super::characteristic::Characteristic;

/// An ordered group of characteristics. Ids are handed out when the service
/// is attached to an accessory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    iid: u64,
    #[serde(rename = "type")]
    kind: String,
    characteristics: Vec<Characteristic>,
}

impl Service {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            iid: 0,
            kind: kind.into(),
            characteristics: Vec::new(),
        }
    }

    pub fn with_characteristic(mut self, characteristic: Characteristic) -> Self {
        self.characteristics.push(characteristic);
        self
    }

    pub fn add_characteristic(&mut self, characteristic: Characteristic) {
        self.characteristics.push(characteristic);
    }

    pub fn iid(&self) -> u64 {
        self.iid
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    pub(crate) fn characteristics_mut(&mut self) -> &mut [Characteristic] {
        &mut self.characteristics
    }

    /// Numbers the service, then its characteristics, starting at `next`.
    /// Returns the next free id.
    pub(crate) fn assign_ids(&mut self, next: u64) -> u64 {
        self.iid = next;
        let mut next = next + 1;
        for characteristic in &mut self.characteristics {
            characteristic.assign_iid(next);
            next += 1;
        }
        next
    }
}
