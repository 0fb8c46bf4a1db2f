use crate::utils::error::ModelError;

use super::accessory::{Accessory, AccessoryInfo};
use super::characteristic::{Characteristic, WriteOutcome};
use super::value::Value;

/// Root of the accessory tree for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    nodename: String,
    info: AccessoryInfo,
    accessories: Vec<Accessory>,
    next_aid: u64,
}

impl Container {
    pub fn new(nodename: impl Into<String>, info: AccessoryInfo) -> Self {
        Self {
            nodename: nodename.into(),
            info,
            accessories: Vec::new(),
            next_aid: 1,
        }
    }

    pub fn nodename(&self) -> &str {
        &self.nodename
    }

    pub fn info(&self) -> &AccessoryInfo {
        &self.info
    }

    pub fn accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    /// Takes ownership of a fully built accessory and returns its id.
    pub fn add_accessory(&mut self, mut accessory: Accessory) -> u64 {
        let aid = self.next_aid;
        self.next_aid += 1;
        accessory.assign_aid(aid);
        self.accessories.push(accessory);
        aid
    }

    pub fn accessory(&self, aid: u64) -> Option<&Accessory> {
        self.accessories.iter().find(|a| a.aid() == aid)
    }

    pub fn accessory_mut(&mut self, aid: u64) -> Option<&mut Accessory> {
        self.accessories.iter_mut().find(|a| a.aid() == aid)
    }

    pub fn characteristic(&self, aid: u64, iid: u64) -> Result<&Characteristic, ModelError> {
        self.accessory(aid)
            .ok_or(ModelError::AccessoryNotFound { aid })?
            .find_characteristic(iid)
            .ok_or(ModelError::CharacteristicNotFound { aid, iid })
    }

    pub fn characteristic_mut(
        &mut self,
        aid: u64,
        iid: u64,
    ) -> Result<&mut Characteristic, ModelError> {
        self.accessory_mut(aid)
            .ok_or(ModelError::AccessoryNotFound { aid })?
            .find_characteristic_mut(iid)
            .ok_or(ModelError::CharacteristicNotFound { aid, iid })
    }

    /// Writes the model only; nothing is published.
    pub fn set_value(
        &mut self,
        aid: u64,
        iid: u64,
        value: impl Into<Value>,
    ) -> Result<WriteOutcome, ModelError> {
        self.characteristic_mut(aid, iid)?.set_value(value)
    }
}
