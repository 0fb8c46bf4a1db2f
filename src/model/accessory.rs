use serde::Serialize;

use super::catalog;
use super::characteristic::Characteristic;
use super::service::Service;

/// Accessory category as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Category(pub u32);

impl Category {
    pub const OTHER: Category = Category(1);
    pub const BRIDGE: Category = Category(2);
    pub const FAN: Category = Category(3);
    pub const GARAGE_DOOR_OPENER: Category = Category(4);
    pub const LIGHTBULB: Category = Category(5);
    pub const DOOR_LOCK: Category = Category(6);
    pub const OUTLET: Category = Category(7);
    pub const SWITCH: Category = Category(8);
    pub const THERMOSTAT: Category = Category(9);
    pub const SENSOR: Category = Category(10);
    pub const ALARM_SYSTEM: Category = Category(11);
    pub const DOOR: Category = Category(12);
    pub const WINDOW: Category = Category(13);
    pub const WINDOW_COVERING: Category = Category(14);
    pub const PROGRAMMABLE_SWITCH: Category = Category(15);
    pub const RANGE_EXTENDER: Category = Category(16);
}

/// Identity strings carried by the accessory information service and by the
/// container record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    pub name: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub model: String,
}

impl AccessoryInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = serial_number.into();
        self
    }

    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for AccessoryInfo {
    fn default() -> Self {
        Self {
            name: "undefined".to_string(),
            serial_number: "undefined".to_string(),
            manufacturer: "undefined".to_string(),
            model: "undefined".to_string(),
        }
    }
}

/// A device exposed to the controller.
///
/// Services and characteristics share one id space per accessory: attaching a
/// service numbers the service first and then each of its characteristics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accessory {
    aid: u64,
    #[serde(rename = "type")]
    category: Category,
    services: Vec<Service>,
    #[serde(skip)]
    next_iid: u64,
}

impl Accessory {
    /// Accessory with the information service already attached as service 1.
    pub fn new(info: &AccessoryInfo, category: Category) -> Self {
        Self::bare(category).with_service(catalog::accessory_information_service(info))
    }

    /// Accessory without any service.
    pub fn bare(category: Category) -> Self {
        Self {
            aid: 0,
            category,
            services: Vec::new(),
            next_iid: 1,
        }
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.add_service(service);
        self
    }

    /// Attaches `service` and returns its id.
    pub fn add_service(&mut self, mut service: Service) -> u64 {
        let iid = self.next_iid;
        self.next_iid = service.assign_ids(iid);
        if self.aid != 0 {
            for characteristic in service.characteristics_mut() {
                characteristic.assign_aid(self.aid);
            }
        }
        self.services.push(service);
        iid
    }

    pub fn aid(&self) -> u64 {
        self.aid
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// The id the next attached service will receive.
    pub fn next_iid(&self) -> u64 {
        self.next_iid
    }

    pub fn find_characteristic(&self, iid: u64) -> Option<&Characteristic> {
        self.services
            .iter()
            .flat_map(|s| s.characteristics())
            .find(|c| c.iid() == iid)
    }

    pub fn find_characteristic_mut(&mut self, iid: u64) -> Option<&mut Characteristic> {
        self.services
            .iter_mut()
            .flat_map(|s| s.characteristics_mut())
            .find(|c| c.iid() == iid)
    }

    pub(crate) fn assign_aid(&mut self, aid: u64) {
        self.aid = aid;
        for service in &mut self.services {
            for characteristic in service.characteristics_mut() {
                characteristic.assign_aid(aid);
            }
        }
    }
}
