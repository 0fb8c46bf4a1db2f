//! Accessory model.
//!
//! A [`Container`] owns a list of [`Accessory`] values, each accessory owns its
//! [`Service`] list and each service owns its [`Characteristic`] list. Parents are
//! never pointed at directly; attached characteristics remember the
//! `(aid, iid)` pair that addresses them instead.
//!
//! - `value`: formats, values, permissions and units.
//! - `characteristic`: a single typed value with bounds and the write policy.
//! - `service`, `accessory`, `container`: the tree and id assignment.
//! - `catalog`: predefined characteristics, services and accessories.
//! - `marshal`: the JSON documents exchanged with the controller.

pub mod accessory;
pub mod catalog;
pub mod characteristic;
pub mod container;
pub mod marshal;
pub mod service;
pub mod value;

pub use accessory::{Accessory, AccessoryInfo, Category};
pub use characteristic::{Characteristic, CharacteristicHandle, WriteOutcome};
pub use container::Container;
pub use service::Service;
pub use value::{Format, Perms, Unit, Value};

#[cfg(test)]
mod tests;
