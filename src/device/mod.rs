//! The `device` module binds an accessory [`Container`](crate::model::Container)
//! to the fabric.
//!
//! [`DeviceBridge`] publishes the accessory tree and individual values,
//! subscribes to controller writes and applies them to the graph. Applied
//! writes are queued as [`DeviceEvent`]s for the application.

pub mod bridge;
pub mod event;

pub use bridge::DeviceBridge;
pub use event::{DeviceEvent, InboundOutcome};
