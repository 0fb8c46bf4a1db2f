//! # fabric-bridge
//!
//! `fabric-bridge` connects a device's accessory model to an MQTT broker
//! using the fabric topic protocol. Broker topics are decoded into typed
//! events, queued, and dispatched from a cooperative poll loop; changes to
//! the accessory model are validated, marshalled to JSON and published back.
//!
//! ## Core Modules
//!
//! - `topic`: encodes and decodes the positional fabric topics.
//! - `model`: characteristics, services, accessories and their JSON form.
//! - `connector`: the event queue, the connection lifecycle and dispatch.
//! - `device`: the bridge between the accessory model and the fabric.
//! - `transport`: the broker session and host network behind traits.
//! - `config`: layered configuration loading.
//! - `utils`: error types and logging setup.

pub mod config;
pub mod connector;
pub mod device;
pub mod model;
pub mod topic;
pub mod transport;
pub mod utils;

pub use connector::{Connector, ConnectorOptions, RunEvent};
pub use utils::error::FabricError;
