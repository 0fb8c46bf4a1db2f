//! Fabric topic addressing.
//!
//! Every fabric topic is a `/`-joined list of positional segments that starts
//! with the configured root and the addressed nodename:
//!
//! ```text
//! root/nodename/$commands/$clients/actorId/platformId/feedId
//! root/nodename/$feeds/$offramp/actorId/actorPlatformId/taskId/platformId/serviceId/feedId
//! root/nodename/$feeds/$onramp/platformId/serviceId/feedId
//! ```
//!
//! A status heartbeat is a command addressed from the `sysctl` actor on the
//! `status` feed. Segment values never contain `/`; there is no escaping.

pub mod address;
pub mod codec;

pub use address::{CommandAddress, FabricAddress, OfframpAddress, OnrampAddress, StatusAddress};
pub use codec::TopicCodec;

/// Single-level wildcard.
pub const ANY: &str = "+";

pub const DOMAIN_FEEDS: &str = "$feeds";
pub const DOMAIN_COMMANDS: &str = "$commands";
pub const ROUTE_OFFRAMP: &str = "$offramp";
pub const ROUTE_ONRAMP: &str = "$onramp";
pub const ROUTE_CLIENTS: &str = "$clients";

pub const ACTOR_SYSCTL: &str = "sysctl";
pub const ACTOR_UPGRADER: &str = "firmware";
pub const FEED_STATUS: &str = "status";
pub const NODENAME_BROADCAST: &str = "broadcast";

pub const TASK_SERVICE: &str = "svc";
pub const TASK_DEBUG: &str = "dbg";
pub const TASK_ANALOG_WRITE: &str = "analog_write";

pub const SERVICE_RPC_SERVER: &str = "rpc_server";
pub const SERVICE_RPC_CLIENT: &str = "rpc_client";
pub const SERVICE_FROM_CONTROLLER: &str = "from_hk";
pub const SERVICE_TO_CONTROLLER: &str = "to_hk";
pub const SERVICE_ACCESSORIES: &str = "accessories";
pub const SERVICE_DEBUG: &str = "debug";
pub const SERVICE_ANALOG_OUT: &str = "analog_out";
pub const SERVICE_CHRONOS: &str = "chronos";

pub const PLATFORM_CHRONOS: &str = "time";

pub const FEED_SECONDS: &str = "seconds";
pub const FEED_ACCESSORY_LIST: &str = "list";
pub const FEED_DEBUG_INFO: &str = "info";
pub const FEED_DEBUG_WARN: &str = "warn";
pub const FEED_DEBUG_ERROR: &str = "err";

#[cfg(test)]
mod tests;
