//! Presence heartbeats.
//!
//! ```text
//! {"d":{"_type":"status","status":"online","uptime":42,"nodename":"node1",
//!       "platform_id":"esp","class":"device_svc"}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::marshal::Envelope;

const STATUS_TYPE: &str = "status";

/// Role a node plays on the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    Device,
    Controller,
    #[default]
    DeviceSvc,
    ControllerSvc,
}

impl ClassType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassType::Device => "device",
            ClassType::Controller => "controller",
            ClassType::DeviceSvc => "device_svc",
            ClassType::ControllerSvc => "controller_svc",
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
    /// Sent by the broker as our last will.
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    pub status: Presence,
    pub uptime: Option<i64>,
    pub nodename: &'a str,
    pub platform_id: &'a str,
    pub class: ClassType,
}

impl<'a> StatusReport<'a> {
    pub fn new(
        status: Presence,
        uptime: Option<i64>,
        nodename: &'a str,
        platform_id: &'a str,
        class: ClassType,
    ) -> Self {
        Self {
            kind: STATUS_TYPE,
            status,
            uptime,
            nodename,
            platform_id,
            class,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Envelope { d: self })
    }
}

/// A heartbeat received from another node. Unknown fields and values are
/// tolerated so one odd peer cannot break parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteStatus {
    pub status: String,
    pub nodename: String,
    pub class: String,
}

impl RemoteStatus {
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: Envelope<RemoteStatus> = serde_json::from_slice(payload)?;
        Ok(envelope.d)
    }

    /// An online controller service, which expects our full accessory tree.
    pub fn is_controller_online(&self) -> bool {
        self.status == "online" && self.class == ClassType::ControllerSvc.as_str()
    }
}
