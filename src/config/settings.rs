use serde::Deserialize;

use crate::connector::ClassType;

/// Top-level configuration settings for the bridge.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub fabric: FabricSettings,
    pub device: DeviceSettings,
    pub runtime: RuntimeSettings,
}

/// Where the broker lives and how we talk to it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keepalive_secs: u64,
    /// QoS level for device publishes and subscribes.
    pub qos: u8,
    /// Requests the transport buffers before refusing more.
    pub request_capacity: usize,
}

/// Our identity on the fabric.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FabricSettings {
    pub root_topic: String,
    pub nodename: String,
    pub platform_id: String,
    pub class: ClassType,
    pub retain_status: bool,
}

/// Identity strings of the accessory tree.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DeviceSettings {
    pub name: String,
    pub serial_number: String,
    pub manufacturer: String,
    pub model: String,
    /// Nodename of the time feed to follow, if any.
    pub periodic_source: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub poll_interval_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub log_level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from [`Settings::default`].
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub fabric: Option<PartialFabricSettings>,
    pub device: Option<PartialDeviceSettings>,
    pub runtime: Option<PartialRuntimeSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub client_id: Option<String>,
    pub keepalive_secs: Option<u64>,
    pub qos: Option<u8>,
    pub request_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialFabricSettings {
    pub root_topic: Option<String>,
    pub nodename: Option<String>,
    pub platform_id: Option<String>,
    pub class: Option<ClassType>,
    pub retain_status: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDeviceSettings {
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub periodic_source: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialRuntimeSettings {
    pub poll_interval_ms: Option<u64>,
    pub shutdown_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

/// Broker client id used when none is configured.
pub fn generated_client_id() -> String {
    format!("fabric-{}", uuid::Uuid::new_v4())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                host: "127.0.0.1".to_string(),
                port: 1883,
                client_id: generated_client_id(),
                keepalive_secs: 30,
                qos: 0,
                request_capacity: 64,
            },
            fabric: FabricSettings {
                root_topic: "fabric".to_string(),
                nodename: "node".to_string(),
                platform_id: "rust".to_string(),
                class: ClassType::DeviceSvc,
                retain_status: true,
            },
            device: DeviceSettings {
                name: "undefined".to_string(),
                serial_number: "undefined".to_string(),
                manufacturer: "undefined".to_string(),
                model: "undefined".to_string(),
                periodic_source: None,
            },
            runtime: RuntimeSettings {
                poll_interval_ms: 10,
                shutdown_timeout_ms: 5000,
                log_level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Overlays the values that were provided onto `default`.
    pub fn merge(self, default: Settings) -> Settings {
        let broker = self.broker.unwrap_or_default();
        let fabric = self.fabric.unwrap_or_default();
        let device = self.device.unwrap_or_default();
        let runtime = self.runtime.unwrap_or_default();

        Settings {
            broker: BrokerSettings {
                host: broker.host.unwrap_or(default.broker.host),
                port: broker.port.unwrap_or(default.broker.port),
                client_id: broker.client_id.unwrap_or(default.broker.client_id),
                keepalive_secs: broker.keepalive_secs.unwrap_or(default.broker.keepalive_secs),
                qos: broker.qos.unwrap_or(default.broker.qos),
                request_capacity: broker
                    .request_capacity
                    .unwrap_or(default.broker.request_capacity),
            },
            fabric: FabricSettings {
                root_topic: fabric.root_topic.unwrap_or(default.fabric.root_topic),
                nodename: fabric.nodename.unwrap_or(default.fabric.nodename),
                platform_id: fabric.platform_id.unwrap_or(default.fabric.platform_id),
                class: fabric.class.unwrap_or(default.fabric.class),
                retain_status: fabric.retain_status.unwrap_or(default.fabric.retain_status),
            },
            device: DeviceSettings {
                name: device.name.unwrap_or(default.device.name),
                serial_number: device.serial_number.unwrap_or(default.device.serial_number),
                manufacturer: device.manufacturer.unwrap_or(default.device.manufacturer),
                model: device.model.unwrap_or(default.device.model),
                periodic_source: device.periodic_source.or(default.device.periodic_source),
            },
            runtime: RuntimeSettings {
                poll_interval_ms: runtime
                    .poll_interval_ms
                    .unwrap_or(default.runtime.poll_interval_ms),
                shutdown_timeout_ms: runtime
                    .shutdown_timeout_ms
                    .unwrap_or(default.runtime.shutdown_timeout_ms),
                log_level: runtime.log_level.unwrap_or(default.runtime.log_level),
            },
        }
    }
}
