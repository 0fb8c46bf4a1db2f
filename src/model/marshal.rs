//! JSON documents exchanged with the controller.
//!
//! Every document is a single object wrapping a `d` object:
//!
//! ```text
//! {"d":{"_type":"accessories_list","nodename":..,"name":..,"model":..,
//!       "serialnumber":..,"manufacturer":..,"value":{"accessories":[..]}}}
//! {"d":{"_type":"bool","aid":2,"iid":6,"value":true}}
//! ```

use serde::{Deserialize, Serialize};

use super::accessory::Accessory;
use super::container::Container;
use super::value::{Format, Value};

/// The `{"d": ...}` wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub d: T,
}

#[derive(Serialize)]
struct AccessoryList<'a> {
    #[serde(rename = "_type")]
    kind: &'static str,
    nodename: &'a str,
    name: &'a str,
    model: &'a str,
    serialnumber: &'a str,
    manufacturer: &'a str,
    value: AccessoryTree<'a>,
}

#[derive(Serialize)]
struct AccessoryTree<'a> {
    accessories: &'a [Accessory],
}

#[derive(Serialize)]
struct ValueRecord<'a> {
    #[serde(rename = "_type")]
    format: Format,
    aid: u64,
    iid: u64,
    value: &'a Value,
}

/// A value update received from the controller. `value` is kept raw until
/// the format is known.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundValue {
    #[serde(rename = "_type")]
    pub kind: String,
    pub aid: u64,
    pub iid: u64,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Full accessory tree of `container`.
pub fn accessory_list(container: &Container) -> Result<String, serde_json::Error> {
    let info = container.info();
    serde_json::to_string(&Envelope {
        d: AccessoryList {
            kind: "accessories_list",
            nodename: container.nodename(),
            name: &info.name,
            model: &info.model,
            serialnumber: &info.serial_number,
            manufacturer: &info.manufacturer,
            value: AccessoryTree {
                accessories: container.accessories(),
            },
        },
    })
}

/// Single value update, typed by the value's own format.
pub fn value_record(aid: u64, iid: u64, value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope {
        d: ValueRecord {
            format: value.format(),
            aid,
            iid,
            value,
        },
    })
}

pub fn parse_value_record(payload: &[u8]) -> Result<InboundValue, serde_json::Error> {
    let envelope: Envelope<InboundValue> = serde_json::from_slice(payload)?;
    Ok(envelope.d)
}
