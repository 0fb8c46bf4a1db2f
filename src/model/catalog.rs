//! Predefined characteristics, services and accessories.
//!
//! Type codes are the short hexadecimal identifiers used by HomeKit-style
//! controllers. Constructors that take caller-provided bounds return a
//! `Result` because bounds are validated against the characteristic format.

use crate::utils::error::ModelError;

use super::accessory::{Accessory, AccessoryInfo, Category};
use super::characteristic::Characteristic;
use super::service::Service;
use super::value::{Format, Perms, Unit};

pub mod types {
    pub const IDENTIFY: &str = "14";
    pub const MANUFACTURER: &str = "20";
    pub const MODEL: &str = "21";
    pub const NAME: &str = "23";
    pub const SERIAL_NUMBER: &str = "30";
    pub const ON: &str = "25";
    pub const OUTLET_IN_USE: &str = "26";
    pub const CURRENT_TEMPERATURE: &str = "11";
    pub const CURRENT_RELATIVE_HUMIDITY: &str = "10";
    pub const TARGET_TEMPERATURE: &str = "35";
    pub const CURRENT_HEATING_COOLING_STATE: &str = "F";
    pub const TARGET_HEATING_COOLING_STATE: &str = "33";
    pub const TEMPERATURE_DISPLAY_UNITS: &str = "36";
    pub const VERSION: &str = "37";
    pub const PROGRAMMABLE_SWITCH_EVENT: &str = "73";
    pub const PROGRAMMABLE_SWITCH_OUTPUT_STATE: &str = "74";
}

pub mod service_types {
    pub const ACCESSORY_INFORMATION: &str = "3E";
    pub const HUMIDITY_SENSOR: &str = "82";
    pub const OUTLET: &str = "47";
    pub const STATEFUL_PROGRAMMABLE_SWITCH: &str = "88";
    pub const STATELESS_PROGRAMMABLE_SWITCH: &str = "89";
    pub const TEMPERATURE_SENSOR: &str = "8A";
    pub const THERMOSTAT: &str = "4A";
    pub const TEXT: &str = "702401";
}

/// Category of the text accessory.
pub const TEXT_CATEGORY: Category = Category(702401);

pub mod heating_cooling {
    pub const OFF: u8 = 0;
    pub const HEAT: u8 = 1;
    pub const COOL: u8 = 2;
    /// Target state only.
    pub const AUTO: u8 = 3;
}

// characteristics

pub fn identify() -> Characteristic {
    Characteristic::new(types::IDENTIFY, Format::Bool, Perms::WRITE_ONLY)
}

fn read_only_string(kind: &str) -> Characteristic {
    Characteristic::new(kind, Format::String, Perms::READ_ONLY)
}

pub fn manufacturer() -> Characteristic {
    read_only_string(types::MANUFACTURER)
}

pub fn model() -> Characteristic {
    read_only_string(types::MODEL)
}

pub fn name() -> Characteristic {
    read_only_string(types::NAME)
}

pub fn serial_number() -> Characteristic {
    read_only_string(types::SERIAL_NUMBER)
}

pub fn on() -> Characteristic {
    Characteristic::boolean(types::ON, Perms::ALL, false)
}

pub fn outlet_in_use() -> Characteristic {
    Characteristic::boolean(types::OUTLET_IN_USE, Perms::READ_EVENTS, true)
}

pub fn current_temperature() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::CURRENT_TEMPERATURE, Format::Float, Perms::READ_EVENTS)
        .with_unit(Unit::Celsius)
        .with_range(0.0, 100.0, 0.1)?
        .with_value(0.0)
}

pub fn current_relative_humidity() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::CURRENT_RELATIVE_HUMIDITY, Format::Float, Perms::READ_EVENTS)
        .with_unit(Unit::Percentage)
        .with_range(0.0, 100.0, 1.0)?
        .with_value(0.0)
}

pub fn target_temperature() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::TARGET_TEMPERATURE, Format::Float, Perms::ALL)
        .with_unit(Unit::Celsius)
        .with_range(5.0, 30.0, 1.0)?
        .with_value(0.0)
}

pub fn current_heating_cooling_state() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::CURRENT_HEATING_COOLING_STATE, Format::UInt8, Perms::READ_EVENTS)
        .with_value(heating_cooling::OFF)
}

pub fn target_heating_cooling_state() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::TARGET_HEATING_COOLING_STATE, Format::UInt8, Perms::ALL)
        .with_range(heating_cooling::OFF, heating_cooling::AUTO, 1u8)?
        .with_value(heating_cooling::OFF)
}

pub fn temperature_display_units() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::TEMPERATURE_DISPLAY_UNITS, Format::UInt8, Perms::ALL)
        .with_value(0u8)
}

pub fn version() -> Characteristic {
    Characteristic::new(types::VERSION, Format::String, Perms::READ_EVENTS)
}

pub fn programmable_switch_event() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::PROGRAMMABLE_SWITCH_EVENT, Format::UInt8, Perms::READ_EVENTS)
        .with_value(0u8)
}

pub fn programmable_switch_output_state() -> Result<Characteristic, ModelError> {
    Characteristic::new(types::PROGRAMMABLE_SWITCH_OUTPUT_STATE, Format::UInt8, Perms::ALL)
        .with_value(0u8)
}

// services

/// Identify, manufacturer, model, name and serial number, in that order.
pub fn accessory_information_service(info: &AccessoryInfo) -> Service {
    let mut service = Service::new(service_types::ACCESSORY_INFORMATION).with_characteristic(identify());

    let strings = [
        (manufacturer(), &info.manufacturer),
        (model(), &info.model),
        (name(), &info.name),
        (serial_number(), &info.serial_number),
    ];
    for (mut characteristic, text) in strings {
        // empty identity strings stay unset
        let _ = characteristic.reset_value(text.as_str());
        service.add_characteristic(characteristic);
    }

    service
}

pub fn outlet_service() -> Service {
    Service::new(service_types::OUTLET)
        .with_characteristic(on())
        .with_characteristic(outlet_in_use())
}

pub fn temperature_sensor_service() -> Result<Service, ModelError> {
    Ok(Service::new(service_types::TEMPERATURE_SENSOR).with_characteristic(current_temperature()?))
}

pub fn humidity_sensor_service() -> Result<Service, ModelError> {
    Ok(Service::new(service_types::HUMIDITY_SENSOR)
        .with_characteristic(current_relative_humidity()?))
}

pub fn thermostat_service() -> Result<Service, ModelError> {
    Ok(Service::new(service_types::THERMOSTAT)
        .with_characteristic(current_heating_cooling_state()?)
        .with_characteristic(target_heating_cooling_state()?)
        .with_characteristic(current_temperature()?)
        .with_characteristic(target_temperature()?)
        .with_characteristic(temperature_display_units()?))
}

pub fn stateful_programmable_switch_service() -> Result<Service, ModelError> {
    Ok(Service::new(service_types::STATEFUL_PROGRAMMABLE_SWITCH)
        .with_characteristic(programmable_switch_event()?)
        .with_characteristic(programmable_switch_output_state()?))
}

pub fn stateless_programmable_switch_service() -> Result<Service, ModelError> {
    Ok(Service::new(service_types::STATELESS_PROGRAMMABLE_SWITCH)
        .with_characteristic(programmable_switch_event()?))
}

pub fn text_service() -> Service {
    Service::new(service_types::TEXT).with_characteristic(version())
}

// accessories

/// Initial value and limits of a float reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FloatRange {
    pub fn new(value: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            value,
            min,
            max,
            step,
        }
    }
}

/// Re-bounds the first characteristic of `kind` in `service`.
fn apply_range(mut service: Service, kind: &str, range: FloatRange) -> Result<Service, ModelError> {
    if let Some(c) = service
        .characteristics_mut()
        .iter_mut()
        .find(|c| c.kind() == kind)
    {
        c.set_min_value(range.min)?;
        c.set_max_value(range.max)?;
        c.set_min_step(range.step)?;
        c.reset_value(range.value)?;
    }
    Ok(service)
}

/// Switchable outlet: service 7, `on` 8, `in use` 9.
pub fn outlet(info: &AccessoryInfo) -> Accessory {
    Accessory::new(info, Category::OUTLET).with_service(outlet_service())
}

pub fn thermometer(info: &AccessoryInfo, temperature: FloatRange) -> Result<Accessory, ModelError> {
    let service = apply_range(
        temperature_sensor_service()?,
        types::CURRENT_TEMPERATURE,
        temperature,
    )?;
    Ok(Accessory::new(info, Category::THERMOSTAT).with_service(service))
}

pub fn hygrometer(info: &AccessoryInfo, humidity: FloatRange) -> Result<Accessory, ModelError> {
    let service = apply_range(
        humidity_sensor_service()?,
        types::CURRENT_RELATIVE_HUMIDITY,
        humidity,
    )?;
    Ok(Accessory::new(info, Category::THERMOSTAT).with_service(service))
}

/// Thermostat: service 7, current state 8, target state 9, current
/// temperature 10, target temperature 11, display units 12.
pub fn thermostat(
    info: &AccessoryInfo,
    current: FloatRange,
    target: FloatRange,
) -> Result<Accessory, ModelError> {
    let service = apply_range(thermostat_service()?, types::CURRENT_TEMPERATURE, current)?;
    let service = apply_range(service, types::TARGET_TEMPERATURE, target)?;
    Ok(Accessory::new(info, Category::THERMOSTAT).with_service(service))
}

pub fn text(info: &AccessoryInfo, text: &str) -> Result<Accessory, ModelError> {
    let mut service = text_service();
    if let Some(version) = service.characteristics_mut().first_mut() {
        version.reset_value(text)?;
    }
    Ok(Accessory::new(info, TEXT_CATEGORY).with_service(service))
}
