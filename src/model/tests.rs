use super::catalog::{self, FloatRange};
use super::marshal::{accessory_list, parse_value_record, value_record};
use super::*;
use crate::utils::error::ModelError;

fn bounded_float() -> Characteristic {
    Characteristic::new(catalog::types::TARGET_TEMPERATURE, Format::Float, Perms::ALL)
        .with_range(5.0, 30.0, 1.0)
        .unwrap()
        .with_value(5.0)
        .unwrap()
}

#[test]
fn test_step_rejects_small_change() {
    let mut c = bounded_float();
    let outcome = c.set_value(5.4).unwrap();
    assert_eq!(outcome, WriteOutcome::BelowStep { kept: Value::Float(5.0) });
    assert_eq!(c.value(), Some(&Value::Float(5.0)));
}

#[test]
fn test_out_of_range_is_clamped() {
    let mut c = bounded_float();
    let outcome = c.set_value(40.0).unwrap();
    assert_eq!(
        outcome,
        WriteOutcome::Stored {
            value: Value::Float(30.0),
            adjusted: true
        }
    );
    assert_eq!(c.value(), Some(&Value::Float(30.0)));

    let outcome = c.set_value(-3.0).unwrap();
    assert_eq!(outcome.stored(), Some(&Value::Float(5.0)));
}

#[test]
fn test_step_in_both_directions() {
    let mut c = bounded_float();
    c.set_value(20.0).unwrap();
    assert!(matches!(c.set_value(19.5).unwrap(), WriteOutcome::BelowStep { .. }));
    assert_eq!(c.set_value(19.0).unwrap().stored(), Some(&Value::Float(19.0)));
}

#[test]
fn test_decimal_step_tolerates_rounding() {
    let mut c = catalog::current_temperature().unwrap();
    c.set_value(0.3).unwrap();
    assert_eq!(c.set_value(0.2).unwrap().stored(), Some(&Value::Float(0.2)));
}

#[test]
fn test_step_skipped_without_stored_value() {
    let mut c = Characteristic::new("X", Format::UInt8, Perms::ALL)
        .with_range(0u8, 100u8, 10u8)
        .unwrap();
    assert_eq!(c.set_value(3u8).unwrap().stored(), Some(&Value::UInt8(3)));
    assert!(matches!(c.set_value(9u8).unwrap(), WriteOutcome::BelowStep { .. }));
    assert_eq!(c.set_value(13u8).unwrap().stored(), Some(&Value::UInt8(13)));
}

#[test]
fn test_integer_clamp() {
    let mut c = catalog::target_heating_cooling_state().unwrap();
    let outcome = c.set_value(9u8).unwrap();
    assert_eq!(
        outcome,
        WriteOutcome::Stored {
            value: Value::UInt8(catalog::heating_cooling::AUTO),
            adjusted: true
        }
    );
}

#[test]
fn test_format_mismatch() {
    let mut c = bounded_float();
    let err = c.set_value(true).unwrap_err();
    assert_eq!(
        err,
        ModelError::FormatMismatch {
            expected: Format::Float,
            found: Format::Bool
        }
    );
}

#[test]
fn test_non_finite_floats_are_rejected() {
    // no stored value, so the step rule cannot catch it either
    let mut c = Characteristic::new(catalog::types::TARGET_TEMPERATURE, Format::Float, Perms::ALL)
        .with_range(5.0, 30.0, 1.0)
        .unwrap();
    assert_eq!(c.set_value(f64::NAN).unwrap_err(), ModelError::NonFinite);
    assert_eq!(c.set_value(f64::INFINITY).unwrap_err(), ModelError::NonFinite);
    assert!(c.value().is_none());

    let mut c = bounded_float();
    assert_eq!(c.set_value(f64::NEG_INFINITY).unwrap_err(), ModelError::NonFinite);
    assert_eq!(c.value(), Some(&Value::Float(5.0)));
    assert_eq!(
        c.clone().with_range(f64::NAN, 30.0, 1.0).unwrap_err(),
        ModelError::NonFinite
    );
}

#[test]
fn test_bounds_require_numeric_format() {
    let mut c = catalog::name();
    assert_eq!(
        c.set_min_value("a").unwrap_err(),
        ModelError::NonNumericBound(Format::String)
    );

    let mut c = bounded_float();
    assert!(matches!(
        c.set_max_value(10u8).unwrap_err(),
        ModelError::FormatMismatch { .. }
    ));
}

#[test]
fn test_string_rules() {
    let mut c = catalog::name().with_max_len(5);
    assert_eq!(c.set_value("").unwrap_err(), ModelError::EmptyString);

    let outcome = c.set_value("kitchen lamp").unwrap();
    assert_eq!(
        outcome,
        WriteOutcome::Stored {
            value: Value::String("kitch".into()),
            adjusted: true
        }
    );

    // never split a multi-byte character
    let outcome = c.set_value("ååå").unwrap();
    assert_eq!(outcome.stored(), Some(&Value::String("åå".into())));
}

#[test]
fn test_perms_tokens() {
    assert_eq!(Perms::ALL.tokens(), vec!["pr", "pw", "ev"]);
    assert_eq!(Perms::READ_EVENTS.tokens(), vec!["pr", "ev"]);
    assert_eq!(Perms::WRITE_ONLY.tokens(), vec!["pw"]);
    assert_eq!((Perms::READ | Perms::WRITE).bits(), 0x03);
    assert!(Perms::ALL.contains(Perms::WRITE));
    assert!(!Perms::READ_ONLY.contains(Perms::WRITE));
}

#[test]
fn test_format_names() {
    for format in [
        Format::String,
        Format::Bool,
        Format::UInt8,
        Format::Int8,
        Format::UInt16,
        Format::Int16,
        Format::UInt32,
        Format::Int32,
        Format::UInt64,
        Format::Float,
    ] {
        assert_eq!(format.as_str().parse::<Format>().unwrap(), format);
        assert_eq!(
            serde_json::to_string(&format).unwrap(),
            format!("\"{}\"", format.as_str())
        );
    }
    assert!("tlv8".parse::<Format>().is_err());
    assert!("data".parse::<Format>().is_err());
}

#[test]
fn test_service_attach_numbers_service_first() {
    let mut accessory = Accessory::bare(Category::OTHER)
        .with_service(Service::new("A").with_characteristic(catalog::on()).with_characteristic(catalog::on()));
    assert_eq!(accessory.next_iid(), 4);

    let service = Service::new("B")
        .with_characteristic(catalog::on())
        .with_characteristic(catalog::outlet_in_use())
        .with_characteristic(catalog::identify());
    let iid = accessory.add_service(service);

    assert_eq!(iid, 4);
    let ids: Vec<u64> = accessory.services()[1]
        .characteristics()
        .iter()
        .map(|c| c.iid())
        .collect();
    assert_eq!(ids, vec![5, 6, 7]);
    assert_eq!(accessory.next_iid(), 8);
}

#[test]
fn test_information_service_comes_first() {
    let info = AccessoryInfo::new("Lamp").manufacturer("Acme");
    let accessory = catalog::outlet(&info);

    let information = &accessory.services()[0];
    assert_eq!(information.iid(), 1);
    assert_eq!(information.kind(), catalog::service_types::ACCESSORY_INFORMATION);
    let ids: Vec<u64> = information.characteristics().iter().map(|c| c.iid()).collect();
    assert_eq!(ids, vec![2, 3, 4, 5, 6]);
    assert_eq!(
        accessory.find_characteristic(3).unwrap().value(),
        Some(&Value::String("Acme".into()))
    );
    assert_eq!(
        accessory.find_characteristic(4).unwrap().value(),
        Some(&Value::String("undefined".into()))
    );

    let outlet = &accessory.services()[1];
    assert_eq!(outlet.iid(), 7);
    assert_eq!(accessory.find_characteristic(8).unwrap().kind(), catalog::types::ON);
    assert_eq!(
        accessory.find_characteristic(9).unwrap().kind(),
        catalog::types::OUTLET_IN_USE
    );
}

#[test]
fn test_thermostat_layout_and_ranges() {
    let accessory = catalog::thermostat(
        &AccessoryInfo::default(),
        FloatRange::new(21.5, -10.0, 50.0, 0.5),
        FloatRange::new(20.0, 10.0, 25.0, 1.0),
    )
    .unwrap();

    let kinds: Vec<&str> = (8..=12)
        .map(|iid| accessory.find_characteristic(iid).unwrap().kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            catalog::types::CURRENT_HEATING_COOLING_STATE,
            catalog::types::TARGET_HEATING_COOLING_STATE,
            catalog::types::CURRENT_TEMPERATURE,
            catalog::types::TARGET_TEMPERATURE,
            catalog::types::TEMPERATURE_DISPLAY_UNITS,
        ]
    );

    let current = accessory.find_characteristic(10).unwrap();
    assert_eq!(current.value(), Some(&Value::Float(21.5)));
    assert_eq!(current.min_value(), Some(&Value::Float(-10.0)));
    assert_eq!(current.min_step(), Some(&Value::Float(0.5)));

    let target = accessory.find_characteristic(11).unwrap();
    assert_eq!(target.max_value(), Some(&Value::Float(25.0)));
}

#[test]
fn test_target_temperature_initial_value_is_clamped() {
    let c = catalog::target_temperature().unwrap();
    assert_eq!(c.value(), Some(&Value::Float(5.0)));
}

#[test]
fn test_text_accessory() {
    let accessory = catalog::text(&AccessoryInfo::default(), "v1.2.0").unwrap();
    assert_eq!(accessory.category(), catalog::TEXT_CATEGORY);
    let version = accessory.find_characteristic(8).unwrap();
    assert_eq!(version.kind(), catalog::types::VERSION);
    assert_eq!(version.value(), Some(&Value::String("v1.2.0".into())));
    assert!(catalog::text(&AccessoryInfo::default(), "").is_err());
}

#[test]
fn test_switch_services() {
    let stateful = catalog::stateful_programmable_switch_service().unwrap();
    assert_eq!(stateful.characteristics().len(), 2);
    let stateless = catalog::stateless_programmable_switch_service().unwrap();
    assert_eq!(stateless.characteristics().len(), 1);
    assert_eq!(catalog::text_service().characteristics()[0].value(), None);
}

#[test]
fn test_container_assigns_aids_and_handles() {
    let mut container = Container::new("kitchen", AccessoryInfo::default());
    let first = container.add_accessory(catalog::outlet(&AccessoryInfo::new("A")));
    let second = container.add_accessory(
        catalog::hygrometer(&AccessoryInfo::new("B"), FloatRange::new(40.0, 0.0, 100.0, 1.0)).unwrap(),
    );
    assert_eq!((first, second), (1, 2));

    let c = container.characteristic(2, 8).unwrap();
    assert_eq!(c.handle(), Some(CharacteristicHandle { aid: 2, iid: 8 }));
    assert_eq!(c.value(), Some(&Value::Float(40.0)));

    // a service attached after the accessory joined the container is wired too
    let mut late = container.accessory_mut(1).unwrap().clone();
    late.add_service(catalog::text_service());
    assert_eq!(late.find_characteristic(11).unwrap().handle().unwrap().aid, 1);
}

#[test]
fn test_container_lookup_misses() {
    let mut container = Container::new("kitchen", AccessoryInfo::default());
    container.add_accessory(catalog::outlet(&AccessoryInfo::default()));

    assert_eq!(
        container.set_value(9, 8, true).unwrap_err(),
        ModelError::AccessoryNotFound { aid: 9 }
    );
    assert_eq!(
        container.set_value(1, 99, true).unwrap_err(),
        ModelError::CharacteristicNotFound { aid: 1, iid: 99 }
    );
    assert_eq!(
        container.set_value(1, 8, true).unwrap().stored(),
        Some(&Value::Bool(true))
    );
}

#[test]
fn test_value_record_is_byte_exact() {
    let payload = value_record(2, 6, &Value::Bool(true)).unwrap();
    assert_eq!(payload, r#"{"d":{"_type":"bool","aid":2,"iid":6,"value":true}}"#);

    let payload = value_record(1, 10, &Value::Float(21.5)).unwrap();
    assert_eq!(payload, r#"{"d":{"_type":"float","aid":1,"iid":10,"value":21.5}}"#);
}

#[test]
fn test_accessory_list_document() {
    let info = AccessoryInfo::new("Bridge")
        .serial_number("S1")
        .manufacturer("Acme")
        .model("M1");
    let mut container = Container::new("kitchen", info);
    container.add_accessory(Accessory::bare(Category::OUTLET).with_service(catalog::outlet_service()));

    let json = accessory_list(&container).unwrap();
    assert_eq!(
        json,
        concat!(
            r#"{"d":{"_type":"accessories_list","nodename":"kitchen","name":"Bridge","model":"M1","#,
            r#""serialnumber":"S1","manufacturer":"Acme","value":{"accessories":[{"aid":1,"type":7,"#,
            r#""services":[{"iid":1,"type":"47","characteristics":["#,
            r#"{"iid":2,"type":"25","perms":["pr","pw","ev"],"value":false,"format":"bool"},"#,
            r#"{"iid":3,"type":"26","perms":["pr","ev"],"value":true,"format":"bool"}]}]}]}}}"#
        )
    );
}

#[test]
fn test_bounded_characteristic_document() {
    let c = catalog::current_temperature().unwrap();
    assert_eq!(
        serde_json::to_string(&c).unwrap(),
        r#"{"iid":0,"type":"11","perms":["pr","ev"],"value":0.0,"format":"float","unit":"celsius","maxValue":100.0,"minValue":0.0,"minStep":0.1}"#
    );

    // identify carries no value
    let json = serde_json::to_string(&catalog::identify()).unwrap();
    assert!(!json.contains("value"));
}

#[test]
fn test_parse_value_record() {
    let inbound = parse_value_record(br#"{"d":{"_type":"float","aid":1,"iid":11,"value":22.5}}"#).unwrap();
    assert_eq!(inbound.kind, "float");
    assert_eq!((inbound.aid, inbound.iid), (1, 11));
    assert_eq!(inbound.value.as_f64(), Some(22.5));

    assert!(parse_value_record(br#"{"d":{"_type":"float","iid":11}}"#).is_err());
    assert!(parse_value_record(b"not json").is_err());
}
