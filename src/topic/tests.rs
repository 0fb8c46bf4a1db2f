use super::*;
use crate::utils::error::TopicError;

fn codec() -> TopicCodec {
    TopicCodec::new("fabric", "kitchen", "esp")
}

#[test]
fn test_status_topics() {
    let codec = codec();
    let publish = codec.encode(&codec.status_publish()).unwrap();
    assert_eq!(publish, "fabric/kitchen/$commands/$clients/sysctl/esp/status");

    let subscribe = codec.encode(&codec.status_subscribe()).unwrap();
    assert_eq!(subscribe, "fabric/+/$commands/$clients/sysctl/+/status");
}

#[test]
fn test_command_topics() {
    let codec = codec();
    let publish = codec
        .encode(&codec.command_publish("lamp", "esp", "power"))
        .unwrap();
    assert_eq!(publish, "fabric/kitchen/$commands/$clients/lamp/esp/power");

    let subscribe = codec
        .encode(&codec.command_subscribe("hall", ANY, "esp", ANY))
        .unwrap();
    assert_eq!(subscribe, "fabric/hall/$commands/$clients/+/esp/+");
}

#[test]
fn test_offramp_publish_fills_local_identity() {
    let codec = codec();
    let topic = codec
        .encode(&codec.offramp_publish(
            NODENAME_BROADCAST,
            TASK_SERVICE,
            "esp",
            SERVICE_TO_CONTROLLER,
            "bool",
        ))
        .unwrap();
    assert_eq!(
        topic,
        "fabric/broadcast/$feeds/$offramp/kitchen/esp/svc/esp/to_hk/bool"
    );
}

#[test]
fn test_onramp_publish() {
    let codec = codec();
    let topic = codec
        .encode(&codec.onramp_publish("collector", "meter", "watts"))
        .unwrap();
    assert_eq!(topic, "fabric/collector/$feeds/$onramp/esp/meter/watts");
}

#[test]
fn test_encoded_len_matches_encode() {
    let codec = codec();
    let addresses = [
        codec.status_publish(),
        codec.status_subscribe(),
        codec.command_publish("a", "b", "c"),
        codec.offramp_subscribe("kitchen", ANY, ANY, TASK_SERVICE, ANY, SERVICE_FROM_CONTROLLER, ANY),
        codec.onramp_publish("n", "s", "f"),
    ];
    for address in &addresses {
        let topic = codec.encode(address).unwrap();
        assert_eq!(codec.encoded_len(address), topic.len());
    }
}

#[test]
fn test_encode_into_exact_buffer() {
    let codec = codec();
    let address = codec.status_publish();
    let len = codec.encoded_len(&address);

    let mut buf = vec![0u8; len];
    let written = codec.encode_into(&address, &mut buf).unwrap();
    assert_eq!(written, len);
    assert_eq!(
        std::str::from_utf8(&buf).unwrap(),
        codec.encode(&address).unwrap()
    );
}

#[test]
fn test_encode_into_short_buffer_writes_nothing() {
    let codec = codec();
    let address = codec.status_publish();
    let len = codec.encoded_len(&address);

    let mut buf = vec![0u8; len - 1];
    let err = codec.encode_into(&address, &mut buf).unwrap_err();
    assert_eq!(
        err,
        TopicError::BufferTooSmall {
            needed: len,
            available: len - 1
        }
    );
    assert!(buf.iter().all(|b| *b == 0));
}

#[test]
fn test_offramp_round_trip() {
    let codec = codec();
    let cases = [
        ("broadcast", "kitchen", "esp", "svc", "esp", "to_hk", "bool"),
        ("kitchen", "controller", "linux", "svc", "esp", "from_hk", "float"),
        ("broadcast", "clock", "rpi", "dbg", "time", "analog_out", "seconds"),
    ];
    for (nodename, actor, actor_platform, task, platform, service, feed) in cases {
        let address = FabricAddress::Offramp(OfframpAddress {
            nodename: nodename.into(),
            actor_id: actor.into(),
            actor_platform_id: actor_platform.into(),
            task_id: task.into(),
            platform_id: platform.into(),
            service_id: service.into(),
            feed_id: feed.into(),
        });
        let topic = codec.encode(&address).unwrap();
        assert_eq!(codec.decode(&topic).unwrap(), address);
    }
}

#[test]
fn test_decode_status_and_command() {
    let codec = codec();
    let status = codec
        .decode("fabric/controller/$commands/$clients/sysctl/linux/status")
        .unwrap();
    assert_eq!(
        status,
        FabricAddress::Status(StatusAddress {
            nodename: "controller".into(),
            platform_id: "linux".into(),
        })
    );

    let command = codec
        .decode("fabric/controller/$commands/$clients/firmware/esp/upgrade")
        .unwrap();
    assert_eq!(
        command,
        FabricAddress::Command(CommandAddress {
            nodename: "controller".into(),
            actor_id: ACTOR_UPGRADER.into(),
            platform_id: "esp".into(),
            feed_id: "upgrade".into(),
        })
    );
}

#[test]
fn test_decode_onramp() {
    let codec = codec();
    let onramp = codec.decode("fabric/kitchen/$feeds/$onramp/esp/meter/watts").unwrap();
    assert_eq!(onramp.nodename(), "kitchen");
    assert!(matches!(onramp, FabricAddress::Onramp(_)));
}

#[test]
fn test_decode_foreign_root_aborts() {
    let codec = codec();
    let err = codec
        .decode("homeassistant/kitchen/$feeds/$offramp/a/b/svc/c/from_hk/bool")
        .unwrap_err();
    assert!(err.is_foreign());
    assert!(matches!(err, TopicError::ForeignRoot { .. }));
}

#[test]
fn test_decode_malformed_topics() {
    let codec = codec();

    let err = codec.decode("fabric/kitchen/$stuff/$offramp").unwrap_err();
    assert_eq!(
        err,
        TopicError::UnknownDomain {
            found: "$stuff".into()
        }
    );

    let err = codec.decode("fabric/kitchen/$feeds/$clients/a/b/c").unwrap_err();
    assert!(matches!(err, TopicError::UnknownRoute { .. }));

    let err = codec.decode("fabric/kitchen/$feeds/$offramp/a/b/svc").unwrap_err();
    assert_eq!(
        err,
        TopicError::MissingSegment {
            index: 7,
            field: "platform_id"
        }
    );

    let err = codec.decode("fabric/kitchen/$commands/$clients//esp/x").unwrap_err();
    assert_eq!(
        err,
        TopicError::EmptySegment {
            index: 4,
            field: "actor_id"
        }
    );

    let err = codec
        .decode("fabric/kitchen/$commands/$clients/a/esp/x/extra")
        .unwrap_err();
    assert_eq!(
        err,
        TopicError::TrailingSegments {
            expected: 7,
            found: 8
        }
    );

    assert_eq!(codec.decode("").unwrap_err(), TopicError::Empty);
    for err in [
        codec.decode("fabric").unwrap_err(),
        codec.decode("fabric/kitchen/$feeds/$offramp/a/b/svc").unwrap_err(),
    ] {
        assert!(!err.is_foreign());
    }
}
