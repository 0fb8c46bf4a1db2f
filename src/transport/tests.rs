use std::net::{IpAddr, Ipv4Addr};

use super::memory::{MemoryNetwork, MemoryTransport, ScriptedResolution};
use super::network::{HostNetwork, Network, Resolution, ResolveHandle};
use super::outbound::{Delivery, Outbound};
use super::{LastWill, QoS, Transport};
use crate::connector::{EventQueue, InboundSink, QueuedMessage};
use crate::topic::TopicCodec;
use crate::utils::error::TransportError;

fn localhost() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn codec() -> TopicCodec {
    TopicCodec::new("root", "node1", "esp")
}

#[test]
fn test_qos_levels() {
    assert_eq!(QoS::from_level(0), QoS::AtMostOnce);
    assert_eq!(QoS::from_level(1), QoS::AtLeastOnce);
    assert_eq!(QoS::from_level(2), QoS::ExactlyOnce);
    assert_eq!(QoS::from_level(9), QoS::ExactlyOnce);
    assert_eq!(QoS::AtLeastOnce.level(), 1);
}

#[test]
fn test_resolve_handle_is_one_shot() {
    let handle = ResolveHandle::default();
    assert!(handle.take().is_none());

    handle.clone().complete(localhost());
    assert_eq!(handle.take(), Some(Ok(localhost())));
    assert!(handle.take().is_none());

    handle.fail("nxdomain");
    assert_eq!(handle.take(), Some(Err("nxdomain".to_string())));
}

#[tokio::test]
async fn test_host_network_resolves_ip_literal_synchronously() {
    let mut network = HostNetwork::new(tokio::runtime::Handle::current());
    assert!(network.is_up());
    let resolution = network.resolve("10.0.0.7", 1883, ResolveHandle::default());
    assert_eq!(resolution, Resolution::Ready("10.0.0.7".parse().unwrap()));
}

#[tokio::test]
async fn test_host_network_resolves_names_through_the_handle() {
    let mut network = HostNetwork::new(tokio::runtime::Handle::current());
    let handle = ResolveHandle::default();
    let resolution = network.resolve("localhost", 1883, handle.clone());
    assert_eq!(resolution, Resolution::InProgress);

    let mut answer = None;
    for _ in 0..200 {
        answer = handle.take();
        if answer.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let address = answer.expect("lookup finished").expect("localhost resolves");
    assert!(address.is_loopback());
}

#[test]
fn test_memory_transport_records_requests() {
    let queue = EventQueue::default();
    let mut transport = MemoryTransport::new().with_auto_connack();
    transport.attach(InboundSink::new(queue.clone(), codec()));
    transport.set_last_will(LastWill {
        topic: "root/node1/will".to_string(),
        payload: b"gone".to_vec(),
        qos: QoS::AtMostOnce,
        retain: true,
    });

    transport.connect(localhost(), 1883).unwrap();
    assert!(transport.is_connected());
    assert_eq!(transport.connects(), &[(localhost(), 1883)]);
    assert_eq!(transport.last_will().unwrap().payload, b"gone");
    assert!(matches!(queue.pop(), Some(QueuedMessage::Connected { .. })));

    transport.publish("a/b", b"x", QoS::AtLeastOnce, false).unwrap();
    transport.subscribe("a/+", QoS::AtMostOnce).unwrap();
    assert_eq!(transport.published()[0].topic, "a/b");
    assert_eq!(transport.published()[0].payload_str(), "x");
    assert!(transport.is_subscribed("a/+"));

    transport.disconnect();
    assert!(!transport.is_connected());
    assert_eq!(transport.disconnects(), 1);
    assert!(matches!(queue.pop(), Some(QueuedMessage::Disconnected)));
}

#[test]
fn test_memory_transport_refuses_publish_when_down() {
    let mut transport = MemoryTransport::new();
    assert_eq!(
        transport.publish("a", b"", QoS::AtMostOnce, false),
        Err(TransportError::NotConnected)
    );
}

#[test]
fn test_lingering_disconnect_waits_for_the_broker() {
    let queue = EventQueue::default();
    let mut transport = MemoryTransport::new().with_lingering_disconnect();
    transport.attach(InboundSink::new(queue.clone(), codec()));
    transport.accept_connection();
    queue.pop();

    transport.disconnect();
    assert!(transport.is_connected());
    transport.drop_connection();
    assert!(!transport.is_connected());
    assert!(matches!(queue.pop(), Some(QueuedMessage::Disconnected)));
}

#[test]
fn test_memory_network_scripts() {
    let mut network = MemoryNetwork::new(ScriptedResolution::Deferred);
    let handle = ResolveHandle::default();
    assert_eq!(network.resolve("broker", 1883, handle.clone()), Resolution::InProgress);
    network.pending_request().unwrap().complete(localhost());
    assert_eq!(handle.take(), Some(Ok(localhost())));

    network.set_script(ScriptedResolution::Fail("down".to_string()));
    assert_eq!(
        network.resolve("broker", 1883, ResolveHandle::default()),
        Resolution::Failed("down".to_string())
    );
    assert_eq!(network.requests(), &["broker".to_string(), "broker".to_string()]);

    network.set_up(false);
    assert!(!network.is_up());
}

#[test]
fn test_outbound_skips_while_disconnected() {
    let codec = codec();
    let mut transport = MemoryTransport::new();
    let mut out = Outbound::new(&codec, &mut transport, true);
    assert_eq!(out.publish("t", b"p", QoS::AtMostOnce, false), Ok(Delivery::Skipped));
    assert_eq!(out.subscribe("t", QoS::AtMostOnce), Ok(Delivery::Skipped));
    assert!(transport.published().is_empty());
}

#[test]
fn test_outbound_refuses_after_shutdown_started() {
    let codec = codec();
    let mut transport = MemoryTransport::new();
    transport.accept_connection();
    let mut out = Outbound::new(&codec, &mut transport, false);
    assert_eq!(
        out.publish("t", b"p", QoS::AtMostOnce, false),
        Err(TransportError::ShuttingDown)
    );
}

#[test]
fn test_outbound_sends_when_connected() {
    let codec = codec();
    let mut transport = MemoryTransport::new();
    transport.accept_connection();
    let mut out = Outbound::new(&codec, &mut transport, true);
    assert_eq!(out.codec().nodename(), "node1");
    assert_eq!(out.publish("t", b"p", QoS::AtLeastOnce, true), Ok(Delivery::Sent));
    assert_eq!(transport.published().len(), 1);
    assert!(transport.published()[0].retain);
}
