use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::net::{IpAddr, Ipv4Addr};

use fabric_bridge::connector::{
    ClassType, CommandMessage, Connector, ConnectorOptions, ControllerUpdate, EventQueue, InboundSink,
    Payload, QueuedMessage,
};
use fabric_bridge::topic::CommandAddress;
use fabric_bridge::transport::QoS;
use fabric_bridge::transport::memory::{MemoryNetwork, MemoryTransport, ScriptedResolution};

/// Tracks live heap bytes per thread so the harness threads do not interfere.
struct Counting;

thread_local! {
    static LIVE: Cell<isize> = const { Cell::new(0) };
}

fn adjust(delta: isize) {
    let _ = LIVE.try_with(|live| live.set(live.get() + delta));
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            adjust(layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        adjust(-(layout.size() as isize));
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

fn live() -> isize {
    LIVE.with(Cell::get)
}

fn message(i: usize) -> QueuedMessage {
    match i % 4 {
        0 => QueuedMessage::Command(CommandMessage {
            address: CommandAddress {
                nodename: format!("node{i}"),
                actor_id: "firmware".to_string(),
                platform_id: "esp".to_string(),
                feed_id: "upgrade".to_string(),
            },
            payload: Payload::from(vec![0u8; 64 + i]),
        }),
        1 => QueuedMessage::FromController(ControllerUpdate {
            actor_id: "hk".to_string(),
            feed_id: "bool".to_string(),
            payload: Payload::from(br#"{"d":{"_type":"bool","aid":1,"iid":8,"value":true}}"#.as_slice()),
        }),
        2 => QueuedMessage::ControllerOnline {
            nodename: format!("controller{i}"),
        },
        _ => QueuedMessage::Disconnected,
    }
}

const COUNT: usize = 256;

#[test]
fn queue_releases_everything_it_owns() {
    let queue = EventQueue::new();

    // grow the ring buffer once so its capacity is part of the baseline
    for i in 0..COUNT {
        queue.push(message(i));
    }
    while queue.pop().is_some() {}

    let baseline = live();
    for i in 0..COUNT {
        queue.push(message(i));
    }
    assert_eq!(queue.len(), COUNT);
    assert!(live() > baseline);

    let mut popped = 0;
    while let Some(message) = queue.pop() {
        drop(message);
        popped += 1;
    }
    assert_eq!(popped, COUNT);
    assert_eq!(live(), baseline);

    for i in 0..COUNT {
        queue.push(message(i));
    }
    queue.clear();
    assert!(queue.is_empty());
    assert_eq!(live(), baseline);
}

fn feed(sink: &InboundSink, i: usize) {
    match i % 5 {
        0 => sink.on_message(
            "home/hub/$commands/$clients/firmware/esp/reboot",
            format!("attempt {i}").as_bytes(),
            0,
            false,
            false,
        ),
        1 => sink.on_message(
            "home/den/$feeds/$offramp/hk/hub/svc/esp/from_hk/bool",
            br#"{"d":{"_type":"bool","aid":1,"iid":8,"value":true}}"#,
            1,
            false,
            false,
        ),
        2 => sink.on_message(
            "home/hk/$commands/$clients/sysctl/hk/status",
            br#"{"d":{"_type":"status","status":"online","uptime":3,"nodename":"hk","platform_id":"hk","class":"controller_svc"}}"#,
            0,
            true,
            false,
        ),
        3 => sink.on_message(
            "home/broadcast/$feeds/$offramp/clock/esp/analog_write/time/analog_out/seconds",
            br#"{"d":{"_type":"analog_write","value":1700000000}}"#,
            0,
            false,
            false,
        ),
        _ => sink.on_disconnected(),
    }
}

#[test]
fn dispatch_releases_every_message() {
    let options = ConnectorOptions {
        host: "broker.local".to_string(),
        port: 1883,
        root_topic: "home".to_string(),
        nodename: "den".to_string(),
        platform_id: "esp".to_string(),
        class: ClassType::DeviceSvc,
        retain_status: false,
        qos: QoS::AtMostOnce,
    };
    let network = MemoryNetwork::new(ScriptedResolution::Immediate(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    let mut connector = Connector::new(options, MemoryTransport::new(), network).unwrap();
    // keeps the link at rest so only dispatch runs
    connector.network_mut().set_up(false);
    let sink = connector.inbound_sink();

    for i in 0..COUNT {
        feed(&sink, i);
    }
    for _ in 0..COUNT {
        connector.run();
    }
    assert_eq!(connector.queued(), 0);

    let baseline = live();
    for i in 0..COUNT {
        feed(&sink, i);
    }
    assert_eq!(connector.queued(), COUNT);
    for _ in 0..COUNT {
        connector.run();
    }
    assert_eq!(connector.queued(), 0);
    assert_eq!(live(), baseline);
}
