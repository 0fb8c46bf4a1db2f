use super::{
    ACTOR_SYSCTL, DOMAIN_COMMANDS, DOMAIN_FEEDS, FEED_STATUS, ROUTE_CLIENTS, ROUTE_OFFRAMP,
    ROUTE_ONRAMP,
};

/// Longest address: root plus nine offramp segments.
pub(crate) const MAX_SEGMENTS: usize = 10;

/// Presence heartbeat of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusAddress {
    pub nodename: String,
    pub platform_id: String,
}

/// Point-to-point command. `nodename` is the sender when publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAddress {
    pub nodename: String,
    pub actor_id: String,
    pub platform_id: String,
    pub feed_id: String,
}

/// Device to world feed. `actor_id`/`actor_platform_id` identify the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfframpAddress {
    pub nodename: String,
    pub actor_id: String,
    pub actor_platform_id: String,
    pub task_id: String,
    pub platform_id: String,
    pub service_id: String,
    pub feed_id: String,
}

/// External ingestion feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnrampAddress {
    pub nodename: String,
    pub platform_id: String,
    pub service_id: String,
    pub feed_id: String,
}

/// A decoded or to-be-encoded fabric topic, without its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FabricAddress {
    Status(StatusAddress),
    Command(CommandAddress),
    Offramp(OfframpAddress),
    Onramp(OnrampAddress),
}

/// Borrowed view of the segments of an address, root included.
pub(crate) struct Segments<'a> {
    parts: [&'a str; MAX_SEGMENTS],
    len: usize,
}

impl<'a> Segments<'a> {
    fn new(parts: &[&'a str]) -> Self {
        let mut all = [""; MAX_SEGMENTS];
        all[..parts.len()].copy_from_slice(parts);
        Self {
            parts: all,
            len: parts.len(),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.parts[..self.len].iter().copied()
    }

    /// Length of the `/`-joined form.
    pub(crate) fn joined_len(&self) -> usize {
        let content: usize = self.iter().map(str::len).sum();
        content + self.len.saturating_sub(1)
    }
}

impl FabricAddress {
    pub(crate) fn segments<'a>(&'a self, root: &'a str) -> Segments<'a> {
        match self {
            FabricAddress::Status(a) => Segments::new(&[
                root,
                a.nodename.as_str(),
                DOMAIN_COMMANDS,
                ROUTE_CLIENTS,
                ACTOR_SYSCTL,
                a.platform_id.as_str(),
                FEED_STATUS,
            ]),
            FabricAddress::Command(a) => Segments::new(&[
                root,
                a.nodename.as_str(),
                DOMAIN_COMMANDS,
                ROUTE_CLIENTS,
                a.actor_id.as_str(),
                a.platform_id.as_str(),
                a.feed_id.as_str(),
            ]),
            FabricAddress::Offramp(a) => Segments::new(&[
                root,
                a.nodename.as_str(),
                DOMAIN_FEEDS,
                ROUTE_OFFRAMP,
                a.actor_id.as_str(),
                a.actor_platform_id.as_str(),
                a.task_id.as_str(),
                a.platform_id.as_str(),
                a.service_id.as_str(),
                a.feed_id.as_str(),
            ]),
            FabricAddress::Onramp(a) => Segments::new(&[
                root,
                a.nodename.as_str(),
                DOMAIN_FEEDS,
                ROUTE_ONRAMP,
                a.platform_id.as_str(),
                a.service_id.as_str(),
                a.feed_id.as_str(),
            ]),
        }
    }

    /// Nodename segment of the topic.
    pub fn nodename(&self) -> &str {
        match self {
            FabricAddress::Status(a) => &a.nodename,
            FabricAddress::Command(a) => &a.nodename,
            FabricAddress::Offramp(a) => &a.nodename,
            FabricAddress::Onramp(a) => &a.nodename,
        }
    }
}
