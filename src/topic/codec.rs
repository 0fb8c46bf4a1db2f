use crate::utils::error::TopicError;

use super::address::{
    CommandAddress, FabricAddress, OfframpAddress, OnrampAddress, StatusAddress,
};
use super::{
    ACTOR_SYSCTL, ANY, DOMAIN_COMMANDS, DOMAIN_FEEDS, FEED_STATUS, ROUTE_CLIENTS, ROUTE_OFFRAMP,
    ROUTE_ONRAMP,
};

/// Encodes and decodes fabric topics for one local identity.
///
/// The codec owns the root topic and the local nodename/platform id so the
/// `*_publish` builders can fill in "who am I" without the caller repeating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicCodec {
    root: String,
    nodename: String,
    platform_id: String,
}

impl TopicCodec {
    pub fn new(
        root: impl Into<String>,
        nodename: impl Into<String>,
        platform_id: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            nodename: nodename.into(),
            platform_id: platform_id.into(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn nodename(&self) -> &str {
        &self.nodename
    }

    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }

    /// Exact length in bytes of the encoded topic for `address`.
    pub fn encoded_len(&self, address: &FabricAddress) -> usize {
        address.segments(&self.root).joined_len()
    }

    /// Encodes `address` into a freshly reserved string of exactly
    /// [`encoded_len`](Self::encoded_len) bytes.
    pub fn encode(&self, address: &FabricAddress) -> Result<String, TopicError> {
        let segments = address.segments(&self.root);
        let len = segments.joined_len();

        let mut topic = String::new();
        topic
            .try_reserve_exact(len)
            .map_err(|_| TopicError::AllocationFailure(len))?;

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                topic.push('/');
            }
            topic.push_str(segment);
        }

        debug_assert_eq!(topic.len(), len);
        Ok(topic)
    }

    /// Encodes `address` into `buf`, returning the number of bytes written.
    ///
    /// Nothing is written when `buf` is shorter than the encoded topic.
    pub fn encode_into(&self, address: &FabricAddress, buf: &mut [u8]) -> Result<usize, TopicError> {
        let segments = address.segments(&self.root);
        let needed = segments.joined_len();
        if buf.len() < needed {
            return Err(TopicError::BufferTooSmall {
                needed,
                available: buf.len(),
            });
        }

        let mut at = 0;
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                buf[at] = b'/';
                at += 1;
            }
            buf[at..at + segment.len()].copy_from_slice(segment.as_bytes());
            at += segment.len();
        }

        Ok(at)
    }

    /// Parses a topic received from the broker.
    ///
    /// A topic outside our root fails with [`TopicError::ForeignRoot`]; every
    /// other error means the topic claimed to be ours but is malformed.
    pub fn decode(&self, topic: &str) -> Result<FabricAddress, TopicError> {
        if topic.is_empty() {
            return Err(TopicError::Empty);
        }

        let parts: Vec<&str> = topic.split('/').collect();
        if parts[0] != self.root {
            return Err(TopicError::ForeignRoot {
                expected: self.root.clone(),
                found: parts[0].to_string(),
            });
        }

        let nodename = segment(&parts, 1, "nodename")?;
        let domain = segment(&parts, 2, "domain")?;
        if domain != DOMAIN_FEEDS && domain != DOMAIN_COMMANDS {
            return Err(TopicError::UnknownDomain {
                found: domain.to_string(),
            });
        }
        let route = segment(&parts, 3, "route")?;

        let address = match (domain, route) {
            (DOMAIN_COMMANDS, ROUTE_CLIENTS) => {
                let actor_id = segment(&parts, 4, "actor_id")?;
                let platform_id = segment(&parts, 5, "platform_id")?;
                let feed_id = segment(&parts, 6, "feed_id")?;
                exact(&parts, 7)?;

                if actor_id == ACTOR_SYSCTL && feed_id == FEED_STATUS {
                    FabricAddress::Status(StatusAddress {
                        nodename: nodename.to_string(),
                        platform_id: platform_id.to_string(),
                    })
                } else {
                    FabricAddress::Command(CommandAddress {
                        nodename: nodename.to_string(),
                        actor_id: actor_id.to_string(),
                        platform_id: platform_id.to_string(),
                        feed_id: feed_id.to_string(),
                    })
                }
            }
            (DOMAIN_FEEDS, ROUTE_OFFRAMP) => {
                let address = OfframpAddress {
                    nodename: nodename.to_string(),
                    actor_id: segment(&parts, 4, "actor_id")?.to_string(),
                    actor_platform_id: segment(&parts, 5, "actor_platform_id")?.to_string(),
                    task_id: segment(&parts, 6, "task_id")?.to_string(),
                    platform_id: segment(&parts, 7, "platform_id")?.to_string(),
                    service_id: segment(&parts, 8, "service_id")?.to_string(),
                    feed_id: segment(&parts, 9, "feed_id")?.to_string(),
                };
                exact(&parts, 10)?;
                FabricAddress::Offramp(address)
            }
            (DOMAIN_FEEDS, ROUTE_ONRAMP) => {
                let address = OnrampAddress {
                    nodename: nodename.to_string(),
                    platform_id: segment(&parts, 4, "platform_id")?.to_string(),
                    service_id: segment(&parts, 5, "service_id")?.to_string(),
                    feed_id: segment(&parts, 6, "feed_id")?.to_string(),
                };
                exact(&parts, 7)?;
                FabricAddress::Onramp(address)
            }
            _ => {
                return Err(TopicError::UnknownRoute {
                    domain: domain.to_string(),
                    found: route.to_string(),
                });
            }
        };

        Ok(address)
    }

    /// Our own status heartbeat.
    pub fn status_publish(&self) -> FabricAddress {
        FabricAddress::Status(StatusAddress {
            nodename: self.nodename.clone(),
            platform_id: self.platform_id.clone(),
        })
    }

    /// Status heartbeats of every node on every platform.
    pub fn status_subscribe(&self) -> FabricAddress {
        FabricAddress::Status(StatusAddress {
            nodename: ANY.to_string(),
            platform_id: ANY.to_string(),
        })
    }

    /// Command sent from this node.
    pub fn command_publish(&self, actor_id: &str, platform_id: &str, feed_id: &str) -> FabricAddress {
        FabricAddress::Command(CommandAddress {
            nodename: self.nodename.clone(),
            actor_id: actor_id.to_string(),
            platform_id: platform_id.to_string(),
            feed_id: feed_id.to_string(),
        })
    }

    /// Commands sent by `nodename`.
    pub fn command_subscribe(
        &self,
        nodename: &str,
        actor_id: &str,
        platform_id: &str,
        feed_id: &str,
    ) -> FabricAddress {
        FabricAddress::Command(CommandAddress {
            nodename: nodename.to_string(),
            actor_id: actor_id.to_string(),
            platform_id: platform_id.to_string(),
            feed_id: feed_id.to_string(),
        })
    }

    /// Offramp feed sent by this node to `nodename`.
    pub fn offramp_publish(
        &self,
        nodename: &str,
        task_id: &str,
        platform_id: &str,
        service_id: &str,
        feed_id: &str,
    ) -> FabricAddress {
        FabricAddress::Offramp(OfframpAddress {
            nodename: nodename.to_string(),
            actor_id: self.nodename.clone(),
            actor_platform_id: self.platform_id.clone(),
            task_id: task_id.to_string(),
            platform_id: platform_id.to_string(),
            service_id: service_id.to_string(),
            feed_id: feed_id.to_string(),
        })
    }

    /// Offramp feeds addressed to `nodename` from a matching sender.
    #[allow(clippy::too_many_arguments)]
    pub fn offramp_subscribe(
        &self,
        nodename: &str,
        actor_id: &str,
        actor_platform_id: &str,
        task_id: &str,
        platform_id: &str,
        service_id: &str,
        feed_id: &str,
    ) -> FabricAddress {
        FabricAddress::Offramp(OfframpAddress {
            nodename: nodename.to_string(),
            actor_id: actor_id.to_string(),
            actor_platform_id: actor_platform_id.to_string(),
            task_id: task_id.to_string(),
            platform_id: platform_id.to_string(),
            service_id: service_id.to_string(),
            feed_id: feed_id.to_string(),
        })
    }

    /// Onramp feed injected by this node for `nodename`.
    pub fn onramp_publish(&self, nodename: &str, service_id: &str, feed_id: &str) -> FabricAddress {
        FabricAddress::Onramp(OnrampAddress {
            nodename: nodename.to_string(),
            platform_id: self.platform_id.clone(),
            service_id: service_id.to_string(),
            feed_id: feed_id.to_string(),
        })
    }
}

fn segment<'a>(parts: &[&'a str], index: usize, field: &'static str) -> Result<&'a str, TopicError> {
    match parts.get(index) {
        None => Err(TopicError::MissingSegment { index, field }),
        Some(s) if s.is_empty() => Err(TopicError::EmptySegment { index, field }),
        Some(s) => Ok(s),
    }
}

fn exact(parts: &[&str], expected: usize) -> Result<(), TopicError> {
    if parts.len() > expected {
        return Err(TopicError::TrailingSegments {
            expected,
            found: parts.len(),
        });
    }
    Ok(())
}
