use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Result of asking the network for a broker address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Answered synchronously.
    Ready(IpAddr),
    /// The answer will be delivered through the [`ResolveHandle`].
    InProgress,
    Failed(String),
}

/// One-shot slot an asynchronous resolver completes.
///
/// The connector hands a fresh handle to every resolution request and polls
/// it from its own loop, so an answer arriving for an abandoned request is
/// never observed.
#[derive(Debug, Clone, Default)]
pub struct ResolveHandle {
    slot: Arc<Mutex<Option<Result<IpAddr, String>>>>,
}

impl ResolveHandle {
    pub fn complete(&self, address: IpAddr) {
        *self.lock() = Some(Ok(address));
    }

    pub fn fail(&self, reason: impl Into<String>) {
        *self.lock() = Some(Err(reason.into()));
    }

    /// Takes the answer, if one has arrived.
    pub fn take(&self) -> Option<Result<IpAddr, String>> {
        self.lock().take()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Result<IpAddr, String>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Link state and name resolution of the host.
pub trait Network {
    fn is_up(&mut self) -> bool;

    fn resolve(&mut self, host: &str, port: u16, handle: ResolveHandle) -> Resolution;
}

/// The host's own network stack.
///
/// A general purpose host has no link-state signal we can observe, so the
/// link is reported up. IP literals resolve immediately; names are looked up
/// on the runtime.
#[derive(Debug, Clone)]
pub struct HostNetwork {
    runtime: Handle,
}

impl HostNetwork {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Network for HostNetwork {
    fn is_up(&mut self) -> bool {
        true
    }

    fn resolve(&mut self, host: &str, port: u16, handle: ResolveHandle) -> Resolution {
        if let Ok(address) = host.parse::<IpAddr>() {
            return Resolution::Ready(address);
        }

        let target = format!("{host}:{port}");
        debug!(%target, "resolving broker host");
        self.runtime.spawn(async move {
            match tokio::net::lookup_host(target.as_str()).await {
                Ok(mut addrs) => match addrs.next() {
                    Some(addr) => handle.complete(addr.ip()),
                    None => handle.fail(format!("{target} has no addresses")),
                },
                Err(e) => {
                    warn!(%target, error = %e, "broker host lookup failed");
                    handle.fail(e.to_string());
                }
            }
        });
        Resolution::InProgress
    }
}
