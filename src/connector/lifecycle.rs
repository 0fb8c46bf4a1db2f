//! States of the connection lifecycle.
//!
//! The link progresses `NetworkDown → AwaitingAddress → AddressResolving →
//! AddressResolved → BrokerConnecting → BrokerConnected`. Shutdown runs on a
//! separate axis so that a network drop during draining does not lose the
//! shutdown progress.

use std::fmt;

/// Progress of network bring-up and the broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    NetworkDown,
    AwaitingAddress,
    AddressResolving,
    AddressResolved,
    /// Resolution failed; retried on the next network-up edge.
    ResolveFailed,
    BrokerConnecting,
    BrokerConnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPhase {
    #[default]
    Running,
    /// Offline status sent and disconnect requested; waiting for the
    /// outbound queue to empty.
    Draining,
    AwaitingDisconnect,
    Closed,
}

/// Combined view reported by [`Connector::state`](super::Connector::state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NetworkDown,
    AwaitingAddress,
    AddressResolving,
    AddressResolved,
    ResolveFailed,
    BrokerConnecting,
    BrokerConnected,
    DrainingQueue,
    AwaitingDisconnect,
    Closed,
}

impl ConnectionState {
    pub(crate) fn combine(link: LinkState, shutdown: ShutdownPhase) -> Self {
        match shutdown {
            ShutdownPhase::Draining => return ConnectionState::DrainingQueue,
            ShutdownPhase::AwaitingDisconnect => return ConnectionState::AwaitingDisconnect,
            ShutdownPhase::Closed => return ConnectionState::Closed,
            ShutdownPhase::Running => {}
        }
        match link {
            LinkState::NetworkDown => ConnectionState::NetworkDown,
            LinkState::AwaitingAddress => ConnectionState::AwaitingAddress,
            LinkState::AddressResolving => ConnectionState::AddressResolving,
            LinkState::AddressResolved => ConnectionState::AddressResolved,
            LinkState::ResolveFailed => ConnectionState::ResolveFailed,
            LinkState::BrokerConnecting => ConnectionState::BrokerConnecting,
            LinkState::BrokerConnected => ConnectionState::BrokerConnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What one [`Connector::run`](super::Connector::run) call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Idle,
    Connected,
    Disconnected,
}
