//! Peer entry and handle types
//!
//! This module defines the per-peer state stored in the registry. Peers never
//! point at each other directly; links are stored as [`PeerHandle`]s and
//! resolved through the registry under its lock.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::address::PeerAddress;
use crate::span::Span;

/// Opaque identifier of a registered peer
///
/// Handles are allocated from a monotonically increasing counter and never
/// reused, so a stale handle can only ever miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerHandle(pub(super) u64);

impl PeerHandle {
    /// Raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.as_u64())
    }
}

/// Entry for a single peer in the registry
pub(super) struct Peer {
    /// Group key
    pub key: u8,

    /// Id within the group
    pub id: u8,

    /// Group id this peer monitors (set only for monitor peers)
    pub monitors: Option<u8>,

    /// Span this peer belongs to; not owned by the registry
    pub span: Weak<dyn Span>,

    /// Bidirectional read/write partner
    pub twin: Option<PeerHandle>,

    /// Peer receiving a copy of this peer's traffic
    pub monitor_source: Option<PeerHandle>,
}

impl Peer {
    pub(super) fn new(address: &PeerAddress, span: Weak<dyn Span>) -> Self {
        Self {
            key: address.key,
            id: address.id,
            monitors: address.monitor_id,
            span,
            twin: None,
            monitor_source: None,
        }
    }

    /// Whether this peer may become a twin of a newly created peer
    ///
    /// Monitors only take a read-only copy of their target's traffic, so they
    /// never hold a read/write twin.
    pub(super) fn accepts_twin(&self) -> bool {
        self.monitors.is_none() && self.twin.is_none()
    }

    /// Owning span, if the host has not dropped it
    ///
    /// Only upgrades the weak reference; callers check [`Span::is_live`]
    /// after releasing the registry lock.
    pub(super) fn span(&self) -> Option<Arc<dyn Span>> {
        self.span.upgrade()
    }

    /// Drop any link pointing at `target`
    ///
    /// Returns true if a link was cleared.
    pub(super) fn unlink(&mut self, target: PeerHandle) -> bool {
        let mut cleared = false;
        if self.twin == Some(target) {
            self.twin = None;
            cleared = true;
        }
        if self.monitor_source == Some(target) {
            self.monitor_source = None;
            cleared = true;
        }
        cleared
    }

    pub(super) fn info(&self, handle: PeerHandle) -> PeerInfo {
        PeerInfo {
            handle,
            key: self.key,
            id: self.id,
            monitors: self.monitors,
            twin: self.twin,
            monitor_source: self.monitor_source,
            span_alive: self.span.strong_count() > 0,
        }
    }
}

/// Snapshot of a peer's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Handle of the peer
    pub handle: PeerHandle,
    /// Group key
    pub key: u8,
    /// Id within the group
    pub id: u8,
    /// Group id this peer monitors, if it is a monitor
    pub monitors: Option<u8>,
    /// Current twin
    pub twin: Option<PeerHandle>,
    /// Current monitor receiving this peer's traffic
    pub monitor_source: Option<PeerHandle>,
    /// Whether the owning span still exists
    pub span_alive: bool,
}

impl PeerInfo {
    /// Address this peer was created with
    pub fn address(&self) -> PeerAddress {
        PeerAddress {
            key: self.key,
            id: self.id,
            monitor_id: self.monitors,
        }
    }
}
