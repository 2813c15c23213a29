//! Peer registry implementation
//!
//! The central registry that owns every peer, enforces the group invariants
//! and links/unlinks peers as they come and go.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use spin::Mutex;

use super::config::RegistryConfig;
use super::entry::{Peer, PeerHandle, PeerInfo};
use super::error::CreateError;
use crate::address::{self, PeerAddress};
use crate::span::Span;

static GLOBAL: spin::Once<Arc<PeerRegistry>> = spin::Once::new();

/// Links a new peer installs on commit
///
/// Built while scanning the group; nothing in the registry is mutated until
/// the whole scan has succeeded.
#[derive(Debug, Default)]
struct LinkPlan {
    /// Existing peer that becomes the new peer's twin
    twin: Option<PeerHandle>,
    /// Existing peer whose monitor becomes the new peer
    monitored: Option<PeerHandle>,
}

/// Registry of all local peers
///
/// A single spin lock guards the peer map and every peer's links. The lock is
/// held for whole scan-and-mutate sequences and never across a span callback.
pub struct PeerRegistry {
    /// Map of handle to peer entry
    pub(super) peers: Mutex<HashMap<PeerHandle, Peer>>,

    /// Next handle value to hand out
    next_handle: AtomicU64,

    /// Configuration
    config: RegistryConfig,
}

impl PeerRegistry {
    /// Create a new peer registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new peer registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            config,
        }
    }

    /// Process-wide registry shared by every local driver
    pub fn global() -> Arc<PeerRegistry> {
        Arc::clone(GLOBAL.call_once(|| Arc::new(PeerRegistry::new())))
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a peer for `span` from a `K:I` or `K:I:M` address
    ///
    /// Without a monitor id the new peer twins with the one free non-monitor
    /// peer of its group, if there is one. With a monitor id it becomes the
    /// monitor of the group peer with that id; a missing target is not an
    /// error and leaves the peer unlinked.
    ///
    /// On error the registry is left untouched.
    pub fn create(&self, span: &Arc<dyn Span>, address: &str) -> Result<PeerHandle, CreateError> {
        let address = address::parse(address).map_err(|e| {
            tracing::warn!(span = span.name(), error = %e, "Rejected local span address");
            CreateError::from(e)
        })?;

        let handle = PeerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let peer = Peer::new(&address, Arc::downgrade(span));

        let result = {
            let mut peers = self.peers.lock();
            self.plan_links(&peers, &address).map(|plan| {
                Self::commit(&mut peers, handle, peer, &plan);
                plan
            })
        };

        match result {
            Ok(plan) => {
                tracing::info!(
                    span = span.name(),
                    key = address.key,
                    id = address.id,
                    monitor = ?address.monitor_id,
                    handle = %handle,
                    twin = ?plan.twin,
                    monitoring = ?plan.monitored,
                    "Local peer created"
                );
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(
                    span = span.name(),
                    key = address.key,
                    id = address.id,
                    error = %e,
                    "Local peer rejected"
                );
                Err(e)
            }
        }
    }

    /// Scan the new peer's group and work out which links it gets
    fn plan_links(
        &self,
        peers: &HashMap<PeerHandle, Peer>,
        address: &PeerAddress,
    ) -> Result<LinkPlan, CreateError> {
        if !self.config.has_capacity(peers.len()) {
            return Err(CreateError::AllocationFailure {
                limit: self.config.max_peers,
            });
        }

        let key = address.key;

        // Duplicates take precedence over slot conflicts
        if peers
            .values()
            .any(|peer| peer.key == key && peer.id == address.id)
        {
            return Err(CreateError::DuplicateId {
                key: address.key,
                id: address.id,
            });
        }

        let mut plan = LinkPlan::default();

        for (&handle, peer) in peers.iter().filter(|(_, peer)| peer.key == key) {
            match address.monitor_id {
                None => {
                    if !peer.accepts_twin() {
                        continue;
                    }
                    // A second free peer would leave the new one with two twins
                    if plan.twin.is_some() {
                        return Err(CreateError::TwinSlotOccupied {
                            key: address.key,
                            id: address.id,
                        });
                    }
                    plan.twin = Some(handle);
                }
                Some(target) if peer.id == target => {
                    if peer.monitor_source.is_some() {
                        return Err(CreateError::MonitorSlotOccupied {
                            key: address.key,
                            id: target,
                        });
                    }
                    plan.monitored = Some(handle);
                }
                Some(_) => {}
            }
        }

        Ok(plan)
    }

    /// Install a validated plan and insert the new peer
    fn commit(
        peers: &mut HashMap<PeerHandle, Peer>,
        handle: PeerHandle,
        mut peer: Peer,
        plan: &LinkPlan,
    ) {
        if let Some(twin) = plan.twin {
            if let Some(other) = peers.get_mut(&twin) {
                other.twin = Some(handle);
                peer.twin = Some(twin);
            }
        }
        if let Some(monitored) = plan.monitored {
            if let Some(other) = peers.get_mut(&monitored) {
                other.monitor_source = Some(handle);
            }
        }
        peers.insert(handle, peer);
    }

    /// Destroy a peer, clearing every link other peers hold to it
    ///
    /// Destroying an unknown handle is a no-op. Returns true if a peer was
    /// removed.
    pub fn destroy(&self, handle: PeerHandle) -> bool {
        let (removed, unlinked) = {
            let mut peers = self.peers.lock();
            match peers.remove(&handle) {
                Some(peer) => {
                    let unlinked = peers
                        .values_mut()
                        .map(|other| other.unlink(handle))
                        .filter(|&cleared| cleared)
                        .count();
                    (peer, unlinked)
                }
                None => {
                    drop(peers);
                    tracing::debug!(handle = %handle, "Destroy of unknown local peer ignored");
                    return false;
                }
            }
        };

        tracing::info!(
            key = removed.key,
            id = removed.id,
            handle = %handle,
            unlinked = unlinked,
            "Local peer destroyed"
        );

        true
    }

    /// Remove every peer
    ///
    /// Used when the transport shuts down with peers still registered.
    /// Returns the number of peers removed.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.peers.lock());
        let count = drained.len();

        if count > 0 {
            tracing::warn!(peers = count, "Force-cleared local peers");
        }

        count
    }

    /// Get a snapshot of a peer
    pub fn info(&self, handle: PeerHandle) -> Option<PeerInfo> {
        self.peers.lock().get(&handle).map(|peer| peer.info(handle))
    }

    /// Current twin of a peer
    pub fn twin_of(&self, handle: PeerHandle) -> Option<PeerHandle> {
        self.peers.lock().get(&handle).and_then(|peer| peer.twin)
    }

    /// Peer receiving a copy of this peer's traffic
    pub fn monitor_of(&self, handle: PeerHandle) -> Option<PeerHandle> {
        self.peers
            .lock()
            .get(&handle)
            .and_then(|peer| peer.monitor_source)
    }

    /// Find a peer by group key and id
    pub fn find(&self, key: u8, id: u8) -> Option<PeerHandle> {
        self.peers
            .lock()
            .iter()
            .find(|(_, peer)| peer.key == key && peer.id == id)
            .map(|(&handle, _)| handle)
    }

    /// Snapshot of every peer, ordered by group key and id
    pub fn peers(&self) -> Vec<PeerInfo> {
        let mut infos: Vec<PeerInfo> = self
            .peers
            .lock()
            .iter()
            .map(|(&handle, peer)| peer.info(handle))
            .collect();
        infos.sort_by_key(|info| (info.key, info.id));
        infos
    }

    /// Check whether a handle is registered
    pub fn contains(&self, handle: PeerHandle) -> bool {
        self.peers.lock().contains_key(&handle)
    }

    /// Get total number of peers
    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    /// Check whether the registry holds no peers
    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
