//! Dynamic span driver registration
//!
//! The host's dynamic-span framework knows transports only through the
//! [`DynamicDriver`] callbacks. [`LocalDriver`] is the in-host loopback
//! transport backed by a [`PeerRegistry`]; [`SpanHost`] keeps the drivers
//! registered by name and refuses to drop one that still has live peers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use spin::{Mutex, RwLock};

use crate::registry::{CreateError, Frame, PeerHandle, PeerRegistry};
use crate::span::Span;

/// Error type for driver registration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// A driver with this name is already registered
    #[error("driver {0:?} already registered")]
    AlreadyRegistered(String),
    /// No driver with this name is registered
    #[error("driver {0:?} not registered")]
    NotRegistered(String),
    /// Driver still has live peers
    #[error("driver {name:?} still has {users} users")]
    InUse { name: String, users: usize },
}

/// Callbacks a span provider exposes to the host
pub trait DynamicDriver: Send + Sync {
    /// Short name the driver registers under
    fn name(&self) -> &str;

    /// Attach a span to the transport; `None` on any error
    fn create(&self, span: &Arc<dyn Span>, address: &str) -> Option<PeerHandle>;

    /// Detach a span from the transport
    fn destroy(&self, handle: PeerHandle);

    /// Send a frame from a span, returning how many spans received it
    fn transmit(&self, handle: PeerHandle, data: &[u8]) -> usize;

    /// Whether the driver implements [`flush`](DynamicDriver::flush)
    fn supports_flush(&self) -> bool {
        false
    }

    /// Push out anything the driver holds for a span
    fn flush(&self, _handle: PeerHandle) {}

    /// Number of live spans using the driver
    fn users(&self) -> usize;
}

/// Loopback transport linking spans within this process
///
/// The registry may be shared with other drivers, so the driver tracks the
/// handles it created and only ever counts or destroys those.
pub struct LocalDriver {
    registry: Arc<PeerRegistry>,
    owned: Mutex<HashSet<PeerHandle>>,
}

impl LocalDriver {
    /// Create a driver on the process-wide registry
    pub fn new() -> Self {
        Self::with_registry(PeerRegistry::global())
    }

    /// Create a driver on a specific registry
    pub fn with_registry(registry: Arc<PeerRegistry>) -> Self {
        Self {
            registry,
            owned: Mutex::new(HashSet::new()),
        }
    }

    /// Registry backing this driver
    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    /// Attach a span, keeping the reason on failure
    pub fn try_create(
        &self,
        span: &Arc<dyn Span>,
        address: &str,
    ) -> Result<PeerHandle, CreateError> {
        let handle = self.registry.create(span, address)?;
        self.owned.lock().insert(handle);
        Ok(handle)
    }

    /// Whether this driver created the peer behind `handle`
    pub fn owns(&self, handle: PeerHandle) -> bool {
        self.owned.lock().contains(&handle)
    }

    /// Destroy every peer this driver created
    ///
    /// Peers created by other drivers on the same registry are left alone.
    /// Returns the number of peers that were still registered.
    pub fn shutdown(&self) -> usize {
        let handles = std::mem::take(&mut *self.owned.lock());
        let destroyed = handles
            .into_iter()
            .filter(|&handle| self.registry.destroy(handle))
            .count();
        tracing::info!(driver = self.name(), destroyed = destroyed, "Local driver shut down");
        destroyed
    }
}

impl Default for LocalDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicDriver for LocalDriver {
    fn name(&self) -> &str {
        &self.registry.config().provider_name
    }

    fn create(&self, span: &Arc<dyn Span>, address: &str) -> Option<PeerHandle> {
        self.try_create(span, address).ok()
    }

    fn destroy(&self, handle: PeerHandle) {
        if !self.owned.lock().remove(&handle) {
            tracing::debug!(
                driver = self.name(),
                handle = %handle,
                "Destroy of foreign handle ignored"
            );
            return;
        }
        self.registry.destroy(handle);
    }

    fn transmit(&self, handle: PeerHandle, data: &[u8]) -> usize {
        self.registry.transmit(handle, &Frame::copy_from_slice(data))
    }

    fn users(&self) -> usize {
        // Drop handles someone else removed from the registry behind our back
        let mut owned = self.owned.lock();
        owned.retain(|&handle| self.registry.contains(handle));
        owned.len()
    }
}

/// Host-side table of registered span drivers
#[derive(Default)]
pub struct SpanHost {
    drivers: RwLock<HashMap<String, Arc<dyn DynamicDriver>>>,
}

impl SpanHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under its name
    pub fn register(&self, driver: Arc<dyn DynamicDriver>) -> Result<(), HostError> {
        let name = driver.name().to_string();
        let mut drivers = self.drivers.write();

        if drivers.contains_key(&name) {
            return Err(HostError::AlreadyRegistered(name));
        }
        drivers.insert(name.clone(), driver);
        drop(drivers);

        tracing::info!(driver = %name, "Dynamic span driver registered");
        Ok(())
    }

    /// Unregister a driver that has no live users
    pub fn unregister(&self, name: &str) -> Result<Arc<dyn DynamicDriver>, HostError> {
        let mut drivers = self.drivers.write();

        let users = drivers
            .get(name)
            .map(|driver| driver.users())
            .ok_or_else(|| HostError::NotRegistered(name.to_string()))?;
        if users > 0 {
            return Err(HostError::InUse {
                name: name.to_string(),
                users,
            });
        }

        let driver = drivers
            .remove(name)
            .ok_or_else(|| HostError::NotRegistered(name.to_string()))?;
        drop(drivers);

        tracing::info!(driver = %name, "Dynamic span driver unregistered");
        Ok(driver)
    }

    /// Look up a driver by name
    pub fn driver(&self, name: &str) -> Option<Arc<dyn DynamicDriver>> {
        self.drivers.read().get(name).cloned()
    }

    /// Names of all registered drivers, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.read().keys().cloned().collect();
        names.sort();
        names
    }
}
