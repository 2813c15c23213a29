//! Registry error types
//!
//! Error types for peer creation. Every variant is returned before the
//! registry is touched, so a failed create leaves no trace.

use crate::address::AddressError;

/// Error type for [`PeerRegistry::create`](super::PeerRegistry::create)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateError {
    /// Address string could not be parsed
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    /// Another peer already uses this id in the group
    #[error("duplicate id {id:x} in group {key:x}")]
    DuplicateId { key: u8, id: u8 },
    /// Linking would give a peer more than one twin
    #[error("twin slot occupied for {key:x}:{id:x}")]
    TwinSlotOccupied { key: u8, id: u8 },
    /// Target peer already has a monitor
    #[error("monitor slot occupied for {key:x}:{id:x}")]
    MonitorSlotOccupied { key: u8, id: u8 },
    /// Registry is at capacity
    #[error("peer limit of {limit} reached")]
    AllocationFailure { limit: usize },
}
