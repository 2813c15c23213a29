//! Peer registry for local span linking
//!
//! The registry owns every local peer and routes frames between peers of the
//! same group. Peers refer to each other by [`PeerHandle`] only; links are
//! resolved through the registry under a single spin lock.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<PeerRegistry>
//!                     ┌─────────────────────────┐
//!                     │ peers: HashMap<Handle,  │
//!                     │   Peer {                │
//!                     │     key, id,            │
//!                     │     span: Weak<Span>,   │
//!                     │     twin,               │
//!                     │     monitor_source,     │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Span 1:0] ◄──── twin ───► [Span 1:1] ── monitor ─► [Span 1:3:1]
//!    transmit()                 receive()                receive()
//! ```
//!
//! # Locking
//!
//! `create` and `destroy` hold the lock for their whole scan-and-mutate
//! sequence. `transmit` only holds it while resolving its targets; span
//! callbacks run after it is released.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
mod router;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RegistryConfig;
pub use entry::{PeerHandle, PeerInfo};
pub use error::CreateError;
pub use frame::Frame;
pub use store::PeerRegistry;
