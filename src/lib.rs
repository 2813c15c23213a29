//! # span-local
//!
//! In-host loopback transport for dynamic spans.
//!
//! A span attached to the local transport is given an address of the form
//! `K:I` or `K:I:M` (single hex digits). Spans with the same group key `K`
//! are linked pairwise as twins, so that whatever one transmits the other
//! receives. A span created with a monitor id `M` receives a copy of
//! everything transmitted by peer `M` of its group.
//!
//! ```
//! use std::sync::Arc;
//!
//! use span_local::registry::{Frame, PeerRegistry};
//! use span_local::span::{ChannelSpan, Span};
//!
//! let registry = PeerRegistry::new();
//! let (a, _a_rx) = ChannelSpan::new("a", 16);
//! let (b, mut b_rx) = ChannelSpan::new("b", 16);
//! let a: Arc<dyn Span> = a;
//! let b: Arc<dyn Span> = b;
//!
//! let pa = registry.create(&a, "1:0").unwrap();
//! let _pb = registry.create(&b, "1:1").unwrap();
//!
//! assert_eq!(registry.transmit(pa, &Frame::from_static(b"hello")), 1);
//! assert_eq!(b_rx.try_recv().unwrap(), Frame::from_static(b"hello"));
//! ```
//!
//! The host's dynamic-span framework drives the transport through the
//! [`driver::DynamicDriver`] callbacks implemented by [`driver::LocalDriver`].

pub mod address;
pub mod driver;
pub mod registry;
pub mod span;

pub use address::{AddressError, PeerAddress};
pub use driver::{DynamicDriver, HostError, LocalDriver, SpanHost};
pub use registry::{CreateError, Frame, PeerHandle, PeerInfo, PeerRegistry, RegistryConfig};
pub use span::{ChannelSpan, DeliveryError, Span};
