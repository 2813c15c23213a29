//! Span sink contract
//!
//! Spans are owned by the host's span-management layer. The local transport
//! only holds weak references to them and calls [`Span::receive`] to hand over
//! a frame coming from a linked peer.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::registry::Frame;

/// Error returned by a span that could not take a frame
///
/// Delivery errors are never reported back to the transmitting peer; the
/// router only logs them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Receive queue is full
    #[error("span receive queue is full")]
    Full,
    /// Span is no longer accepting frames
    #[error("span is closed")]
    Closed,
    /// Span refused the frame for its own reasons
    #[error("span rejected frame: {0}")]
    Rejected(String),
}

/// Receiving side of a span, as seen by the local transport
pub trait Span: Send + Sync {
    /// Span name, used in log output
    fn name(&self) -> &str;

    /// Whether the span is registered and running
    ///
    /// Frames are only delivered to live spans.
    fn is_live(&self) -> bool {
        true
    }

    /// Deliver a received frame to the span
    ///
    /// Called without any registry lock held, so implementations may call
    /// back into the registry.
    fn receive(&self, frame: &Frame) -> Result<(), DeliveryError>;
}

/// Span that forwards received frames into a bounded tokio channel
///
/// Delivery uses `try_send`, so it never blocks the transmitting thread. A full
/// channel drops the frame with [`DeliveryError::Full`].
#[derive(Debug)]
pub struct ChannelSpan {
    name: String,
    tx: mpsc::Sender<Frame>,
}

impl ChannelSpan {
    /// Create a channel-backed span and the receiver for its frames
    pub fn new(name: impl Into<String>, capacity: usize) -> (Arc<Self>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let span = Arc::new(Self {
            name: name.into(),
            tx,
        });
        (span, rx)
    }
}

impl Span for ChannelSpan {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_live(&self) -> bool {
        !self.tx.is_closed()
    }

    fn receive(&self, frame: &Frame) -> Result<(), DeliveryError> {
        self.tx.try_send(frame.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
