//! Frame routing between linked peers
//!
//! A transmitted frame goes to the transmitting peer's twin and to its
//! monitor. Targets are resolved under the registry lock, which is released
//! before any span callback runs.

use std::sync::Arc;

use super::entry::PeerHandle;
use super::frame::Frame;
use super::store::PeerRegistry;
use crate::span::Span;

/// Spans a frame from one peer is delivered to
struct Route {
    twin: Option<Arc<dyn Span>>,
    monitor: Option<Arc<dyn Span>>,
}

impl PeerRegistry {
    /// Resolve the current twin and monitor spans of a peer
    fn resolve_route(&self, handle: PeerHandle) -> Option<Route> {
        let peers = self.peers.lock();
        let peer = peers.get(&handle)?;

        let span_of = |link: Option<PeerHandle>| {
            link.and_then(|h| peers.get(&h))
                .and_then(|target| target.span())
        };

        Some(Route {
            twin: span_of(peer.twin),
            monitor: span_of(peer.monitor_source),
        })
    }

    /// Forward a frame from a peer to its twin and monitor
    ///
    /// Delivery is synchronous and fire-and-forget: spans that are gone, not
    /// live, or fail to take the frame are skipped. Returns the number of
    /// spans that accepted the frame; an unknown handle delivers nothing.
    pub fn transmit(&self, handle: PeerHandle, frame: &Frame) -> usize {
        let Some(route) = self.resolve_route(handle) else {
            tracing::trace!(handle = %handle, "Transmit on unknown local peer");
            return 0;
        };

        let targets = [("twin", route.twin), ("monitor", route.monitor)];

        let mut delivered = 0;
        for (role, span) in targets {
            let Some(span) = span else { continue };
            if !span.is_live() {
                continue;
            }

            match span.receive(frame) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        handle = %handle,
                        span = span.name(),
                        role = role,
                        error = %e,
                        "Local delivery failed"
                    );
                }
            }
        }

        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::registry::testing::RecordingSpan;
    use crate::span::{ChannelSpan, DeliveryError};

    fn create(registry: &PeerRegistry, span: &Arc<RecordingSpan>, address: &str) -> PeerHandle {
        let span: Arc<dyn Span> = span.clone();
        registry.create(&span, address).unwrap()
    }

    #[test]
    fn test_twins_exchange_frames() {
        let registry = PeerRegistry::new();
        let span1 = RecordingSpan::new("span1");
        let span2 = RecordingSpan::new("span2");

        let a = create(&registry, &span1, "1:0");
        let b = create(&registry, &span2, "1:1");

        assert_eq!(registry.transmit(a, &Frame::from_static(b"to b")), 1);
        assert_eq!(registry.transmit(b, &Frame::from_static(b"to a")), 1);

        assert_eq!(span2.frames(), vec![Frame::from_static(b"to b")]);
        assert_eq!(span1.frames(), vec![Frame::from_static(b"to a")]);
    }

    #[test]
    fn test_third_peer_delivers_nowhere() {
        let registry = PeerRegistry::new();
        let spans: Vec<_> = (0..3)
            .map(|i| RecordingSpan::new(format!("span{i}")))
            .collect();

        create(&registry, &spans[0], "1:0");
        create(&registry, &spans[1], "1:1");
        let c = create(&registry, &spans[2], "1:2");

        assert_eq!(registry.transmit(c, &Frame::from_static(b"x")), 0);
        assert!(spans.iter().all(|span| span.count() == 0));
    }

    #[test]
    fn test_monitor_receives_copy() {
        let registry = PeerRegistry::new();
        let span0 = RecordingSpan::new("span0");
        let span1 = RecordingSpan::new("span1");
        let span4 = RecordingSpan::new("span4");

        let a = create(&registry, &span0, "1:0");
        let b = create(&registry, &span1, "1:1");
        create(&registry, &span4, "1:3:1");

        let frame = Frame::from_static(b"through 1");
        assert_eq!(registry.transmit(b, &frame), 2);
        assert_eq!(span0.frames(), vec![frame.clone()]);
        assert_eq!(span4.frames(), vec![frame]);

        // Peer 0 has no monitor
        assert_eq!(registry.transmit(a, &Frame::from_static(b"through 0")), 1);
        assert_eq!(span4.count(), 1);
        assert_eq!(span1.count(), 1);
    }

    #[test]
    fn test_transmit_after_twin_destroyed() {
        let registry = PeerRegistry::new();
        let span0 = RecordingSpan::new("span0");
        let span1 = RecordingSpan::new("span1");

        let a = create(&registry, &span0, "1:0");
        let b = create(&registry, &span1, "1:1");
        registry.destroy(a);

        assert_eq!(registry.transmit(b, &Frame::from_static(b"x")), 0);
        assert_eq!(registry.transmit(a, &Frame::from_static(b"x")), 0);
        assert_eq!(span0.count(), 0);
    }

    #[test]
    fn test_dropped_span_is_skipped() {
        let registry = PeerRegistry::new();
        let span0 = RecordingSpan::new("span0");
        let span1 = RecordingSpan::new("span1");

        let a = create(&registry, &span0, "1:0");
        create(&registry, &span1, "1:1");

        // Peer outlives its span until the host destroys it
        drop(span1);
        assert_eq!(registry.transmit(a, &Frame::from_static(b"x")), 0);
    }

    #[test]
    fn test_stopped_span_is_skipped() {
        let registry = PeerRegistry::new();
        let span0 = RecordingSpan::new("span0");
        let span1 = RecordingSpan::new("span1");

        let a = create(&registry, &span0, "1:0");
        create(&registry, &span1, "1:1");

        span1.set_live(false);
        assert_eq!(registry.transmit(a, &Frame::from_static(b"x")), 0);
        assert_eq!(span1.count(), 0);

        span1.set_live(true);
        assert_eq!(registry.transmit(a, &Frame::from_static(b"x")), 1);
    }

    #[test]
    fn test_delivery_error_not_surfaced() {
        let registry = PeerRegistry::new();
        let span0 = RecordingSpan::new("span0");
        let span1 = RecordingSpan::new("span1");
        let span2 = RecordingSpan::new("span2");

        create(&registry, &span0, "1:0");
        let b = create(&registry, &span1, "1:1");
        create(&registry, &span2, "1:2:1");

        span0.set_reject(true);
        assert_eq!(registry.transmit(b, &Frame::from_static(b"x")), 1);
        assert_eq!(span2.count(), 1);
    }

    /// Span that destroys its own peer from inside the receive callback
    struct SelfDestructSpan {
        registry: Arc<PeerRegistry>,
        handle: Mutex<Option<PeerHandle>>,
    }

    impl Span for SelfDestructSpan {
        fn name(&self) -> &str {
            "self-destruct"
        }

        fn receive(&self, _frame: &Frame) -> Result<(), DeliveryError> {
            if let Some(handle) = self.handle.lock().unwrap().take() {
                self.registry.destroy(handle);
            }
            Ok(())
        }
    }

    #[test]
    fn test_receive_callback_may_reenter_registry() {
        let registry = Arc::new(PeerRegistry::new());
        let sender = RecordingSpan::new("sender");
        let receiver = Arc::new(SelfDestructSpan {
            registry: Arc::clone(&registry),
            handle: Mutex::new(None),
        });

        let a = create(&registry, &sender, "1:0");
        let receiver_dyn: Arc<dyn Span> = receiver.clone();
        let b = registry.create(&receiver_dyn, "1:1").unwrap();
        *receiver.handle.lock().unwrap() = Some(b);

        assert_eq!(registry.transmit(a, &Frame::from_static(b"bye")), 1);
        assert!(!registry.contains(b));
        assert_eq!(registry.twin_of(a), None);
    }

    #[tokio::test]
    async fn test_channel_span_route() {
        let registry = PeerRegistry::new();
        let (span0, _rx0) = ChannelSpan::new("span0", 8);
        let (span1, mut rx1) = ChannelSpan::new("span1", 8);
        let span0: Arc<dyn Span> = span0;
        let span1: Arc<dyn Span> = span1;

        let a = registry.create(&span0, "2:0").unwrap();
        registry.create(&span1, "2:1").unwrap();

        registry.transmit(a, &Frame::from_static(&[0x7e, 0x01]));

        let frame = rx1.recv().await.unwrap();
        assert_eq!(frame, Frame::from_static(&[0x7e, 0x01]));

        // Closed receiver makes the span not live
        drop(rx1);
        assert_eq!(registry.transmit(a, &Frame::from_static(b"x")), 0);
    }
}
