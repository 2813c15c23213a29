//! Local loopback example
//!
//! Run with: RUST_LOG=info cargo run --example local_loopback
//!
//! Registers the local driver with a span host, links two spans as twins,
//! attaches a monitor to the second one and prints the frames each span
//! receives.

use std::sync::Arc;

use span_local::{ChannelSpan, DynamicDriver, LocalDriver, PeerRegistry, Span, SpanHost};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let host = SpanHost::new();
    let driver = Arc::new(LocalDriver::with_registry(Arc::new(PeerRegistry::new())));
    if let Err(e) = host.register(driver.clone()) {
        eprintln!("register failed: {e}");
        return;
    }

    let Some(loc) = host.driver("loc") else {
        eprintln!("local driver missing");
        return;
    };

    let (west, mut west_rx) = ChannelSpan::new("west", 32);
    let (east, mut east_rx) = ChannelSpan::new("east", 32);
    let (tap, mut tap_rx) = ChannelSpan::new("tap", 32);
    let west: Arc<dyn Span> = west;
    let east: Arc<dyn Span> = east;
    let tap: Arc<dyn Span> = tap;

    let (Some(w), Some(e), Some(t)) = (
        loc.create(&west, "1:0"),
        loc.create(&east, "1:1"),
        loc.create(&tap, "1:2:1"),
    ) else {
        eprintln!("failed to create local peers");
        return;
    };

    for peer in driver.registry().peers() {
        println!(
            "{} {} twin={:?} monitor={:?}",
            peer.handle,
            peer.address(),
            peer.twin,
            peer.monitor_source
        );
    }

    for i in 0..3u8 {
        loc.transmit(w, &[0x10, i]);
        loc.transmit(e, &[0x20, i]);
    }

    // Delivery is synchronous, so everything is queued already
    while let Ok(frame) = east_rx.try_recv() {
        println!("east <- {:02x?}", frame.data().as_ref());
    }
    while let Ok(frame) = west_rx.try_recv() {
        println!("west <- {:02x?}", frame.data().as_ref());
    }
    while let Ok(frame) = tap_rx.try_recv() {
        println!("tap  <- {:02x?}", frame.data().as_ref());
    }

    for handle in [t, e, w] {
        loc.destroy(handle);
    }

    match host.unregister("loc") {
        Ok(_) => println!("driver unregistered, {} users left", driver.users()),
        Err(err) => eprintln!("unregister failed: {err}"),
    }
}
