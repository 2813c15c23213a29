//! Test spans

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::frame::Frame;
use crate::span::{DeliveryError, Span};

/// Span that records every frame it receives
pub(crate) struct RecordingSpan {
    name: String,
    frames: Mutex<Vec<Frame>>,
    live: AtomicBool,
    reject: AtomicBool,
}

impl RecordingSpan {
    pub(crate) fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            frames: Mutex::new(Vec::new()),
            live: AtomicBool::new(true),
            reject: AtomicBool::new(false),
        })
    }

    pub(crate) fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub(crate) fn count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub(crate) fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub(crate) fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

impl Span for RecordingSpan {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn receive(&self, frame: &Frame) -> Result<(), DeliveryError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected("test".to_string()));
        }
        self.frames.lock().unwrap().push(frame.clone());
        Ok(())
    }
}
