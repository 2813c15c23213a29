//! Frame type carried between linked peers
//!
//! Frames are cheap to clone: the payload is a `Bytes`, so every forwarded
//! copy shares the caller's allocation.

use bytes::Bytes;

/// An outbound frame handed to [`PeerRegistry::transmit`](super::PeerRegistry::transmit)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Bytes,
}

impl Frame {
    /// Wrap a frame payload
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Create a frame from static data
    pub fn from_static(data: &'static [u8]) -> Self {
        Self::new(Bytes::from_static(data))
    }

    /// Create a frame by copying a byte slice
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Frame payload
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the payload out of the frame
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Self::new(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_payload() {
        let frame = Frame::from(vec![1u8, 2, 3]);
        let copy = frame.clone();

        assert_eq!(frame, copy);
        assert_eq!(frame.data().as_ptr(), copy.data().as_ptr());
        assert_eq!(copy.len(), 3);
    }

    #[test]
    fn test_empty_frame() {
        let frame = Frame::from_static(b"");
        assert!(frame.is_empty());
        assert_eq!(frame.into_bytes(), Bytes::new());
    }
}
