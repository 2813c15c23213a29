//! Peer address parsing
//!
//! A local span is configured with an address of the form `K:I` or `K:I:M`,
//! where each field is a single hexadecimal digit:
//!
//! - `K` is the group key shared by peers that may talk to each other
//! - `I` is the peer's own id within the group
//! - `M` (optional) is the id of the group peer this one monitors

use std::fmt;
use std::str::FromStr;

/// Largest value a single address field can hold
pub const MAX_FIELD: u8 = 0x0F;

/// Error type for address parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Address is neither `K:I` nor `K:I:M`
    #[error("invalid address {0:?}: expected K:I or K:I:M")]
    Length(String),
    /// A `:` is missing or misplaced
    #[error("invalid address {address:?}: expected ':' at position {position}")]
    Separator { address: String, position: usize },
    /// A field is not a hexadecimal digit
    #[error("invalid address {address:?}: non-hex digit at position {position}")]
    Digit { address: String, position: usize },
}

/// Parsed form of a local span address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress {
    /// Group key (0-15)
    pub key: u8,
    /// Peer id within the group (0-15)
    pub id: u8,
    /// Id of the group peer to monitor, if this peer is a monitor
    pub monitor_id: Option<u8>,
}

impl PeerAddress {
    /// Create a plain (non-monitoring) address
    ///
    /// Fields are single hex digits. Values above [`MAX_FIELD`] are masked to
    /// their low nibble in release builds and panic in debug builds.
    pub fn new(key: u8, id: u8) -> Self {
        debug_assert!(key <= MAX_FIELD, "group key {key} out of range");
        debug_assert!(id <= MAX_FIELD, "peer id {id} out of range");
        Self {
            key: key & MAX_FIELD,
            id: id & MAX_FIELD,
            monitor_id: None,
        }
    }

    /// Turn this address into a monitor of `target` within the same group
    ///
    /// `target` is masked like the fields of [`PeerAddress::new`].
    pub fn monitoring(mut self, target: u8) -> Self {
        debug_assert!(target <= MAX_FIELD, "monitor id {target} out of range");
        self.monitor_id = Some(target & MAX_FIELD);
        self
    }

    /// Whether this address requests monitoring
    pub fn is_monitor(&self) -> bool {
        self.monitor_id.is_some()
    }
}

/// Parse a `K:I` or `K:I:M` address
pub fn parse(address: &str) -> Result<PeerAddress, AddressError> {
    let bytes = address.as_bytes();
    if bytes.len() != 3 && bytes.len() != 5 {
        return Err(AddressError::Length(address.to_string()));
    }

    // Separators sit at every odd position, digits at every even one
    for position in (1..bytes.len()).step_by(2) {
        if bytes[position] != b':' {
            return Err(AddressError::Separator {
                address: address.to_string(),
                position,
            });
        }
    }

    let digit = |position: usize| -> Result<u8, AddressError> {
        hex_value(bytes[position]).ok_or_else(|| AddressError::Digit {
            address: address.to_string(),
            position,
        })
    };

    let key = digit(0)?;
    let id = digit(2)?;
    let monitor_id = if bytes.len() == 5 {
        Some(digit(4)?)
    } else {
        None
    };

    Ok(PeerAddress {
        key,
        id,
        monitor_id,
    })
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

impl FromStr for PeerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}:{:x}", self.key, self.id)?;
        if let Some(monitor) = self.monitor_id {
            write!(f, ":{:x}", monitor)?;
        }
        Ok(())
    }
}
