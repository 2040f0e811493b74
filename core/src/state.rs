//! Logical door states reported by the device.
//!
//! # Design
//! The client never decodes a `get` response into `DoorState` on its own:
//! `PodargosClient::state` hands back the raw envelope. These values exist
//! for callers that want to interpret the `response` string themselves.

use std::fmt;

/// Door position as a small integer-backed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DoorState {
    #[default]
    Unknown = 0,
    Closed = 1,
    Opening = 2,
    Opened = 3,
    Closing = 4,
}

impl DoorState {
    /// Map a device state string onto the enumeration. Matching is exact
    /// and anything unrecognised becomes `Unknown`.
    pub fn from_response(value: &str) -> Self {
        match value {
            "CLOSED" => DoorState::Closed,
            "OPENING" => DoorState::Opening,
            "OPENED" => DoorState::Opened,
            "CLOSING" => DoorState::Closing,
            _ => DoorState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DoorState::Unknown => "UNKNOWN",
            DoorState::Closed => "CLOSED",
            DoorState::Opening => "OPENING",
            DoorState::Opened => "OPENED",
            DoorState::Closing => "CLOSING",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DoorState> for u8 {
    fn from(state: DoorState) -> u8 {
        state as u8
    }
}
