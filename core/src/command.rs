//! Commands understood by the Podargos device.

use std::fmt;

/// A single device action, rendered as the first path segment of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Query the current door state.
    Get,
    Open,
    Close,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Get => "get",
            Command::Open => "open",
            Command::Close => "close",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
