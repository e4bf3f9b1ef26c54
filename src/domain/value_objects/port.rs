//! Listening port value object
//!
//! The port is the only runtime-tunable setting. It is resolved once, when the
//! server is launched, from an optional override and a fixed default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StagehandError, StagehandResult};

/// A non-zero TCP port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Documented default when nothing is configured
    pub const DEFAULT: Port = Port(8000);

    pub fn new(value: u16) -> StagehandResult<Self> {
        if value == 0 {
            return Err(StagehandError::InvalidPort {
                value: value.to_string(),
                reason: "port 0 is not a listening port".to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl Default for Port {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = StagehandError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Port::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Resolve the listening port.
///
/// An absent or blank override yields `default`. Anything else must be a
/// decimal port in `1..=65535`; garbage is an error rather than a silent
/// fallback.
pub fn resolve_port(override_value: Option<&str>, default: Port) -> StagehandResult<Port> {
    let Some(raw) = override_value else {
        return Ok(default);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    let invalid = || StagehandError::InvalidPort {
        value: raw.to_string(),
        reason: "expected a number between 1 and 65535".to_string(),
    };
    // u16::from_str accepts a leading '+'
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: u16 = trimmed.parse().map_err(|_| invalid())?;
    Port::new(value)
}
