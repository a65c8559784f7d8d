//! Types for PIN scanning

use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Highest code representable as a 4-digit PIN
pub const MAX_PIN: u16 = 9999;

/// Response marker for an accepted PIN
pub(crate) const HASH_VALID: &str = "Hash valid";
/// Response marker for a rejected PIN
pub(crate) const HASH_INVALID: &str = "Hash invalid";

/// A 4-digit candidate PIN
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pin(u16);

impl Pin {
    pub fn new(value: u16) -> Result<Self, FinderError> {
        if value > MAX_PIN {
            return Err(FinderError::PinOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Classification of a device response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinStatus {
    /// Device reported "Hash valid"
    Valid,
    /// Device reported "Hash invalid"
    Invalid,
    /// Neither marker present (yet)
    Unknown,
}

impl PinStatus {
    pub fn classify(response: &str) -> Self {
        if response.contains(HASH_VALID) {
            Self::Valid
        } else if response.contains(HASH_INVALID) {
            Self::Invalid
        } else {
            Self::Unknown
        }
    }
}

/// Inclusive range of candidate PINs. `start > stop` is a valid, empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRange {
    start: u16,
    stop: u16,
}

impl ScanRange {
    pub fn new(start: u16, stop: u16) -> Result<Self, FinderError> {
        if start > MAX_PIN || stop > MAX_PIN {
            return Err(FinderError::InvalidRange { start, stop });
        }
        Ok(Self { start, stop })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn stop(&self) -> u16 {
        self.stop
    }

    pub fn len(&self) -> usize {
        self.iter().len()
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.stop
    }

    /// Candidates in ascending order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Pin> {
        let range: RangeInclusive<u16> = self.start..=self.stop;
        range.map(Pin)
    }
}

impl Default for ScanRange {
    fn default() -> Self {
        Self { start: 0, stop: 1999 }
    }
}

/// How long to wait for the device after sending a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Sleep once, then read
    Fixed(Duration),
    /// Re-read every `interval` until the response is conclusive or `deadline` passes
    Poll { interval: Duration, deadline: Duration },
}

impl Default for Settle {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(100))
    }
}

/// What happens to the receive buffer between probes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferPolicy {
    /// Clear before every command so stale replies cannot match
    #[default]
    ResetPerProbe,
    /// Keep everything received during the scan
    Accumulate,
}

/// Engine settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinderConfig {
    pub settle: Settle,
    pub buffer: BufferPolicy,
}

/// Terminal state of a scan
#[derive(Debug)]
pub enum ScanOutcome {
    Found(Pin),
    Exhausted,
    Stopped,
    Failed(FinderError),
}

impl ScanOutcome {
    pub fn found(&self) -> Option<Pin> {
        match self {
            Self::Found(pin) => Some(*pin),
            _ => None,
        }
    }
}

/// Errors that can occur while scanning
#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    /// Transport layer error (open, read, write)
    #[error("serial communication error: {0}")]
    Transport(String),
    /// Response bytes were not valid UTF-8
    #[error("response is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
    #[error("PIN {0} does not fit in 4 digits")]
    PinOutOfRange(u16),
    #[error("scan range {start}..={stop} exceeds 9999")]
    InvalidRange { start: u16, stop: u16 },
}

impl FinderError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
