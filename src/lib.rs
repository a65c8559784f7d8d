//! PIN recovery for RNS510 head units over the UART maintenance interface.
//!
//! The unit answers `TpPvVerifyPin(<pin>)` with either `Hash valid` or
//! `Hash invalid`. [`CodeFinder`] walks a range of 4-digit candidates, one
//! command at a time, until the device accepts one, the range runs out, or
//! the [`StopHandle`] is triggered.
//!
//! # Features
//!
//! - `serial` - Serial port transport for desktop using serialport crate
//! - `native-serial` - `serial` plus the `find_code` command line tool
//!
//! # Example
//!
//! ```ignore
//! use rns510_code_finder::{CodeFinder, LogSink, PortConfig, ScanOutcome, SerialTransport};
//!
//! let transport = SerialTransport::new(PortConfig::new("/dev/ttyUSB0"));
//! let mut finder = CodeFinder::new(transport, LogSink);
//!
//! if let ScanOutcome::Found(pin) = finder.find_code(0, 1999) {
//!     println!("Unlock code: {pin}");
//! }
//! ```

mod events;
mod finder;
mod transport;
mod types;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use events::{EventSink, LogSink, ScanEvent};
pub use finder::{CodeFinder, StopHandle};
pub use transport::PinTransport;
pub use types::{
    BufferPolicy, FinderConfig, FinderError, MAX_PIN, Pin, PinStatus, ScanOutcome, ScanRange,
    Settle,
};

#[cfg(feature = "serial")]
pub use serial::{DEFAULT_BAUD_RATE, PortConfig, SerialTransport};
