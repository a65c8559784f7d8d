//! Status events emitted while scanning

use std::fmt;

use log::{error, info, warn};

use crate::types::Pin;

/// Something worth reporting to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    PortOpened { port: String },
    PortClosed { port: String },
    Trying(Pin),
    CodeFound(Pin),
    CodeInvalid(Pin),
    NoResponse(Pin),
    Stopped,
    Exhausted { start: u16, stop: u16 },
    TransportError(String),
    UnexpectedError(String),
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortOpened { port } => write!(f, "Opened serial port {port}"),
            Self::PortClosed { port } => write!(f, "Closed serial port {port}"),
            Self::Trying(pin) => write!(f, "Trying code: {pin}"),
            Self::CodeFound(pin) => write!(f, "Code found: {pin}"),
            Self::CodeInvalid(pin) => write!(f, "Code {pin} is invalid."),
            Self::NoResponse(pin) => {
                write!(f, "No conclusive response for code {pin}, moving on")
            }
            Self::Stopped => write!(f, "Process stopped by user."),
            Self::Exhausted { start, stop } => {
                write!(f, "No valid code in range {start:04}..={stop:04}")
            }
            Self::TransportError(msg) => write!(f, "Serial communication error: {msg}"),
            Self::UnexpectedError(msg) => write!(f, "An unexpected error occurred: {msg}"),
        }
    }
}

/// Receiver of scan status events, injected into the finder
pub trait EventSink {
    fn info(&mut self, event: ScanEvent);
    fn warning(&mut self, event: ScanEvent);
    fn error(&mut self, event: ScanEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn info(&mut self, event: ScanEvent) {
        info!("{event}");
    }

    fn warning(&mut self, event: ScanEvent) {
        warn!("{event}");
    }

    fn error(&mut self, event: ScanEvent) {
        error!("{event}");
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn info(&mut self, event: ScanEvent) {
        (**self).info(event);
    }

    fn warning(&mut self, event: ScanEvent) {
        (**self).warning(event);
    }

    fn error(&mut self, event: ScanEvent) {
        (**self).error(event);
    }
}
