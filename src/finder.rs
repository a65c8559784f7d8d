use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::events::{EventSink, ScanEvent};
use crate::transport::PinTransport;
use crate::types::{
    BufferPolicy, FinderConfig, FinderError, Pin, PinStatus, ScanOutcome, ScanRange, Settle,
};

/// Shared cancellation flag, polled once per candidate.
///
/// The finder never clears it; whoever calls [`StopHandle::stop`] owns the flag.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Brute-forces the unlock PIN over a [`PinTransport`]
pub struct CodeFinder<T: PinTransport, S: EventSink> {
    transport: T,
    sink: S,
    config: FinderConfig,
    rx: String,
    // Trailing bytes of a UTF-8 sequence split across reads
    partial: Vec<u8>,
    code: Option<Pin>,
    stop: StopHandle,
}

impl<T: PinTransport, S: EventSink> CodeFinder<T, S> {
    const VERIFY_COMMAND: &'static str = "TpPvVerifyPin";

    /// Create a finder with the default settle delay and buffer policy
    pub fn new(transport: T, sink: S) -> Self {
        Self::with_config(transport, sink, FinderConfig::default())
    }

    pub fn with_config(transport: T, sink: S, config: FinderConfig) -> Self {
        Self {
            transport,
            sink,
            config,
            rx: String::new(),
            partial: Vec::new(),
            code: None,
            stop: StopHandle::new(),
        }
    }

    /// Replace the cancellation flag with one owned by an external controller
    #[must_use]
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Get a clone of the cancellation flag for signal handling
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// PIN accepted by the device during the last scan, if any
    pub fn found_code(&self) -> Option<Pin> {
        self.code
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Event sink passed at construction
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Whether the connection is currently open
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Open the connection unless it already is
    pub fn open(&mut self) -> Result<(), FinderError> {
        if self.transport.is_open() {
            return Ok(());
        }

        self.transport.open().map_err(transport_error)?;
        self.sink.info(ScanEvent::PortOpened {
            port: self.transport.name().to_string(),
        });
        Ok(())
    }

    /// Close the connection if open. Never fails; close errors are reported as events.
    pub fn close(&mut self) {
        if !self.transport.is_open() {
            return;
        }

        match self.transport.close() {
            Ok(()) => self.sink.info(ScanEvent::PortClosed {
                port: self.transport.name().to_string(),
            }),
            Err(e) => self.sink.error(ScanEvent::TransportError(e.to_string())),
        }
    }

    /// Send a command line to the device
    pub fn send_command(&mut self, command: &str) -> Result<(), FinderError> {
        let line = format!("{command}\n");
        self.transport
            .write(line.as_bytes())
            .map_err(transport_error)?;
        debug!("Sent command: {command}");
        Ok(())
    }

    /// Append whatever the device has sent to the receive buffer and return the whole buffer
    pub fn read_response(&mut self) -> Result<&str, FinderError> {
        let read = self
            .transport
            .read_available(&mut self.partial)
            .map_err(transport_error)?;

        if read > 0 {
            match std::str::from_utf8(&self.partial) {
                Ok(text) => {
                    self.rx.push_str(text);
                    self.partial.clear();
                }
                // Incomplete sequence at the end, keep it for the next read
                Err(e) if e.error_len().is_none() => {
                    let valid = e.valid_up_to();
                    self.rx.push_str(std::str::from_utf8(&self.partial[..valid])?);
                    self.partial.drain(..valid);
                }
                Err(e) => {
                    self.partial.clear();
                    return Err(e.into());
                }
            }
        }

        debug!("Received response: {:?}", self.rx);
        Ok(&self.rx)
    }

    /// Ask the device whether `pin` unlocks it
    pub fn verify_pin(&mut self, pin: Pin) -> Result<PinStatus, FinderError> {
        if self.config.buffer == BufferPolicy::ResetPerProbe {
            self.rx.clear();
            self.partial.clear();
        }

        self.send_command(&format!("{}({pin})", Self::VERIFY_COMMAND))?;

        match self.config.settle {
            Settle::Fixed(delay) => {
                std::thread::sleep(delay);
                Ok(PinStatus::classify(self.read_response()?))
            }
            Settle::Poll { interval, deadline } => {
                let start = Instant::now();
                loop {
                    std::thread::sleep(interval);
                    let status = PinStatus::classify(self.read_response()?);
                    if status != PinStatus::Unknown || start.elapsed() >= deadline {
                        return Ok(status);
                    }
                }
            }
        }
    }

    /// Try every PIN in `start..=stop` until one is accepted.
    ///
    /// Failures end the scan and are reported to the sink, never returned as `Err`.
    /// The connection is closed on every path out of this function.
    pub fn find_code(&mut self, start: u16, stop: u16) -> ScanOutcome {
        let outcome = match ScanRange::new(start, stop).and_then(|range| self.scan(range)) {
            Ok(outcome) => outcome,
            Err(e) => {
                let event = match &e {
                    FinderError::Transport(msg) => ScanEvent::TransportError(msg.clone()),
                    other => ScanEvent::UnexpectedError(other.to_string()),
                };
                self.sink.error(event);
                ScanOutcome::Failed(e)
            }
        };

        self.close();
        outcome
    }

    fn scan(&mut self, range: ScanRange) -> Result<ScanOutcome, FinderError> {
        self.rx.clear();
        self.partial.clear();
        self.code = None;
        self.open()?;

        for pin in range.iter() {
            if self.stop.is_stopped() {
                self.sink.info(ScanEvent::Stopped);
                return Ok(ScanOutcome::Stopped);
            }

            self.sink.info(ScanEvent::Trying(pin));
            match self.verify_pin(pin)? {
                PinStatus::Valid => {
                    self.code = Some(pin);
                    self.sink.info(ScanEvent::CodeFound(pin));
                    return Ok(ScanOutcome::Found(pin));
                }
                PinStatus::Invalid => self.sink.info(ScanEvent::CodeInvalid(pin)),
                PinStatus::Unknown => self.sink.warning(ScanEvent::NoResponse(pin)),
            }
        }

        self.sink.info(ScanEvent::Exhausted {
            start: range.start(),
            stop: range.stop(),
        });
        Ok(ScanOutcome::Exhausted)
    }
}

fn transport_error<E: std::fmt::Display>(e: E) -> FinderError {
    FinderError::Transport(e.to_string())
}
