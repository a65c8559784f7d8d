//! Serial port transport for desktop using serialport crate

use crate::transport::PinTransport;
use log::debug;
use std::io::Read;
use std::time::Duration;

/// Default baud rate of the RNS510 maintenance UART
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Settings used when opening the serial port
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Port identifier (e.g., /dev/ttyUSB0, COM3)
    pub port_name: String,
    /// Baud rate (default: 115200)
    pub baud_rate: u32,
    /// Read timeout (default: 1 s)
    pub timeout: Duration,
}

impl PortConfig {
    pub fn new(port_name: &str) -> Self {
        Self {
            port_name: port_name.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_secs(1),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Lazily opened serial port. Nothing touches the OS until [`PinTransport::open`].
pub struct SerialTransport {
    config: PortConfig,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialTransport {
    pub fn new(config: PortConfig) -> Self {
        Self { config, port: None }
    }

    /// Settings the port is opened with
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, serialport::Error> {
        self.port.as_mut().ok_or_else(|| {
            serialport::Error::new(serialport::ErrorKind::NoDevice, "serial port is not open")
        })
    }
}

impl PinTransport for SerialTransport {
    type Error = serialport::Error;

    fn name(&self) -> &str {
        &self.config.port_name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> Result<(), Self::Error> {
        let port = serialport::new(&self.config.port_name, self.config.baud_rate)
            .timeout(self.config.timeout)
            .open()?;
        port.clear(serialport::ClearBuffer::Input)?;
        debug!(
            "Opened {} at {} baud, timeout {:?}",
            self.config.port_name, self.config.baud_rate, self.config.timeout
        );

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        // Dropping the handle releases the OS descriptor
        self.port = None;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        let port = self.port_mut()?;
        std::io::Write::write_all(port, data)?;
        std::io::Write::flush(port)?;
        Ok(data.len())
    }

    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, Self::Error> {
        let port = self.port_mut()?;
        let pending = port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(0);
        }

        let start = buf.len();
        buf.resize(start + pending, 0);
        match port.read(&mut buf[start..]) {
            Ok(read) => {
                buf.truncate(start + read);
                Ok(read)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                buf.truncate(start);
                Ok(0)
            }
            Err(e) => {
                buf.truncate(start);
                Err(e.into())
            }
        }
    }
}
