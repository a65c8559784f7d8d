/// Trait for the byte stream the code finder talks to.
/// Implement this trait for different transports (serial port, simulators, etc.)
pub trait PinTransport {
    /// Error type for transport operations
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Human readable identifier of the port, used in status events
    fn name(&self) -> &str;

    /// Whether the underlying connection is currently open
    fn is_open(&self) -> bool;

    /// Open the connection with the configured settings
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Close the connection. Called only while open.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Write data to the transport
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Drain whatever bytes are currently available into `buf`, waiting at
    /// most the configured read timeout. Returns 0 when nothing is pending.
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, Self::Error>;
}
