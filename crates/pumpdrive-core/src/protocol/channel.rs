//! Communication channel
//!
//! Seam between the transport and the byte stream it drives. The pump only
//! ever talks over one serial line; the trait exists so tests can substitute
//! a scripted device.

use serialport::SerialPort;
use std::io::{self, Read, Write};

/// Byte stream with non-blocking availability polling
pub trait Channel: Read + Write + Send {
    /// Number of bytes buffered and ready to read
    fn bytes_to_read(&mut self) -> io::Result<u32>;
}

/// Serial port wrapper implementing [`Channel`]
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an open serial port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Channel for SerialChannel {
    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
