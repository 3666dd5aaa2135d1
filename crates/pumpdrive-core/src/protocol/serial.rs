//! Serial port handling
//!
//! Opens the serial line with the fixed NE-500 framing parameters and
//! enumerates candidate ports for a host-side device picker.

use serialport::{
    DataBits, FlowControl, Parity, SerialPort, SerialPortInfo, SerialPortType, StopBits,
};
use std::time::Duration;

use super::{PumpError, BAUD_RATE};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// Manufacturer name (if available)
    pub manufacturer: Option<String>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (manufacturer, product) = match info.port_type {
            SerialPortType::UsbPort(usb_info) => (usb_info.manufacturer, usb_info.product),
            _ => (None, None),
        };

        Self {
            name: info.port_name,
            manufacturer,
            product,
        }
    }
}

/// List available serial ports in deterministic order
pub fn list_ports() -> Vec<PortInfo> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    ports
}

/// Open the pump's serial line: 19200 baud, 8 data bits, no parity, one stop
/// bit, no flow control, with a bounded read timeout.
pub fn open_port(name: &str, timeout: Duration) -> Result<Box<dyn SerialPort>, PumpError> {
    serialport::new(name, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(timeout)
        .open()
        .map_err(|e| PumpError::ConnectionFailed(format!("{}: {}", name, e)))
}

/// Clear the serial port buffers
pub fn clear_buffers(port: &mut dyn SerialPort) -> Result<(), PumpError> {
    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| PumpError::SerialError(e.to_string()))
}
