//! NE-500 Serial Protocol
//!
//! Implements the New Era Pump Systems basic-mode protocol for syringe pump
//! control: ASCII commands terminated by CR LF out, STX/ETX-framed status
//! responses back.

pub mod commands;
pub mod serial;

mod channel;
mod error;
mod frame;
mod session;
mod transport;

pub use channel::{Channel, SerialChannel};
pub use commands::{Command, Direction, Dispensed, PumpStatus, RateUnits, VolumeUnits};
pub use error::PumpError;
pub use frame::{decode, encode, Decoded, Frame, ETX, LINE_TERMINATOR, STX};
pub use serial::{clear_buffers, list_ports, open_port, PortInfo};
pub use session::{Pump, PumpConfig, SessionState};
pub use transport::Transport;

/// Baud rate of the NE-500 serial line
pub const BAUD_RATE: u32 = 19200;

/// Default response timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Interval between availability polls while waiting for the first
/// response byte, in milliseconds
pub const POLL_INTERVAL_MS: u64 = 5;

/// Grace interval after the first response byte, letting the rest of the
/// burst arrive before the drain, in milliseconds
pub const GRACE_INTERVAL_MS: u64 = 20;

/// Settle interval after the drain; bytes arriving after it mean the line
/// is out of sync, in milliseconds
pub const SETTLE_INTERVAL_MS: u64 = 5;

/// Interval between status queries while waiting for motion to stop,
/// in milliseconds
pub const STATUS_POLL_INTERVAL_MS: u64 = 10;
