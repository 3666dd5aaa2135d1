//! Pump session
//!
//! Handles the session lifecycle and command execution with the pump:
//! open, configure, infuse/withdraw, status and volume queries, close.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::debug;

use super::channel::{Channel, SerialChannel};
use super::commands::{Command, Direction, Dispensed, PumpStatus, RateUnits, VolumeUnits};
use super::frame::{decode, encode, Decoded, Frame};
use super::serial::{clear_buffers, open_port};
use super::transport::Transport;
use super::{PumpError, DEFAULT_TIMEOUT_MS, STATUS_POLL_INTERVAL_MS};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No connection held
    Closed,
    /// Connection open, configuration handshake in progress
    Configuring,
    /// Configured and accepting operations
    Ready,
    /// A fatal open-time failure released the connection
    Error,
}

/// Session configuration
///
/// Immutable once the session opens; changing diameter or rate means
/// closing and reopening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpConfig {
    /// Serial port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Syringe diameter in mm, positive and finite
    pub diameter: f64,
    /// Pumping rate, positive and finite
    pub rate: f64,
    /// Rate unit sent with the `RAT` command
    pub rate_units: RateUnits,
    /// Volume unit selected during the handshake
    pub volume_units: VolumeUnits,
    /// Response timeout in milliseconds
    pub timeout_ms: u64,
    /// Raise wire dumps from trace to debug level
    pub debug: bool,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            diameter: 0.0,
            rate: 0.0,
            rate_units: RateUnits::default(),
            volume_units: VolumeUnits::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug: false,
        }
    }
}

/// One pump, one serial line, one session.
///
/// The session exclusively owns its transport from `open` to `close`.
/// Operations run to completion on the calling thread; at most one
/// command is in flight at a time.
pub struct Pump {
    config: PumpConfig,
    transport: Option<Transport>,
    state: SessionState,
    session_volume: f64,
}

impl Pump {
    /// Create an unopened session, validating the configuration.
    ///
    /// Non-finite or non-positive diameter and rate are rejected here,
    /// before any I/O.
    pub fn new(config: PumpConfig) -> Result<Self, PumpError> {
        if !config.diameter.is_finite() || config.diameter <= 0.0 {
            return Err(PumpError::InvalidArgument(format!(
                "diameter must be positive and finite, got {}",
                config.diameter
            )));
        }
        if !config.rate.is_finite() || config.rate <= 0.0 {
            return Err(PumpError::InvalidArgument(format!(
                "rate must be positive and finite, got {}",
                config.rate
            )));
        }
        Ok(Self {
            config,
            transport: None,
            state: SessionState::Closed,
            session_volume: 0.0,
        })
    }

    /// Open the configured serial port and run the configuration handshake.
    pub fn open(&mut self) -> Result<(), PumpError> {
        if self.state == SessionState::Ready {
            return Err(PumpError::AlreadyOpen);
        }
        let mut port = open_port(
            &self.config.port_name,
            Duration::from_millis(self.config.timeout_ms),
        )?;
        clear_buffers(port.as_mut())?;
        self.open_channel(Box::new(SerialChannel::new(port)))
    }

    /// Run the configuration handshake over an already-established channel.
    ///
    /// The handshake issues `DIA`, `RAT`, and `VOL` in order, each
    /// demanding a stopped pump and an empty payload. Any failure releases
    /// the channel and leaves the session in the error state.
    pub fn open_channel(&mut self, channel: Box<dyn Channel>) -> Result<(), PumpError> {
        if self.state == SessionState::Ready {
            return Err(PumpError::AlreadyOpen);
        }
        self.state = SessionState::Configuring;
        self.transport = Some(Transport::new(
            channel,
            Duration::from_millis(self.config.timeout_ms),
            self.config.debug,
        ));

        match self.configure() {
            Ok(()) => {
                self.state = SessionState::Ready;
                debug!(port = %self.config.port_name, "pump session open");
                Ok(())
            }
            Err(e) => {
                self.transport = None;
                self.state = SessionState::Error;
                Err(e)
            }
        }
    }

    /// Send the configuration triple the pump needs before any move.
    fn configure(&mut self) -> Result<(), PumpError> {
        self.expect_ack(&Command::SetDiameter(self.config.diameter))?;
        self.expect_ack(&Command::SetRate(self.config.rate, self.config.rate_units))?;
        self.expect_ack(&Command::SetVolumeUnits(self.config.volume_units))?;
        Ok(())
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session configuration
    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Net volume moved by this session's operations, in the configured
    /// volume unit: infused volumes add, withdrawn volumes subtract.
    ///
    /// Tracked by the driver, unlike [`Pump::get_dispensed`] which reports
    /// the device's own totals. A host layer can watch this to apply
    /// volume-threshold policy.
    pub fn dispensed_this_session(&self) -> f64 {
        self.session_volume
    }

    /// Infuse `volume` in the configured unit.
    ///
    /// When `block` is true, does not return until the pump reports
    /// stopped.
    pub fn infuse(&mut self, volume: f64, block: bool) -> Result<(), PumpError> {
        self.move_volume(volume, block, Direction::Infuse)
    }

    /// Withdraw `volume` in the configured unit.
    ///
    /// When `block` is true, does not return until the pump reports
    /// stopped.
    pub fn withdraw(&mut self, volume: f64, block: bool) -> Result<(), PumpError> {
        self.move_volume(volume, block, Direction::Withdraw)
    }

    fn move_volume(
        &mut self,
        volume: f64,
        block: bool,
        direction: Direction,
    ) -> Result<(), PumpError> {
        if !volume.is_finite() || volume < 0.0 {
            return Err(PumpError::InvalidArgument(format!(
                "volume must be non-negative and finite, got {}",
                volume
            )));
        }
        if self.transport.is_none() {
            return Err(PumpError::NotOpen);
        }

        self.expect_ack(&Command::SetDirection(direction))?;
        self.expect_ack(&Command::SetVolume(volume))?;
        self.send_command(&Command::Run, Some(direction.running_status()), Some(b""))?;
        debug!(volume, ?direction, "pump move started");

        // The device receives the volume truncated to a whole unit
        match direction {
            Direction::Infuse => self.session_volume += volume.trunc(),
            Direction::Withdraw => self.session_volume -= volume.trunc(),
        }

        if block {
            self.wait_for_stop()?;
        }
        Ok(())
    }

    /// Poll the pump until it reports stopped.
    ///
    /// No timeout is imposed here; a stuck device blocks the caller until
    /// the session is torn down from another thread, which fails the
    /// in-flight read.
    pub fn wait_for_stop(&mut self) -> Result<(), PumpError> {
        loop {
            if self.check_status()? == PumpStatus::Stopped {
                debug!("pump stopped");
                return Ok(());
            }
            thread::sleep(Duration::from_millis(STATUS_POLL_INTERVAL_MS));
        }
    }

    /// Query the pump's motion state once.
    pub fn check_status(&mut self) -> Result<PumpStatus, PumpError> {
        let frame = self.send_command(&Command::QueryStatus, None, None)?;
        Ok(frame.status)
    }

    /// Query the cumulative volumes the device has moved.
    ///
    /// The pump only answers this usefully between moves, so a stopped
    /// status is demanded.
    pub fn get_dispensed(&mut self) -> Result<Dispensed, PumpError> {
        let frame = self.send_command(&Command::QueryDispensed, Some(PumpStatus::Stopped), None)?;
        Dispensed::parse(&frame.payload)
    }

    /// Release the connection.
    ///
    /// Safe to call any number of times; also runs on drop, so the
    /// transport is released on every exit path.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!(port = %self.config.port_name, "pump session closed");
        }
        self.state = SessionState::Closed;
    }

    /// Issue a command expecting a plain acknowledgement: stopped status,
    /// empty payload.
    fn expect_ack(&mut self, command: &Command) -> Result<(), PumpError> {
        self.send_command(command, Some(PumpStatus::Stopped), Some(b""))?;
        Ok(())
    }

    /// The single choke point every device interaction passes through.
    ///
    /// Encodes and writes the command, reads and decodes the one response
    /// frame, then validates it against the demanded status and payload.
    /// Never retries; every violation surfaces to the caller.
    fn send_command(
        &mut self,
        command: &Command,
        expected_status: Option<PumpStatus>,
        expected_payload: Option<&[u8]>,
    ) -> Result<Frame, PumpError> {
        let bytes = encode(command)?;
        let transport = self.transport.as_mut().ok_or(PumpError::NotOpen)?;
        transport.write_command(&bytes)?;
        let raw = transport.read_response()?;

        let (frame, consumed) = match decode(&raw)? {
            Decoded::Frame { frame, consumed } => (frame, consumed),
            Decoded::Incomplete => return Err(PumpError::IncompleteFrame(raw)),
        };
        if consumed < raw.len() {
            return Err(PumpError::TrailingBytes(raw[consumed..].to_vec()));
        }

        if let Some(expected) = expected_status {
            if frame.status != expected {
                return Err(PumpError::UnexpectedStatus {
                    expected,
                    actual: frame.status,
                });
            }
        }
        if let Some(expected) = expected_payload {
            if frame.payload != expected {
                return Err(PumpError::UnexpectedPayload {
                    expected: String::from_utf8_lossy(expected).into_owned(),
                    actual: String::from_utf8_lossy(&frame.payload).into_owned(),
                });
            }
        }
        Ok(frame)
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.close();
    }
}
