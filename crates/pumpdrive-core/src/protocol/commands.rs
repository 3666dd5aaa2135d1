//! Pump commands
//!
//! Defines the NE-500 basic-mode command set, the status characters the pump
//! reports, and the dispensed-volume payload format.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::PumpError;

/// Direction of a pump move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Push syringe contents out
    Infuse,
    /// Pull liquid into the syringe
    Withdraw,
}

impl Direction {
    /// Argument token for the `DIR` command
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Direction::Infuse => "INF",
            Direction::Withdraw => "WDR",
        }
    }

    /// Status character the pump reports while moving in this direction
    pub fn running_status(&self) -> PumpStatus {
        match self {
            Direction::Infuse => PumpStatus::Infusing,
            Direction::Withdraw => PumpStatus::Withdrawing,
        }
    }
}

/// Motion state reported in every response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PumpStatus {
    /// Pump is idle ('S')
    Stopped,
    /// Pump is infusing ('I')
    Infusing,
    /// Pump is withdrawing ('W')
    Withdrawing,
    /// Any other status character, passed through uninterpreted
    Unknown(u8),
}

impl PumpStatus {
    /// Map a response status byte to its motion state
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'S' => PumpStatus::Stopped,
            b'I' => PumpStatus::Infusing,
            b'W' => PumpStatus::Withdrawing,
            other => PumpStatus::Unknown(other),
        }
    }

    /// The raw status byte
    pub fn byte(&self) -> u8 {
        match self {
            PumpStatus::Stopped => b'S',
            PumpStatus::Infusing => b'I',
            PumpStatus::Withdrawing => b'W',
            PumpStatus::Unknown(other) => *other,
        }
    }
}

impl fmt::Display for PumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PumpStatus::Stopped => write!(f, "stopped"),
            PumpStatus::Infusing => write!(f, "infusing"),
            PumpStatus::Withdrawing => write!(f, "withdrawing"),
            PumpStatus::Unknown(byte) => write!(f, "unknown (0x{:02x})", byte),
        }
    }
}

/// Supported pumping rate units
///
/// The driver runs the pump in a single rate unit; the token is what the
/// `RAT` command puts on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateUnits {
    /// Milliliters per minute ("MM")
    #[default]
    MlPerMin,
}

impl RateUnits {
    /// Wire token for this unit
    pub fn token(&self) -> &'static str {
        match self {
            RateUnits::MlPerMin => "MM",
        }
    }
}

/// Supported volume units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUnits {
    /// Microliters ("UL")
    #[default]
    Microliters,
}

impl VolumeUnits {
    /// Wire token for this unit
    pub fn token(&self) -> &'static str {
        match self {
            VolumeUnits::Microliters => "UL",
        }
    }
}

/// Commands of the NE-500 basic mode
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set syringe diameter in mm (`DIA`)
    SetDiameter(f64),
    /// Set pumping rate (`RAT`)
    SetRate(f64, RateUnits),
    /// Select the volume unit (`VOL <unit>`)
    SetVolumeUnits(VolumeUnits),
    /// Set the volume to dispense (`VOL <amount>`)
    SetVolume(f64),
    /// Select the pumping direction (`DIR`)
    SetDirection(Direction),
    /// Start the configured move (`RUN`)
    Run,
    /// Query cumulative dispensed volumes (`DIS`)
    QueryDispensed,
    /// Blank command, answered with a bare status frame
    QueryStatus,
}

impl Command {
    /// Render the command text the pump expects, without the line terminator.
    ///
    /// Diameter and rate are sent as two-decimal fixed point; the volume
    /// amount is truncated to a whole number of the configured unit.
    pub fn render(&self) -> String {
        match self {
            Command::SetDiameter(diameter) => format!("DIA {:.2}", diameter),
            Command::SetRate(rate, units) => format!("RAT {:.2} {}", rate, units.token()),
            Command::SetVolumeUnits(units) => format!("VOL {}", units.token()),
            Command::SetVolume(volume) => format!("VOL {}", volume.trunc() as u64),
            Command::SetDirection(direction) => format!("DIR {}", direction.mnemonic()),
            Command::Run => "RUN".to_string(),
            Command::QueryDispensed => "DIS".to_string(),
            Command::QueryStatus => " ".to_string(),
        }
    }
}

/// Cumulative volumes dispensed by the pump, as reported by the `DIS` query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispensed {
    /// Total infused volume
    pub infused: f64,
    /// Total withdrawn volume
    pub withdrawn: f64,
    /// Unit tag the pump reported, e.g. "UL"
    pub units: String,
}

impl Dispensed {
    /// Parse a `DIS` response payload of the form `I<float>W<float><unit>`.
    pub fn parse(payload: &[u8]) -> Result<Self, PumpError> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| PumpError::PayloadParse(format!("non-ASCII payload: {:02x?}", payload)))?;
        let re = Regex::new(r"I([0-9.]+)W([0-9.]+)(.L)").unwrap();
        let captures = re
            .captures(text)
            .ok_or_else(|| PumpError::PayloadParse(format!("not a DIS payload: {:?}", text)))?;
        let infused = captures[1]
            .parse::<f64>()
            .map_err(|e| PumpError::PayloadParse(format!("bad infused volume: {}", e)))?;
        let withdrawn = captures[2]
            .parse::<f64>()
            .map_err(|e| PumpError::PayloadParse(format!("bad withdrawn volume: {}", e)))?;
        Ok(Self {
            infused,
            withdrawn,
            units: captures[3].to_string(),
        })
    }
}
