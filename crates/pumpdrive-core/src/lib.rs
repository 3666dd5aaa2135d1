//! # PumpDrive Core Library
//!
//! Core driver for New Era NE-500 compatible syringe pumps.
//!
//! This library provides:
//! - Framing for the NE-500 basic-mode ASCII protocol
//! - A serial transport collecting response bursts by quiescence
//! - A stateful pump session: configure, infuse, withdraw, query
//!
//! The graphical front end, confirmation policy, and configuration loading
//! live outside this crate; they drive the session through plain
//! operations and return values.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pumpdrive_core::protocol::{Pump, PumpConfig};
//!
//! let mut pump = Pump::new(PumpConfig {
//!     port_name: "/dev/ttyUSB0".to_string(),
//!     diameter: 7.27,
//!     rate: 2.0,
//!     ..PumpConfig::default()
//! })?;
//! pump.open()?;
//! pump.infuse(50.0, true)?;
//! let totals = pump.get_dispensed()?;
//! println!("infused: {} {}", totals.infused, totals.units);
//! pump.close();
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        Dispensed, Pump, PumpConfig, PumpError, PumpStatus, SessionState,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
