//! Burst transport
//!
//! Owns the open channel to the pump and implements its line discipline:
//! one command out, one short response burst back. The reply carries no
//! length prefix, so "response complete" is detected by quiescence. Wait
//! for the first byte, give the rest of the burst a grace interval to
//! arrive, drain what is buffered, then confirm the line has gone quiet.

use std::io::{Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::channel::Channel;
use super::error::PumpError;
use super::{GRACE_INTERVAL_MS, POLL_INTERVAL_MS, SETTLE_INTERVAL_MS};

/// Byte-level transport for one pump connection.
///
/// Dropping the transport closes the underlying channel; closing it from
/// another thread makes an in-flight read fail instead of hanging.
pub struct Transport {
    channel: Box<dyn Channel>,
    timeout: Duration,
    debug: bool,
}

impl Transport {
    /// Take ownership of an open channel.
    ///
    /// `debug` raises wire dumps from trace to debug level.
    pub fn new(channel: Box<dyn Channel>, timeout: Duration, debug: bool) -> Self {
        Self {
            channel,
            timeout,
            debug,
        }
    }

    /// Write one encoded command to the pump.
    pub fn write_command(&mut self, bytes: &[u8]) -> Result<(), PumpError> {
        self.channel.write_all(bytes)?;
        self.channel.flush()?;
        if self.debug {
            debug!(out = %String::from_utf8_lossy(bytes).trim_end(), "pump write");
        } else {
            trace!(out = %String::from_utf8_lossy(bytes).trim_end(), "pump write");
        }
        Ok(())
    }

    /// Collect one response burst.
    ///
    /// Polls for the first byte until the configured timeout, sleeps one
    /// grace interval so the rest of the burst can arrive, then drains the
    /// buffer in one snapshot. A settle interval later the line must be
    /// quiet; a command produces exactly one frame, so any late bytes are
    /// a desync and surface as [`PumpError::TrailingBytes`].
    pub fn read_response(&mut self) -> Result<Vec<u8>, PumpError> {
        let start = Instant::now();
        loop {
            if self.channel.bytes_to_read()? > 0 {
                break;
            }
            if start.elapsed() >= self.timeout {
                return Err(PumpError::Timeout);
            }
            thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        }

        thread::sleep(Duration::from_millis(GRACE_INTERVAL_MS));
        let available = self.channel.bytes_to_read()? as usize;
        let mut response = vec![0u8; available];
        self.channel.read_exact(&mut response)?;

        thread::sleep(Duration::from_millis(SETTLE_INTERVAL_MS));
        let stray = self.channel.bytes_to_read()? as usize;
        if stray > 0 {
            let mut extra = vec![0u8; stray];
            self.channel.read_exact(&mut extra)?;
            return Err(PumpError::TrailingBytes(extra));
        }

        if self.debug {
            debug!(input = ?String::from_utf8_lossy(&response), "pump read");
        } else {
            trace!(input = ?String::from_utf8_lossy(&response), "pump read");
        }
        Ok(response)
    }
}
