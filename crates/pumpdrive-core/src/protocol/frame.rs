//! Frame encoding/decoding
//!
//! The pump frames every response as STX + two ASCII address digits + one
//! status character + payload + ETX. Outbound commands are plain ASCII
//! terminated by CR LF with no other control bytes.

use super::commands::{Command, PumpStatus};
use super::error::PumpError;

/// Start-of-text marker opening every response frame
pub const STX: u8 = 0x02;

/// End-of-text marker closing every response frame
pub const ETX: u8 = 0x03;

/// Terminator appended to every outbound command
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// One parsed response frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Two-digit pump address, as transmitted (leading zero kept)
    pub sequence: String,
    /// Motion state at the time of the response
    pub status: PumpStatus,
    /// Remaining frame bytes between the status character and ETX
    pub payload: Vec<u8>,
}

/// Outcome of scanning a receive buffer for a frame
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A full frame was found
    Frame {
        /// The parsed frame
        frame: Frame,
        /// Bytes consumed through the ETX marker
        consumed: usize,
    },
    /// No ETX yet; the caller must read more bytes
    Incomplete,
}

/// Encode a command into the bytes to put on the wire.
///
/// Fails with `InvalidCommand` if the rendered text would carry its own
/// line-ending bytes.
pub fn encode(command: &Command) -> Result<Vec<u8>, PumpError> {
    let text = command.render();
    if text.contains('\r') || text.contains('\n') {
        return Err(PumpError::InvalidCommand(format!(
            "command text contains a line ending: {:?}",
            text
        )));
    }
    let mut bytes = text.into_bytes();
    bytes.extend_from_slice(LINE_TERMINATOR);
    Ok(bytes)
}

/// Scan a receive buffer for one response frame.
///
/// Returns `Incomplete` until an ETX marker has arrived. Once one is
/// present, the bytes from the start of the buffer must form a full frame;
/// anything else is `MalformedFrame`. `consumed` lets the caller detect
/// stray bytes after the frame.
pub fn decode(raw: &[u8]) -> Result<Decoded, PumpError> {
    let Some(etx) = raw.iter().position(|&b| b == ETX) else {
        return Ok(Decoded::Incomplete);
    };
    if raw.first() != Some(&STX) {
        return Err(PumpError::MalformedFrame(raw.to_vec()));
    }
    let body = &raw[1..etx];
    if body.len() < 3 || !body[0].is_ascii_digit() || !body[1].is_ascii_digit() {
        return Err(PumpError::MalformedFrame(raw.to_vec()));
    }
    let frame = Frame {
        sequence: String::from_utf8_lossy(&body[..2]).into_owned(),
        status: PumpStatus::from_byte(body[2]),
        payload: body[3..].to_vec(),
    };
    Ok(Decoded::Frame {
        frame,
        consumed: etx + 1,
    })
}
