//! Protocol errors

use thiserror::Error;

use super::commands::PumpStatus;

/// Errors that can occur while talking to the pump
#[derive(Error, Debug)]
pub enum PumpError {
    /// The serial device could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The serial line failed mid-session (read, write, or poll).
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// No response bytes arrived within the configured window.
    #[error("Response timeout")]
    Timeout,

    /// An operation was issued outside the open-to-close window.
    #[error("Pump session is not open")]
    NotOpen,

    /// `open` was called on a session that already owns a connection.
    #[error("Pump session is already open")]
    AlreadyOpen,

    /// More bytes arrived than one response frame accounts for.
    #[error("Unexpected bytes after response frame: {0:02x?}")]
    TrailingBytes(Vec<u8>),

    /// Bytes between the frame markers do not match the response grammar.
    #[error("Malformed response frame: {0:02x?}")]
    MalformedFrame(Vec<u8>),

    /// The response burst ended without a complete frame.
    #[error("Incomplete response frame: {0:02x?}")]
    IncompleteFrame(Vec<u8>),

    /// The frame parsed but its status differs from the demanded one.
    #[error("Unexpected pump status: expected {expected}, got {actual}")]
    UnexpectedStatus {
        /// Status the command demanded
        expected: PumpStatus,
        /// Status the pump reported
        actual: PumpStatus,
    },

    /// The frame parsed but its payload differs from the demanded one.
    #[error("Unexpected response payload: expected {expected:?}, got {actual:?}")]
    UnexpectedPayload {
        /// Payload the command demanded
        expected: String,
        /// Payload the pump returned
        actual: String,
    },

    /// A payload parsed as a frame but not against its sub-grammar.
    #[error("Unparseable response payload: {0}")]
    PayloadParse(String),

    /// A command would put line-ending bytes on the wire itself.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// A caller-supplied value failed a precondition before any I/O.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error from the underlying channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
