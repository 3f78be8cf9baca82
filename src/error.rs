//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::fmt;
use std::io;

/// Command-line parse errors.
///
/// A line that fails to parse never reaches a handler; the session runner
/// converts the error into the matching protocol reply instead.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand(String),
    MissingArgument(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownCommand(verb) => write!(f, "Unknown command: {}", verb),
            ParseError::MissingArgument(verb) => {
                write!(f, "Missing argument for command: {}", verb)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Data-channel errors
#[derive(Debug)]
pub enum TransferError {
    /// A data connection was requested without a prior EPSV.
    NotNegotiated,
    PortBindingFailed(io::Error),
    AcceptFailed(io::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NotNegotiated => write!(f, "No data connection negotiated"),
            TransferError::PortBindingFailed(e) => {
                write!(f, "Failed to bind passive listener: {}", e)
            }
            TransferError::AcceptFailed(e) => {
                write!(f, "Failed to accept data connection: {}", e)
            }
        }
    }
}

impl std::error::Error for TransferError {}
