//! Error types for the boundary-facing, recoverable failure modes: malformed
//! wire frames and bad configuration. Fatal startup conditions (bind
//! failure, missing config) still propagate these as `Err` to `main`, which
//! is the one place the process actually exits non-zero, instead of
//! panicking deep inside library code.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    WrongFieldCount { found: usize },
    UnknownMessageType(String),
    MalformedProposalNumber(String),
    MissingFrom,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodecError::WrongFieldCount { found } => {
                write!(f, "expected exactly 6 fields, found {}", found)
            }
            CodecError::UnknownMessageType(t) => write!(f, "unknown message type {:?}", t),
            CodecError::MalformedProposalNumber(s) => {
                write!(f, "malformed proposal number {:?}", s)
            }
            CodecError::MissingFrom => write!(f, "missing required field `from`"),
        }
    }
}

impl std::error::Error for CodecError {}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    MalformedLine { line_no: usize, line: String },
    DuplicateMember(String),
    UnknownMember(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read peer table: {}", e),
            ConfigError::MalformedLine { line_no, line } => {
                write!(f, "malformed peer table entry at line {}: {:?}", line_no, line)
            }
            ConfigError::DuplicateMember(id) => write!(f, "duplicate member id {:?}", id),
            ConfigError::UnknownMember(id) => write!(f, "unknown member id {:?}", id),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageError(pub String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "usage error: {}", self.0)
    }
}

impl std::error::Error for UsageError {}
