//! Error handling for the IntCode VM
//!
//! Every fallible library operation returns [`VmError`]. Conditions that a
//! well-formed program can never reach (negative addresses, writes through an
//! immediate operand, unknown mode digits) are reported here rather than
//! silently corrupting memory.

use thiserror::Error;

use crate::word::Word;

/// Main error type for loading and executing IntCode programs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VmError {
    #[error("Negative memory address {address} at ip={ip}")]
    NegativeAddress { ip: usize, address: Word },

    #[error("Memory address {address} out of range at ip={ip}")]
    AddressOutOfRange { ip: usize, address: Word },

    #[error("Write through immediate-mode operand {operand} at ip={ip}")]
    ImmediateWrite { ip: usize, operand: usize },

    #[error("Invalid addressing mode {mode} for operand {operand} at ip={ip}")]
    InvalidMode { ip: usize, operand: usize, mode: i64 },

    #[error("Input channel closed while waiting for input at ip={ip}")]
    InputClosed { ip: usize },

    #[error("Parse error at token {index} ({token:?}): {message}")]
    Parse {
        index: usize,
        token: String,
        message: String,
    },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Settings error: {message}")]
    Settings { message: String },

    #[error("VM thread panicked: {message}")]
    ThreadPanicked { message: String },
}

impl VmError {
    /// Address of the instruction that failed, for execution errors
    pub fn ip(&self) -> Option<usize> {
        match self {
            VmError::NegativeAddress { ip, .. }
            | VmError::AddressOutOfRange { ip, .. }
            | VmError::ImmediateWrite { ip, .. }
            | VmError::InvalidMode { ip, .. }
            | VmError::InputClosed { ip } => Some(*ip),
            VmError::Parse { .. }
            | VmError::Io { .. }
            | VmError::Settings { .. }
            | VmError::ThreadPanicked { .. } => None,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for VmError {
    fn from(err: std::io::Error) -> Self {
        VmError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for VmError {
    fn from(err: serde_json::Error) -> Self {
        VmError::Settings {
            message: err.to_string(),
        }
    }
}
