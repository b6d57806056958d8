use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::VmError;
use crate::word::Word;

/// VM execution states
#[derive(Debug, Clone, PartialEq)]
pub enum VmState {
    Ready,
    Running,
    Halted(Exit),
    Faulted(VmError),
}

impl VmState {
    /// Halted or faulted; no further instructions execute
    pub fn is_terminal(&self) -> bool {
        matches!(self, VmState::Halted(_) | VmState::Faulted(_))
    }
}

/// Why a run ended without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    /// Opcode 99
    Halted,
    /// An opcode outside the instruction set; treated as a halt
    UnknownOpcode { address: usize, word: Word },
}

impl Exit {
    pub fn is_clean(&self) -> bool {
        matches!(self, Exit::Halted)
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Halted => write!(f, "Halt opcode"),
            Exit::UnknownOpcode { address, word } => {
                write!(f, "Unknown opcode {word} at address {address}")
            }
        }
    }
}

/// Run status a driver on another thread can read while the VM runs.
///
/// Whether the VM is waiting for input is tracked by its input channel
/// (see [`super::Channel::is_starved`]), not here.
#[derive(Debug, Default)]
pub struct RunStatus {
    halted: AtomicBool,
}

impl RunStatus {
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub(super) fn set_halted(&self, halted: bool) {
        self.halted.store(halted, Ordering::Release);
    }
}
