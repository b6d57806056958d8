//! IntCode virtual machine
//!
//! An interpreter for the IntCode instruction set with arbitrary-precision
//! words, sparse growable memory and thread-safe input/output channels, so a
//! driver can run the machine on a background thread and react to its output
//! as it arrives.

pub mod constants;
pub mod disasm;
pub mod error;
pub mod output;
pub mod program;
pub mod settings;
pub mod vm;
pub mod word;

// Re-export commonly used types
pub use error::VmError;
pub use program::{load_program, parse_program};
pub use vm::{Channel, Exit, Interpreter, Ports, RunHandle, RunStatus, VmState};
pub use word::{words, Word};
