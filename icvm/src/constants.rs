//! Central configuration and constants for the IntCode VM

// Instruction word decoding
pub const OPCODE_MODULUS: i64 = 100;
pub const MODE_BASE: i64 = 10;
pub const MAX_OPERANDS: usize = 3;
pub const INSTRUCTION_MODULUS: i64 = 100_000; // Opcode plus three mode digits

// Addressing mode digits
pub const MODE_POSITION: i64 = 0;
pub const MODE_IMMEDIATE: i64 = 1;
pub const MODE_RELATIVE: i64 = 2;

// Memory layout
pub const PAGE_SIZE: usize = 1024; // Words per lazily-allocated memory page

// Background execution
pub const VM_THREAD_NAME: &str = "icvm";

// ASCII output: values in this range are printed as characters
pub const ASCII_MAX: i64 = 127;

// Disassembly listing
pub const DISASM_ADDRESS_WIDTH: usize = 5;
