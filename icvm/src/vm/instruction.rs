use num_traits::{Signed, ToPrimitive};

use crate::constants::*;
use crate::word::Word;

/// Operations of the IntCode instruction set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Add = 1,
    Mul = 2,
    Input = 3,
    Output = 4,
    JumpIfTrue = 5,
    JumpIfFalse = 6,
    LessThan = 7,
    Equals = 8,
    AdjustBase = 9,
    Halt = 99,
}

impl Opcode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Mul),
            3 => Some(Opcode::Input),
            4 => Some(Opcode::Output),
            5 => Some(Opcode::JumpIfTrue),
            6 => Some(Opcode::JumpIfFalse),
            7 => Some(Opcode::LessThan),
            8 => Some(Opcode::Equals),
            9 => Some(Opcode::AdjustBase),
            99 => Some(Opcode::Halt),
            _ => None,
        }
    }

    /// Number of operand words following the instruction word
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Total words occupied by the instruction, i.e. the implicit ip advance
    pub fn width(self) -> usize {
        self.operand_count() + 1
    }

    /// The operand (1-based) that names a destination address, if any
    pub fn destination(self) -> Option<usize> {
        match self {
            Opcode::Add | Opcode::Mul | Opcode::LessThan | Opcode::Equals => Some(3),
            Opcode::Input => Some(1),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Mul => "MUL",
            Opcode::Input => "IN",
            Opcode::Output => "OUT",
            Opcode::JumpIfTrue => "JNZ",
            Opcode::JumpIfFalse => "JZ",
            Opcode::LessThan => "LT",
            Opcode::Equals => "EQ",
            Opcode::AdjustBase => "ARB",
            Opcode::Halt => "HALT",
        }
    }
}

/// Operand addressing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Position,
    Immediate,
    Relative,
}

impl Mode {
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            MODE_POSITION => Some(Mode::Position),
            MODE_IMMEDIATE => Some(Mode::Immediate),
            MODE_RELATIVE => Some(Mode::Relative),
            _ => None,
        }
    }
}

/// A decoded instruction word.
///
/// Mode digits are kept raw and validated only when the operand is used, so
/// stray digits above an instruction's operand count are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub word: Word,
    pub opcode: Option<Opcode>,
    modes: [i64; MAX_OPERANDS],
}

impl Instruction {
    pub fn decode(word: Word) -> Self {
        // Only the opcode and mode digits matter; negative words decode to nothing
        let low = if word.is_negative() {
            None
        } else {
            (&word % INSTRUCTION_MODULUS).to_i64()
        };

        let opcode = low.and_then(|low| Opcode::from_code(low % OPCODE_MODULUS));

        let mut modes = [MODE_POSITION; MAX_OPERANDS];
        let mut rest = low.unwrap_or(0) / OPCODE_MODULUS;
        for mode in modes.iter_mut() {
            *mode = rest % MODE_BASE;
            rest /= MODE_BASE;
        }

        Self { word, opcode, modes }
    }

    /// Raw mode digit for a 1-based operand
    pub fn mode_digit(&self, operand: usize) -> i64 {
        self.modes[operand - 1]
    }

    /// Addressing mode for a 1-based operand, `None` for an unknown digit
    pub fn mode(&self, operand: usize) -> Option<Mode> {
        Mode::from_digit(self.mode_digit(operand))
    }
}
