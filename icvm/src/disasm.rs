//! Disassembly of IntCode memory images
//!
//! Used for `icvm disasm` listings and for per-instruction trace logging.
//! Operands are written as `[a]` for position mode, `a` for immediate mode
//! and `[rb+a]` for relative mode.

use colored::*;
use num_traits::Signed;

use crate::constants::DISASM_ADDRESS_WIDTH;
use crate::vm::{Instruction, Interpreter, Memory, Mode, Opcode, VmState};
use crate::word::Word;

/// One decoded instruction (or data word) of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct DisasmLine {
    pub address: usize,
    pub opcode: Option<Opcode>,
    pub words: Vec<Word>,
    pub text: String,
}

impl DisasmLine {
    /// Words consumed by this line
    pub fn width(&self) -> usize {
        self.words.len()
    }
}

/// Format a single operand according to its mode digit
pub fn format_operand(mode_digit: i64, word: &Word) -> String {
    match Mode::from_digit(mode_digit) {
        Some(Mode::Position) => format!("[{word}]"),
        Some(Mode::Immediate) => format!("{word}"),
        Some(Mode::Relative) if word.is_negative() => format!("[rb{word}]"),
        Some(Mode::Relative) => format!("[rb+{word}]"),
        None => format!("?{mode_digit}:{word}"),
    }
}

/// Decode the instruction at `address`
pub fn format_instruction(memory: &Memory, address: usize) -> DisasmLine {
    let instr = Instruction::decode(memory.read(address));

    let Some(opcode) = instr.opcode else {
        return DisasmLine {
            address,
            opcode: None,
            text: format!("DATA {}", instr.word),
            words: vec![instr.word],
        };
    };

    let words = memory.slice(address..address.saturating_add(opcode.width()));
    let operands: Vec<String> = (1..=opcode.operand_count())
        .filter_map(|operand| {
            let word = words.get(operand)?;
            Some(format_operand(instr.mode_digit(operand), word))
        })
        .collect();

    let text = if operands.is_empty() {
        opcode.mnemonic().to_string()
    } else {
        format!("{:<5}{}", opcode.mnemonic(), operands.join(", "))
    };

    DisasmLine {
        address,
        opcode: Some(opcode),
        words,
        text,
    }
}

/// Linear sweep over `0..extent`.
///
/// IntCode freely mixes code and data, so words that do not decode are
/// listed as `DATA` and the sweep moves on by one word.
pub fn disassemble(memory: &Memory) -> Vec<DisasmLine> {
    let mut lines = Vec::new();
    let mut address = 0;
    while address < memory.extent() {
        let line = format_instruction(memory, address);
        address = address.saturating_add(line.width().max(1));
        lines.push(line);
    }
    lines
}

/// Plain listing row: address, raw words, decoded text
pub fn render_line(line: &DisasmLine) -> String {
    let raw: Vec<String> = line.words.iter().map(|w| w.to_string()).collect();
    format!(
        "{:0width$}  {:<32} {}",
        line.address,
        raw.join(","),
        line.text,
        width = DISASM_ADDRESS_WIDTH
    )
}

/// Listing row with colored mnemonic
pub fn render_line_colored(line: &DisasmLine) -> String {
    let raw: Vec<String> = line.words.iter().map(|w| w.to_string()).collect();
    let address = format!("{:0width$}", line.address, width = DISASM_ADDRESS_WIDTH);
    let text = match line.opcode {
        Some(Opcode::Halt) => line.text.bright_red().bold(),
        Some(Opcode::Input) | Some(Opcode::Output) => line.text.bright_cyan(),
        Some(Opcode::JumpIfTrue) | Some(Opcode::JumpIfFalse) => line.text.bright_yellow(),
        Some(_) => line.text.normal(),
        None => line.text.bright_black(),
    };
    format!("{}  {:<32} {}", address.bright_black(), raw.join(","), text)
}

/// One-line register and status summary of an interpreter
pub fn format_state(vm: &Interpreter) -> String {
    let state = match vm.state() {
        VmState::Ready => "ready".to_string(),
        VmState::Running => "running".to_string(),
        VmState::Halted(exit) => format!("halted ({exit})"),
        VmState::Faulted(err) => format!("faulted ({err})"),
    };
    format!(
        "ip={} rb={} state={} instructions={} outputs={}",
        vm.ip(),
        vm.relative_base(),
        state,
        vm.instructions_executed(),
        vm.result().len()
    )
}
