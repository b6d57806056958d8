use num_traits::{Signed, ToPrimitive, Zero};

use super::instruction::{Instruction, Mode, Opcode};
use super::{Exit, Interpreter};
use crate::disasm;
use crate::error::VmError;
use crate::word::Word;

impl Interpreter {
    pub(super) fn execute_instruction(&mut self) -> Result<Option<Exit>, VmError> {
        let address = self.ip;
        let instr = Instruction::decode(self.memory.read(address));

        let Some(opcode) = instr.opcode else {
            log::warn!(
                "Unknown opcode {} at address {}. Halting.",
                instr.word,
                address
            );
            return Ok(Some(Exit::UnknownOpcode {
                address,
                word: instr.word,
            }));
        };

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "[{address:05}] {:<28} rb={}",
                disasm::format_instruction(&self.memory, address).text,
                self.relative_base
            );
        }
        self.instructions_executed += 1;

        match opcode {
            Opcode::Add => {
                let a = self.read_operand(&instr, 1)?;
                let b = self.read_operand(&instr, 2)?;
                self.write_operand(&instr, 3, a + b)?;
            }
            Opcode::Mul => {
                let a = self.read_operand(&instr, 1)?;
                let b = self.read_operand(&instr, 2)?;
                self.write_operand(&instr, 3, a * b)?;
            }
            Opcode::Input => {
                // Resolve the destination before blocking so a bad operand fails fast
                let dest = self.destination(&instr, 1)?;
                let value = self.read_input()?;
                self.memory.write(dest, value);
            }
            Opcode::Output => {
                let value = self.read_operand(&instr, 1)?;
                self.ports.output.push(value.clone());
                self.result.push(value);
            }
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => {
                let cond = self.read_operand(&instr, 1)?;
                let target = self.read_operand(&instr, 2)?;
                if !cond.is_zero() == (opcode == Opcode::JumpIfTrue) {
                    self.ip = self.to_address(&target)?;
                    return Ok(None);
                }
            }
            Opcode::LessThan => {
                let a = self.read_operand(&instr, 1)?;
                let b = self.read_operand(&instr, 2)?;
                self.write_operand(&instr, 3, Word::from(u8::from(a < b)))?;
            }
            Opcode::Equals => {
                let a = self.read_operand(&instr, 1)?;
                let b = self.read_operand(&instr, 2)?;
                self.write_operand(&instr, 3, Word::from(u8::from(a == b)))?;
            }
            Opcode::AdjustBase => {
                let delta = self.read_operand(&instr, 1)?;
                self.relative_base += delta;
            }
            Opcode::Halt => return Ok(Some(Exit::Halted)),
        }

        self.ip = self.ip.saturating_add(opcode.width());
        Ok(None)
    }

    /// Raw word of a 1-based operand of the current instruction
    fn operand_word(&self, operand: usize) -> Word {
        self.memory.read(self.ip.saturating_add(operand))
    }

    fn operand_mode(&self, instr: &Instruction, operand: usize) -> Result<Mode, VmError> {
        instr.mode(operand).ok_or_else(|| VmError::InvalidMode {
            ip: self.ip,
            operand,
            mode: instr.mode_digit(operand),
        })
    }

    fn to_address(&self, value: &Word) -> Result<usize, VmError> {
        if value.is_negative() {
            return Err(VmError::NegativeAddress {
                ip: self.ip,
                address: value.clone(),
            });
        }
        value.to_usize().ok_or_else(|| VmError::AddressOutOfRange {
            ip: self.ip,
            address: value.clone(),
        })
    }

    fn relative_address(&self, offset: &Word) -> Result<usize, VmError> {
        self.to_address(&(&self.relative_base + offset))
    }

    fn read_operand(&self, instr: &Instruction, operand: usize) -> Result<Word, VmError> {
        let word = self.operand_word(operand);
        match self.operand_mode(instr, operand)? {
            Mode::Position => Ok(self.memory.read(self.to_address(&word)?)),
            Mode::Immediate => Ok(word),
            Mode::Relative => Ok(self.memory.read(self.relative_address(&word)?)),
        }
    }

    fn destination(&self, instr: &Instruction, operand: usize) -> Result<usize, VmError> {
        let word = self.operand_word(operand);
        match self.operand_mode(instr, operand)? {
            Mode::Position => self.to_address(&word),
            Mode::Immediate => Err(VmError::ImmediateWrite {
                ip: self.ip,
                operand,
            }),
            Mode::Relative => self.relative_address(&word),
        }
    }

    fn write_operand(
        &mut self,
        instr: &Instruction,
        operand: usize,
        value: Word,
    ) -> Result<(), VmError> {
        let dest = self.destination(instr, operand)?;
        self.memory.write(dest, value);
        Ok(())
    }

    fn read_input(&mut self) -> Result<Word, VmError> {
        if let Some(value) = self.ports.input.try_pop() {
            return Ok(value);
        }

        log::debug!("Waiting for input at ip={}", self.ip);
        self.ports
            .input
            .pop()
            .ok_or_else(|| VmError::InputClosed { ip: self.ip })
    }
}
