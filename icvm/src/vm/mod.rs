/// VM module - IntCode interpreter, its memory image and I/O channels

mod channel;
mod execution;
mod handle;
mod instruction;
mod memory;
mod state;

pub use channel::{Channel, Ports};
pub use handle::RunHandle;
pub use instruction::{Instruction, Mode, Opcode};
pub use memory::Memory;
pub use state::{Exit, RunStatus, VmState};

use std::sync::Arc;

use num_traits::Zero;

use crate::error::VmError;
use crate::word::Word;

/// The IntCode interpreter
///
/// Memory and registers belong to whichever thread is executing the
/// interpreter. Drivers interact with a running instance only through its
/// [`Ports`] and [`RunStatus`], both of which are safe to share.
pub struct Interpreter {
    // Private copy of the program, grown on demand
    memory: Memory,

    // Registers
    ip: usize,
    relative_base: Word,

    // Input/output channels shared with the driver
    ports: Ports,

    // Halted flag shared with the driver
    status: Arc<RunStatus>,

    pub(crate) state: VmState,

    // Every value ever output, in order
    result: Vec<Word>,

    // Instructions executed during the current run
    instructions_executed: u64,
}

impl Interpreter {
    pub fn new<W: Clone + Into<Word>>(program: &[W]) -> Self {
        Self::with_ports(program, Ports::new())
    }

    /// Build an interpreter with `input` already queued on its input channel
    pub fn with_input<W, I>(program: &[W], input: I) -> Self
    where
        W: Clone + Into<Word>,
        I: IntoIterator,
        I::Item: Into<Word>,
    {
        Self::with_ports(program, Ports::with_input(input))
    }

    /// Build an interpreter around existing channels
    pub fn with_ports<W: Clone + Into<Word>>(program: &[W], ports: Ports) -> Self {
        Interpreter {
            memory: Memory::from_program(program),
            ip: 0,
            relative_base: Word::zero(),
            ports,
            status: Arc::new(RunStatus::default()),
            state: VmState::Ready,
            result: Vec::new(),
            instructions_executed: 0,
        }
    }

    /// Execute from address 0 until the program halts.
    ///
    /// Blocks whenever the program reads from an empty input channel. An
    /// unknown opcode ends the run like a halt and is reported through the
    /// returned [`Exit`]; malformed operands end it with an error.
    pub fn run(&mut self) -> Result<Exit, VmError> {
        self.prepare_run();

        log::debug!("Starting run: {} words loaded", self.memory.extent());

        loop {
            if let Some(exit) = self.step()? {
                return Ok(exit);
            }
        }
    }

    // Reset registers and flags that a previous run left behind
    fn prepare_run(&mut self) {
        self.ip = 0;
        self.state = VmState::Ready;
        self.instructions_executed = 0;
        self.status.set_halted(false);
        self.ports.output.reopen();
    }

    /// Execute a single instruction at the current instruction pointer.
    /// Returns `Some` once the machine has halted.
    pub fn step(&mut self) -> Result<Option<Exit>, VmError> {
        match &self.state {
            VmState::Halted(exit) => return Ok(Some(exit.clone())),
            VmState::Faulted(err) => return Err(err.clone()),
            VmState::Ready | VmState::Running => {}
        }
        self.state = VmState::Running;

        match self.execute_instruction() {
            Ok(None) => Ok(None),
            Ok(Some(exit)) => {
                self.finish(VmState::Halted(exit.clone()));
                Ok(Some(exit))
            }
            Err(err) => {
                self.finish(VmState::Faulted(err.clone()));
                Err(err)
            }
        }
    }

    fn finish(&mut self, state: VmState) {
        match &state {
            VmState::Halted(exit) => log::debug!(
                "{}. Halting after {} instructions",
                exit,
                self.instructions_executed
            ),
            VmState::Faulted(err) => log::debug!(
                "Run failed after {} instructions: {}",
                self.instructions_executed,
                err
            ),
            VmState::Ready | VmState::Running => {}
        }

        self.state = state;
        self.status.set_halted(true);
        // Wake any driver blocked on output; queued values stay readable
        self.ports.output.close();
        // Wake any driver waiting for this VM to ask for input
        self.ports.input.wake_watchers();
    }

    /// Move the interpreter onto a background thread and run it there
    pub fn spawn(mut self) -> Result<RunHandle, VmError> {
        // Clear flags from an earlier run before the driver can observe them
        self.prepare_run();
        RunHandle::spawn(self)
    }

    pub fn push_input(&self, value: impl Into<Word>) {
        self.ports.input.push(value);
    }

    /// Pop the next output value, blocking until one is produced.
    /// Returns `None` once the run has ended and all output is drained.
    pub fn pop_output(&self) -> Option<Word> {
        self.ports.output.pop()
    }

    pub fn try_pop_output(&self) -> Option<Word> {
        self.ports.output.try_pop()
    }

    pub fn has_output(&self) -> bool {
        !self.ports.output.is_empty()
    }

    pub fn is_halted(&self) -> bool {
        self.status.is_halted()
    }

    /// Whether a run is blocked on this interpreter's empty input channel
    pub fn is_waiting(&self) -> bool {
        self.ports.input.is_starved()
    }

    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    pub fn status(&self) -> Arc<RunStatus> {
        Arc::clone(&self.status)
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    /// Why the last run stopped, if it stopped without an error
    pub fn exit(&self) -> Option<Exit> {
        match &self.state {
            VmState::Halted(exit) => Some(exit.clone()),
            _ => None,
        }
    }

    /// Every value output so far, including values already drained from the
    /// output channel
    pub fn result(&self) -> &[Word] {
        &self.result
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable access to memory, e.g. to patch words before a run
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn relative_base(&self) -> &Word {
        &self.relative_base
    }

    pub fn instructions_executed(&self) -> u64 {
        self.instructions_executed
    }

    /// Decode the word at the instruction pointer
    pub fn current_instruction(&self) -> Instruction {
        Instruction::decode(self.memory.read(self.ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::words;

    #[test]
    fn test_new_interpreter_is_ready() {
        let vm = Interpreter::new(&[99]);
        assert_eq!(vm.state(), &VmState::Ready);
        assert_eq!(vm.ip(), 0);
        assert!(vm.relative_base().is_zero());
        assert!(!vm.is_halted());
        assert!(!vm.is_waiting());
        assert_eq!(vm.exit(), None);
        assert_eq!(vm.current_instruction().opcode, Some(Opcode::Halt));
    }

    #[test]
    fn test_run_halts_and_closes_output() {
        let mut vm = Interpreter::new(&[104, 5, 99]);
        assert_eq!(vm.run(), Ok(Exit::Halted));
        assert!(vm.is_halted());
        assert!(vm.ports().output.is_closed());
        assert_eq!(vm.pop_output(), Some(Word::from(5)));
        assert_eq!(vm.pop_output(), None);
        assert_eq!(vm.instructions_executed(), 2);
    }

    #[test]
    fn test_non_blocking_output_accessors() {
        let mut vm = Interpreter::new(&[104, 1, 104, 2, 99]);
        assert!(!vm.has_output());
        assert_eq!(vm.try_pop_output(), None);

        vm.run().unwrap();
        assert!(vm.has_output());
        assert_eq!(vm.try_pop_output(), Some(Word::from(1)));
        assert_eq!(vm.try_pop_output(), Some(Word::from(2)));
        assert!(!vm.has_output());
        assert_eq!(vm.try_pop_output(), None);
        assert_eq!(vm.result(), words([1, 2]).as_slice());
    }

    #[test]
    fn test_push_input_before_run() {
        let mut vm = Interpreter::new(&[3, 0, 4, 0, 99]);
        vm.push_input(-12);
        assert_eq!(vm.run(), Ok(Exit::Halted));
        assert_eq!(vm.result(), words([-12]).as_slice());
    }

    #[test]
    fn test_memory_mut_patches_program() {
        // Output address 0, patched from 4 to 2 before running
        let mut vm = Interpreter::new(&[4, 0, 99]);
        vm.memory_mut().write(1, Word::from(2));
        vm.run().unwrap();
        assert_eq!(vm.result(), words([99]).as_slice());
    }

    #[test]
    fn test_step_after_halt_repeats_exit() {
        let mut vm = Interpreter::new(&[99]);
        assert_eq!(vm.step(), Ok(Some(Exit::Halted)));
        assert_eq!(vm.step(), Ok(Some(Exit::Halted)));
        assert_eq!(vm.instructions_executed(), 1);
    }

    #[test]
    fn test_step_by_step() {
        let mut vm = Interpreter::new(&[1101, 2, 3, 5, 99, 0]);
        assert_eq!(vm.step(), Ok(None));
        assert_eq!(vm.ip(), 4);
        assert_eq!(vm.state(), &VmState::Running);
        assert_eq!(vm.memory().read(5), Word::from(5));
        assert_eq!(vm.step(), Ok(Some(Exit::Halted)));
    }

    #[test]
    fn test_fault_is_sticky() {
        let mut vm = Interpreter::new(&[11101, 1, 1, 0, 99]);
        let err = VmError::ImmediateWrite { ip: 0, operand: 3 };
        assert_eq!(vm.run(), Err(err.clone()));
        assert_eq!(vm.state(), &VmState::Faulted(err.clone()));
        assert!(vm.is_halted());
        assert_eq!(vm.step(), Err(err));
    }

    #[test]
    fn test_rerun_starts_at_zero() {
        // Counts up in address 9 each run
        let program = [1001, 9, 1, 9, 4, 9, 99, 0, 0, 0];
        let mut vm = Interpreter::new(&program);
        assert_eq!(vm.run(), Ok(Exit::Halted));
        assert_eq!(vm.run(), Ok(Exit::Halted));
        assert_eq!(vm.result(), words([1, 2]).as_slice());
        assert!(!vm.ports().output.is_empty());
    }
}
