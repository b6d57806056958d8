use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{Exit, Interpreter, Ports, RunStatus};
use crate::constants::VM_THREAD_NAME;
use crate::error::VmError;
use crate::word::Word;

type RunOutcome = (Interpreter, Result<Exit, VmError>);

/// Driver-side handle on an interpreter running on a background thread.
///
/// There is no cancellation: dropping the handle (or calling
/// [`RunHandle::detach`]) leaves the thread running. A detached run that is
/// blocked on input stays blocked until process exit unless the input
/// channel is closed.
pub struct RunHandle {
    ports: Ports,
    status: Arc<RunStatus>,
    thread: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub(super) fn spawn(mut vm: Interpreter) -> Result<Self, VmError> {
        let ports = vm.ports().clone();
        let status = vm.status();

        let thread = thread::Builder::new()
            .name(VM_THREAD_NAME.to_string())
            .spawn(move || {
                let outcome = vm.run();
                if let Err(ref e) = outcome {
                    log::debug!("Background run ended with error: {e}");
                }
                (vm, outcome)
            })?;

        Ok(RunHandle {
            ports,
            status,
            thread,
        })
    }

    pub fn push_input(&self, value: impl Into<Word>) {
        self.ports.input.push(value);
    }

    pub fn extend_input<I>(&self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Word>,
    {
        self.ports.input.extend(values);
    }

    /// Feed a line of text as ASCII codes
    pub fn push_ascii(&self, text: &str) {
        self.ports.input.extend(text.bytes());
    }

    /// Block until the VM outputs a value. Returns `None` once the run has
    /// ended and every output value has been taken.
    pub fn pop_output(&self) -> Option<Word> {
        self.ports.output.pop()
    }

    pub fn pop_output_timeout(&self, timeout: Duration) -> Option<Word> {
        self.ports.output.pop_timeout(timeout)
    }

    pub fn try_pop_output(&self) -> Option<Word> {
        self.ports.output.try_pop()
    }

    /// Take `count` consecutive outputs, e.g. one `(x, y, tile)` update.
    /// Returns `None` if the run ends first.
    pub fn pop_outputs(&self, count: usize) -> Option<Vec<Word>> {
        (0..count).map(|_| self.pop_output()).collect()
    }

    /// Block until the VM needs input that has not been supplied, or the
    /// run ends. Returns `true` in the first case.
    ///
    /// Every value the VM output before asking for input is already queued
    /// on the output channel when this returns.
    pub fn wait_for_input(&self) -> bool {
        let status = &self.status;
        self.ports.input.wait_until_starved(|| status.is_halted())
    }

    pub fn has_output(&self) -> bool {
        !self.ports.output.is_empty()
    }

    pub fn is_halted(&self) -> bool {
        self.status.is_halted()
    }

    /// Whether the VM is currently blocked on an empty input channel
    pub fn is_waiting(&self) -> bool {
        self.ports.input.is_starved()
    }

    /// Close the input channel, ending a run that is (or will be) waiting
    /// for input with [`VmError::InputClosed`]
    pub fn close_input(&self) {
        self.ports.input.close();
    }

    pub fn ports(&self) -> &Ports {
        &self.ports
    }

    /// Wait for the run to end and take back the interpreter
    pub fn join(self) -> Result<RunOutcome, VmError> {
        self.thread.join().map_err(|payload| VmError::ThreadPanicked {
            message: panic_message(payload.as_ref()),
        })
    }

    /// Stop tracking the background thread without waiting for it
    pub fn detach(self) {
        log::debug!("Detaching VM thread (halted: {})", self.is_halted());
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
