//! Thread-safe FIFO channels connecting the VM to its driver.
//!
//! A [`Channel`] is a cloneable handle onto one shared queue: every clone
//! pushes to and pops from the same values. Reads block on a condition
//! variable while the queue is empty, until a value arrives or the channel
//! is closed. Closing only wakes readers; values already queued stay
//! readable, so a reader sees every value before it sees end-of-stream.
//!
//! The channel also counts readers blocked in [`Channel::pop`]. An open
//! channel is *starved* while such a reader exists and nothing is queued,
//! which is exactly when a VM reading from it is stuck waiting for input.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::word::Word;

#[derive(Debug, Default)]
struct Queue {
    values: VecDeque<Word>,
    closed: bool,
    blocked_readers: usize,
}

impl Queue {
    fn is_starved(&self) -> bool {
        self.blocked_readers > 0 && self.values.is_empty() && !self.closed
    }
}

#[derive(Debug, Default)]
struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    // Signalled when a reader blocks, on close, and by `wake_watchers`
    starved: Condvar,
}

/// Unbounded blocking queue of IntCode words
#[derive(Debug, Clone, Default)]
pub struct Channel {
    shared: Arc<Shared>,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel pre-loaded with `values`
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Word>,
    {
        let channel = Self::new();
        channel.extend(values);
        channel
    }

    // The queue holds plain values, so a panic elsewhere cannot leave it
    // inconsistent; keep going with the inner guard.
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.shared.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, value: impl Into<Word>) {
        self.lock().values.push_back(value.into());
        self.shared.available.notify_one();
    }

    pub fn extend<I>(&self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Word>,
    {
        self.lock().values.extend(values.into_iter().map(Into::into));
        self.shared.available.notify_all();
    }

    /// Pop the next value, blocking while the channel is empty.
    /// Returns `None` once the channel is closed and drained.
    pub fn pop(&self) -> Option<Word> {
        let mut queue = self.lock();
        if queue.values.is_empty() && !queue.closed {
            queue.blocked_readers += 1;
            self.shared.starved.notify_all();
            queue = self
                .shared
                .available
                .wait_while(queue, |q| q.values.is_empty() && !q.closed)
                .unwrap_or_else(PoisonError::into_inner);
            queue.blocked_readers -= 1;
        }
        queue.values.pop_front()
    }

    /// Like [`Channel::pop`], giving up after `timeout`
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Word> {
        let guard = self.lock();
        let (mut queue, _) = self
            .shared
            .available
            .wait_timeout_while(guard, timeout, |q| q.values.is_empty() && !q.closed)
            .unwrap_or_else(PoisonError::into_inner);
        queue.values.pop_front()
    }

    /// Pop the next value if one is queued, never blocking
    pub fn try_pop(&self) -> Option<Word> {
        self.lock().values.pop_front()
    }

    /// Remove and return everything currently queued
    pub fn drain(&self) -> Vec<Word> {
        self.lock().values.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().values.is_empty()
    }

    /// Mark the channel as finished and wake every blocked reader
    pub fn close(&self) {
        self.lock().closed = true;
        self.shared.available.notify_all();
        self.shared.starved.notify_all();
    }

    pub fn reopen(&self) {
        self.lock().closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// A reader is blocked in [`Channel::pop`], nothing is queued for it and
    /// the channel is still open
    pub fn is_starved(&self) -> bool {
        self.lock().is_starved()
    }

    /// Block until the channel is starved, it is closed, or `stop` returns
    /// true. Returns whether the channel is starved.
    ///
    /// `stop` is evaluated under the queue lock; whoever makes it true must
    /// call [`Channel::wake_watchers`] afterwards.
    pub fn wait_until_starved(&self, stop: impl Fn() -> bool) -> bool {
        let guard = self.lock();
        let queue = self
            .shared
            .starved
            .wait_while(guard, |q| !q.is_starved() && !q.closed && !stop())
            .unwrap_or_else(PoisonError::into_inner);
        queue.is_starved()
    }

    /// Wake threads in [`Channel::wait_until_starved`] to re-check their
    /// stop condition
    pub fn wake_watchers(&self) {
        let _queue = self.lock();
        self.shared.starved.notify_all();
    }

    /// Whether two handles refer to the same queue
    pub fn same_channel(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/// The input/output channel pair of one interpreter
#[derive(Debug, Clone, Default)]
pub struct Ports {
    pub input: Channel,
    pub output: Channel,
}

impl Ports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Word>,
    {
        Self {
            input: Channel::from_values(values),
            output: Channel::new(),
        }
    }

    /// Use existing channels, e.g. another interpreter's output as input
    pub fn connect(input: Channel, output: Channel) -> Self {
        Self { input, output }
    }
}
