//! Trailing-edge debounce driven by explicit instants.

use std::time::{Duration, Instant};

/// Collapses a burst of calls into one firing, `delay` after the last call,
/// carrying the last call's argument.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    deadline: Option<Instant>,
    last: Option<T>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            last: None,
        }
    }

    /// Register a call, replacing any pending argument and restarting the delay.
    pub fn call(&mut self, arg: T, now: Instant) {
        self.last = Some(arg);
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Take the pending argument if the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// Take the pending argument immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.last.take()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
        self.last = None;
    }
}
