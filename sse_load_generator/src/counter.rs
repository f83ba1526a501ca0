use std::sync::atomic::{AtomicI64, Ordering};

/// Number of connections currently between "established" and "shutdown".
///
/// Under [`CounterPolicy::Faithful`] a connection that fails after being
/// established never gives its slot back, so the value can drift above the
/// true number of open streams.
#[derive(Debug, Default)]
pub struct ConnectionCounter {
    active: AtomicI64,
}

impl ConnectionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value after the increment.
    pub fn established(&self) -> i64 {
        self.active.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the value after the decrement.
    pub fn released(&self) -> i64 {
        self.active.fetch_sub(1, Ordering::SeqCst) - 1
    }

    pub fn current(&self) -> i64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// What a connection does with its counter slot when its stream fails after
/// being established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterPolicy {
    /// Keep the slot; the counter drifts on every mid-stream failure.
    #[default]
    Faithful,
    /// Release the slot, keeping the counter equal to the open streams.
    Balanced,
}
