//! Synthetic resource exhaustion
//!
//! This module provides:
//! - A memory accumulator that retains 1 MiB blocks forever
//! - A CPU burster that saturates cores at a fixed duty cycle for a bounded time
//!
//! Both generators are fire-and-forget. Triggering again while a previous run
//! is still going stacks another run on top of it.

mod cpu;
mod memory;

pub use cpu::{CpuBurster, LoadJob, CYCLE_WINDOW, DEFAULT_MINUTES, DEFAULT_WORKERS, DUTY_CYCLE};
pub use memory::{
    MemoryAccumulator, MemoryBlock, MemoryStore, ACCUMULATION_INTERVAL, BLOCK_SIZE,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative stop signal checked by generator loops
///
/// Production code never stops a generator; tests inject a token to bound
/// how long a run lasts.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_token_shared_between_clones() {
        let token = StopToken::new();
        let clone = token.clone();
        assert!(!clone.is_stopped());

        token.stop();
        assert!(clone.is_stopped());
    }
}
