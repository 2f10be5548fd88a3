//! Memory leak simulation
//!
//! Grows an append-only store of 1 MiB blocks every 10 ms until the process is
//! killed, normally by the container's memory limit. Allocation failure is the
//! intended end state and is not guarded.

use super::StopToken;
use crate::health::HealthState;
use crate::observability::StructuredLogger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Size of one retained block
pub const BLOCK_SIZE: usize = 1024 * 1024;

/// Pause between two allocations of one accumulation task
pub const ACCUMULATION_INTERVAL: Duration = Duration::from_millis(10);

/// An opaque retained allocation
///
/// The buffer is filled rather than only reserved, so every page is touched
/// and counts against resident memory.
pub struct MemoryBlock {
    _bytes: Box<[u8]>,
}

impl MemoryBlock {
    pub fn allocate() -> Self {
        Self {
            _bytes: vec![0xA5u8; BLOCK_SIZE].into_boxed_slice(),
        }
    }
}

/// Process-wide retained blocks; never shrinks
#[derive(Clone, Default)]
pub struct MemoryStore {
    blocks: Arc<Mutex<Vec<MemoryBlock>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, block: MemoryBlock) {
        self.blocks.lock().await.push(block);
    }

    pub async fn block_count(&self) -> usize {
        self.blocks.lock().await.len()
    }
}

/// Launches memory accumulation tasks
#[derive(Clone)]
pub struct MemoryAccumulator {
    health: HealthState,
    store: MemoryStore,
    logger: StructuredLogger,
    interval: Duration,
    stop: StopToken,
}

impl MemoryAccumulator {
    pub fn new(health: HealthState, logger: StructuredLogger) -> Self {
        Self {
            health,
            store: MemoryStore::new(),
            logger,
            interval: ACCUMULATION_INTERVAL,
            stop: StopToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Share a stop token with every task this accumulator launches
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Drain readiness, then start one more accumulation task
    ///
    /// Must be called from within a tokio runtime. Each call adds a task;
    /// earlier tasks keep running.
    pub fn trigger(&self) -> JoinHandle<()> {
        self.health.set_ready(false);
        self.logger
            .log_memory_leak_started(BLOCK_SIZE, self.interval.as_millis());

        let store = self.store.clone();
        let interval = self.interval;
        let stop = self.stop.clone();
        tokio::spawn(accumulate(store, interval, stop))
    }
}

async fn accumulate(store: MemoryStore, interval: Duration, stop: StopToken) {
    while !stop.is_stopped() {
        store.push(MemoryBlock::allocate()).await;
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator(health: &HealthState, stop: &StopToken) -> MemoryAccumulator {
        MemoryAccumulator::new(health.clone(), StructuredLogger::new("test-node"))
            .with_interval(Duration::from_millis(5))
            .with_stop_token(stop.clone())
    }

    #[tokio::test]
    async fn test_trigger_drains_readiness_before_allocating() {
        let health = HealthState::new();
        health.mark_started();
        let stop = StopToken::new();
        stop.stop();

        let accumulator = accumulator(&health, &stop);
        accumulator.trigger().await.unwrap();

        assert!(!health.is_ready());
        assert!(health.is_live());
        assert_eq!(accumulator.store().block_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_grows_until_stopped() {
        let health = HealthState::new();
        let stop = StopToken::new();
        let accumulator = accumulator(&health, &stop);

        let handle = accumulator.trigger();
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop.stop();
        handle.await.unwrap();

        let count = accumulator.store().block_count().await;
        assert!(count >= 2, "expected several blocks, got {}", count);

        // Nothing is released after the task ends
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(accumulator.store().block_count().await, count);
    }

    #[tokio::test]
    async fn test_retriggering_stacks_tasks() {
        let health = HealthState::new();
        let stop = StopToken::new();
        let accumulator = accumulator(&health, &stop);

        let first = accumulator.trigger();
        let second = accumulator.trigger();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!first.is_finished());
        assert!(!second.is_finished());

        stop.stop();
        first.await.unwrap();
        second.await.unwrap();
        assert!(accumulator.store().block_count().await >= 2);
    }
}
