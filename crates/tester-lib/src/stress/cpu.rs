//! CPU load simulation
//!
//! Each worker is a dedicated OS thread alternating a non-yielding busy loop
//! and a sleep inside a 100 ms window. Workers share nothing: each one times
//! itself against the job duration and exits on its own.

use super::StopToken;
use crate::observability::StructuredLogger;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::warn;

/// Duration used when `min` is missing, zero or not a number
pub const DEFAULT_MINUTES: i64 = 2;

/// Worker count used when `thread` is missing, zero or not a number
pub const DEFAULT_WORKERS: i64 = 10;

/// Fraction of each window spent busy
pub const DUTY_CYCLE: f64 = 0.8;

/// Length of one busy + idle cycle
pub const CYCLE_WINDOW: Duration = Duration::from_millis(100);

/// Stack size of a burst worker; the loop needs almost none
pub const WORKER_STACK_SIZE: usize = 256 * 1024;

/// Parameters of one CPU burst
#[derive(Debug, Clone, PartialEq)]
pub struct LoadJob {
    /// Requested duration in minutes, as echoed to the caller
    pub minutes: i64,
    /// Requested worker count, as echoed to the caller
    pub threads: i64,
    /// Wall-clock time each worker keeps running; zero for negative minutes
    pub duration: Duration,
    /// Workers actually started; zero for a negative count
    pub worker_count: usize,
    pub duty_cycle: f64,
}

impl LoadJob {
    /// No upper bound is enforced on either value
    pub fn new(minutes: i64, threads: i64) -> Self {
        let minutes_run = u64::try_from(minutes).unwrap_or(0);
        Self {
            minutes,
            threads,
            duration: Duration::from_secs(minutes_run.saturating_mul(60)),
            worker_count: usize::try_from(threads).unwrap_or(0),
            duty_cycle: DUTY_CYCLE,
        }
    }

    /// Build a job from raw query values, falling back to the defaults
    pub fn from_params(min: Option<&str>, thread: Option<&str>) -> Self {
        Self::new(
            parse_or_default(min, DEFAULT_MINUTES),
            parse_or_default(thread, DEFAULT_WORKERS),
        )
    }

    /// Override the run time while keeping the echoed minutes
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Busy part of each window, rounded to whole milliseconds
    pub fn busy_time(&self) -> Duration {
        let window_ms = CYCLE_WINDOW.as_millis() as f64;
        Duration::from_millis((window_ms * self.duty_cycle).round() as u64)
    }

    pub fn idle_time(&self) -> Duration {
        CYCLE_WINDOW.saturating_sub(self.busy_time())
    }

    /// Confirmation text, e.g. `1 min, 2 threads`
    pub fn summary(&self) -> String {
        format!("{} min, {} threads", self.minutes, self.threads)
    }
}

/// Missing, non-numeric and zero values take the default; negatives are kept
fn parse_or_default(raw: Option<&str>, default: i64) -> i64 {
    match raw.and_then(|value| value.parse::<i64>().ok()) {
        Some(0) | None => default,
        Some(value) => value,
    }
}

/// Launches batches of CPU burst workers
#[derive(Debug, Clone)]
pub struct CpuBurster {
    logger: StructuredLogger,
    stop: StopToken,
}

impl CpuBurster {
    pub fn new(logger: StructuredLogger) -> Self {
        Self {
            logger,
            stop: StopToken::new(),
        }
    }

    /// Share a stop token with every worker this burster launches
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    /// Start the batch from a launcher thread and return immediately
    ///
    /// The launcher yields the worker handles it managed to spawn; each
    /// worker handle yields its number of completed duty cycles. Dropping
    /// the launcher handle detaches everything. `None` means not even the
    /// launcher could be spawned.
    pub fn launch(&self, job: &LoadJob) -> Option<JoinHandle<Vec<JoinHandle<u64>>>> {
        self.logger
            .log_cpu_load_started(job.minutes, job.worker_count, job.duty_cycle);

        let job = job.clone();
        let logger = self.logger.clone();
        let stop = self.stop.clone();

        std::thread::Builder::new()
            .name("cpu-load-launcher".to_string())
            .stack_size(WORKER_STACK_SIZE)
            .spawn(move || spawn_workers(&job, &logger, &stop))
            .map_err(|e| warn!(error = %e, "Failed to spawn CPU load launcher"))
            .ok()
    }
}

fn spawn_workers(job: &LoadJob, logger: &StructuredLogger, stop: &StopToken) -> Vec<JoinHandle<u64>> {
    let handles: Vec<JoinHandle<u64>> = (0..job.worker_count)
        .filter_map(|worker_id| {
            let job = job.clone();
            let logger = logger.clone();
            let stop = stop.clone();

            std::thread::Builder::new()
                .name(format!("cpu-load-{}", worker_id))
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || run_worker(worker_id, &job, &logger, &stop))
                .map_err(|e| {
                    warn!(worker_id = worker_id, error = %e, "Failed to spawn CPU load worker")
                })
                .ok()
        })
        .collect();

    if handles.len() < job.worker_count {
        warn!(
            requested = job.worker_count,
            started = handles.len(),
            "CPU load batch started short"
        );
    }
    handles
}

fn run_worker(worker_id: usize, job: &LoadJob, logger: &StructuredLogger, stop: &StopToken) -> u64 {
    logger.log_cpu_worker_started(worker_id, job.minutes);

    let started = Instant::now();
    let busy = job.busy_time();
    let idle = job.idle_time();
    let mut cycles = 0u64;

    while started.elapsed() < job.duration && !stop.is_stopped() {
        busy_wait(busy);
        std::thread::sleep(idle);
        cycles += 1;
    }

    logger.log_cpu_worker_finished(worker_id, cycles);
    cycles
}

/// Spin on the clock without yielding
fn busy_wait(duration: Duration) {
    let started = Instant::now();
    while started.elapsed() < duration {
        std::hint::spin_loop();
    }
}
