//! Observability helpers for the api tester
//!
//! Provides structured logging with tracing. Every significant action
//! (probe checks, traffic toggles, stress launches) is emitted as one event
//! carrying an `event` field and the host name.

use crate::health::ProbeKind;
use tracing::{info, warn};

/// Resolve the host identifier reported by `/hostname` and tagged on logs
///
/// Kubernetes sets `HOSTNAME` to the pod name, so that wins over the kernel
/// host name.
pub fn hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.is_empty() {
            return name;
        }
    }

    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|name| name.trim().to_string())
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Structured logger for tester events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    host: String,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new(hostname())
    }
}

impl StructuredLogger {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Log a probe evaluation
    pub fn log_probe(&self, probe: ProbeKind, succeeded: bool, checked_at: i64) {
        let outcome = if succeeded { "Succeed" } else { "Failed" };
        info!(
            event = "probe_checked",
            host = %self.host,
            probe = %probe,
            succeeded = succeeded,
            checked_at = checked_at,
            "[Kubernetes] {}Probe is {} -> [System] status: {}",
            probe,
            outcome,
            succeeded
        );
    }

    pub fn log_traffic_off(&self) {
        warn!(
            event = "traffic_off",
            host = %self.host,
            "[System] Traffic is forcibly stopped"
        );
    }

    pub fn log_traffic_on(&self) {
        info!(
            event = "traffic_on",
            host = %self.host,
            "[System] Traffic is reconnected"
        );
    }

    pub fn log_server_error(&self) {
        warn!(
            event = "server_error",
            host = %self.host,
            "[System] An error occurred on the server"
        );
    }

    /// Log the launch of a memory accumulation task
    pub fn log_memory_leak_started(&self, block_bytes: usize, interval_ms: u128) {
        warn!(
            event = "memory_leak_started",
            host = %self.host,
            block_bytes = block_bytes,
            interval_ms = interval_ms,
            "{} : memoryLeak is starting",
            self.host
        );
    }

    /// Log the launch of a CPU burst batch
    pub fn log_cpu_load_started(&self, minutes: i64, workers: usize, duty_cycle: f64) {
        warn!(
            event = "cpu_load_started",
            host = %self.host,
            minutes = minutes,
            workers = workers,
            duty_cycle = duty_cycle,
            "CPU load started"
        );
    }

    pub fn log_cpu_worker_started(&self, worker_id: usize, minutes: i64) {
        info!(
            event = "cpu_worker_started",
            host = %self.host,
            worker_id = worker_id,
            started_at = %chrono::Utc::now().to_rfc3339(),
            "{} : cpuLoad thread-{} starting ({} min)",
            self.host,
            worker_id,
            minutes
        );
    }

    pub fn log_cpu_worker_finished(&self, worker_id: usize, cycles: u64) {
        info!(
            event = "cpu_worker_finished",
            host = %self.host,
            worker_id = worker_id,
            cycles = cycles,
            "CPU load worker finished"
        );
    }

    pub fn log_marker_file_created(&self, path: &str) {
        info!(
            event = "marker_file_created",
            host = %self.host,
            path = %path,
            "File created: {}",
            path
        );
    }

    /// Log application startup
    pub fn log_startup(&self, version: &str, profile: &str, port: u16) {
        info!(
            event = "app_started",
            host = %self.host,
            version = %version,
            profile = %profile,
            port = port,
            "Api tester started"
        );
    }

    /// Log application shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "app_shutdown",
            host = %self.host,
            reason = %reason,
            "Api tester shutting down"
        );
    }
}
