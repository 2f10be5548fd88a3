//! Health state and probe reporting
//!
//! Holds the two process-wide flags Kubernetes probes look at and turns them
//! into probe reports. Readiness and liveness are independent: a process can
//! be live but drained, or ready but about to be marked as crashed.

use crate::observability::StructuredLogger;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Body returned by the startup and liveness probes on success
pub const APP_INITIALIZATION_BODY: &str = "<b>[App Initialization]</b><br>DB Connected : OK<br>Spring Initialization : OK<br>Jar is Running : OK";

/// Body returned by the readiness probe on success
pub const USER_INITIALIZATION_BODY: &str = "<b>[User Initialization]</b><br>Init Data : OK<br>Linkage System Check : OK<br>DB Data Validation : OK";

/// Shared readiness/liveness flags
///
/// Cloning is cheap and every clone observes the same flags. Reads and writes
/// are single atomic operations, so a racing reader sees either the old or the
/// new value.
#[derive(Debug, Clone)]
pub struct HealthState {
    ready: Arc<AtomicBool>,
    live: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (initially not ready and not live)
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Mark startup as complete: ready and live
    pub fn mark_started(&self) {
        self.set_live(true);
        self.set_ready(true);
    }
}

/// Probe types reported to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Startup,
    Readiness,
    Liveness,
}

impl ProbeKind {
    /// Success body for this probe
    pub fn body(&self) -> &'static str {
        match self {
            ProbeKind::Startup | ProbeKind::Liveness => APP_INITIALIZATION_BODY,
            ProbeKind::Readiness => USER_INITIALIZATION_BODY,
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeKind::Startup => "startup",
            ProbeKind::Readiness => "readiness",
            ProbeKind::Liveness => "liveness",
        };
        f.write_str(name)
    }
}

/// Outcome of a single probe evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub probe: ProbeKind,
    pub succeeded: bool,
    /// Success body, `None` when the probe failed
    pub body: Option<&'static str>,
    pub checked_at: i64,
}

/// Translates [`HealthState`] into probe reports, logging every evaluation
#[derive(Debug, Clone)]
pub struct ProbeReporter {
    health: HealthState,
    logger: StructuredLogger,
}

impl ProbeReporter {
    pub fn new(health: HealthState, logger: StructuredLogger) -> Self {
        Self { health, logger }
    }

    /// Evaluate a probe against the current flags
    ///
    /// Readiness reads the ready flag; startup and liveness read the live flag.
    pub fn report(&self, probe: ProbeKind) -> ProbeReport {
        let succeeded = match probe {
            ProbeKind::Readiness => self.health.is_ready(),
            ProbeKind::Startup | ProbeKind::Liveness => self.health.is_live(),
        };
        let checked_at = chrono::Utc::now().timestamp();

        self.logger.log_probe(probe, succeeded, checked_at);

        ProbeReport {
            probe,
            succeeded,
            body: succeeded.then(|| probe.body()),
            checked_at,
        }
    }

    pub fn report_readiness(&self) -> ProbeReport {
        self.report(ProbeKind::Readiness)
    }

    pub fn report_liveness(&self) -> ProbeReport {
        self.report(ProbeKind::Liveness)
    }

    pub fn report_startup(&self) -> ProbeReport {
        self.report(ProbeKind::Startup)
    }
}
