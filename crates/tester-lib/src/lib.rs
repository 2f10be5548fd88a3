//! Core library for the Kubernetes api tester
//!
//! This crate provides:
//! - Readiness/liveness state and probe reporting
//! - Traffic controls (drain, re-attach, fault injection)
//! - Synthetic memory and CPU exhaustion
//! - Marker files for volume mount checks
//! - Structured logging helpers

pub mod health;
pub mod observability;
pub mod stress;
pub mod traffic;
pub mod volume;

pub use health::{HealthState, ProbeKind, ProbeReport, ProbeReporter};
pub use observability::{hostname, StructuredLogger};
pub use stress::{CpuBurster, LoadJob, MemoryAccumulator, MemoryStore, StopToken};
pub use traffic::TrafficController;
pub use volume::{MarkerVolume, VolumeError};
