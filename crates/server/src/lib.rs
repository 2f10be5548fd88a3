//! Kubernetes api tester server
//!
//! Exposes probe, traffic-control and failure-injection endpoints on top of
//! `tester-lib`.

pub mod api;
pub mod config;
