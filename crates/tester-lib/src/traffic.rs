//! Operator controls over the health flags
//!
//! `traffic_off`/`traffic_on` simulate a load balancer detaching and
//! re-attaching the instance. `inject_fault` simulates an unrecoverable crash:
//! nothing exposed here sets liveness back to true, only a restart does.

use crate::health::HealthState;
use crate::observability::StructuredLogger;

#[derive(Debug, Clone)]
pub struct TrafficController {
    health: HealthState,
    logger: StructuredLogger,
}

impl TrafficController {
    pub fn new(health: HealthState, logger: StructuredLogger) -> Self {
        Self { health, logger }
    }

    /// Stop receiving traffic (readiness fails)
    pub fn traffic_off(&self) {
        self.health.set_ready(false);
        self.logger.log_traffic_off();
    }

    /// Receive traffic again (readiness succeeds)
    pub fn traffic_on(&self) {
        self.health.set_ready(true);
        self.logger.log_traffic_on();
    }

    /// Mark the process as crashed (liveness fails until restart)
    pub fn inject_fault(&self) {
        self.health.set_live(false);
        self.logger.log_server_error();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> (HealthState, TrafficController) {
        let health = HealthState::new();
        health.mark_started();
        let controller = TrafficController::new(health.clone(), StructuredLogger::new("test-node"));
        (health, controller)
    }

    #[test]
    fn test_traffic_toggle_last_write_wins() {
        let (health, controller) = started();

        controller.traffic_off();
        controller.traffic_off();
        assert!(!health.is_ready());

        controller.traffic_on();
        assert!(health.is_ready());

        controller.traffic_on();
        controller.traffic_off();
        assert!(!health.is_ready());
    }

    #[test]
    fn test_traffic_controls_leave_liveness_alone() {
        let (health, controller) = started();
        controller.traffic_off();
        assert!(health.is_live());
    }

    #[test]
    fn test_fault_is_irreversible_through_controls() {
        let (health, controller) = started();
        controller.inject_fault();
        assert!(!health.is_live());

        controller.traffic_on();
        controller.traffic_off();
        controller.traffic_on();
        assert!(!health.is_live());
        assert!(health.is_ready());
    }
}
