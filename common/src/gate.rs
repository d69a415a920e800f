use serde::{Deserialize, Serialize};

/// When the auto-close timer is allowed to fire.
///
/// Both variants are fielded: `Timeout` closes unconditionally once the delay
/// elapses, `OccupancyGated` additionally waits until at least one monitored
/// slot is occupied so an empty gate is not shut in a vehicle's face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoClosePolicy {
    Timeout,
    OccupancyGated,
}

/// Why the gate moved, carried on every emitted gate event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateCause {
    VoucherValidated,
    Command,
    AutoClose,
    SlotVacated,
    CorrectArrival,
}

impl GateCause {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VoucherValidated => "voucher validated",
            Self::Command => "remote command",
            Self::AutoClose => "auto-close timer",
            Self::SlotVacated => "slot vacated",
            Self::CorrectArrival => "vehicle at reserved slot",
        }
    }
}

/// Entrance gate position and auto-close timing.
///
/// `open`/`close` report whether the position actually changed so callers
/// emit exactly one servo callback per physical movement. Re-opening an
/// already-open gate restarts the auto-close timer without a duplicate event.
#[derive(Debug, Clone, Default)]
pub struct GateController {
    open: bool,
    opened_at_ms: u64,
}

impl GateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn opened_at_ms(&self) -> u64 {
        self.opened_at_ms
    }

    pub fn open(&mut self, now_ms: u64) -> bool {
        self.opened_at_ms = now_ms;
        if self.open {
            return false;
        }
        self.open = true;
        true
    }

    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        true
    }

    pub fn auto_close_due(
        &self,
        now_ms: u64,
        delay_ms: u64,
        policy: AutoClosePolicy,
        any_occupied: bool,
    ) -> bool {
        if !self.open {
            return false;
        }
        if now_ms.saturating_sub(self.opened_at_ms) < delay_ms {
            return false;
        }
        match policy {
            AutoClosePolicy::Timeout => true,
            AutoClosePolicy::OccupancyGated => any_occupied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_close_report_changes_once() {
        let mut gate = GateController::new();

        assert!(gate.open(100));
        assert!(!gate.open(200));
        assert!(gate.close());
        assert!(!gate.close());
    }

    #[test]
    fn reopen_restarts_auto_close_timer() {
        let mut gate = GateController::new();
        gate.open(0);
        gate.open(4_000);

        assert!(!gate.auto_close_due(5_500, 5_000, AutoClosePolicy::Timeout, false));
        assert!(gate.auto_close_due(9_000, 5_000, AutoClosePolicy::Timeout, false));
    }

    #[test]
    fn timeout_policy_closes_regardless_of_occupancy() {
        let mut gate = GateController::new();
        gate.open(0);

        assert!(!gate.auto_close_due(4_999, 5_000, AutoClosePolicy::Timeout, false));
        assert!(gate.auto_close_due(5_000, 5_000, AutoClosePolicy::Timeout, false));
    }

    #[test]
    fn occupancy_gated_policy_waits_for_a_vehicle() {
        let mut gate = GateController::new();
        gate.open(0);

        assert!(!gate.auto_close_due(6_000, 5_000, AutoClosePolicy::OccupancyGated, false));
        assert!(gate.auto_close_due(6_000, 5_000, AutoClosePolicy::OccupancyGated, true));
    }

    #[test]
    fn closed_gate_never_auto_closes() {
        let gate = GateController::new();

        assert!(!gate.auto_close_due(60_000, 5_000, AutoClosePolicy::Timeout, true));
    }
}
