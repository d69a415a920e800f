use crate::alarm::BuzzerController;
use crate::command::{Command, GateAction};
use crate::config::ControlConfig;
use crate::gate::{GateCause, GateController};
use crate::reservation::{ReservationOutcome, ReservationTracker};
use crate::slot::{SlotId, SlotMonitor, SLOT_COUNT};
use crate::types::BuzzerState;

/// Something the host must do as a result of an engine step: drive an
/// actuator, and/or publish telemetry. Events are emitted in the order the
/// hardware should see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Debounced occupancy change; published to the slot status topic and the
    /// backend sensor-update endpoint.
    SlotChanged { slot: SlotId, occupied: bool },
    /// Reservation indicator changed together with the reservation itself.
    IndicatorChanged {
        on: bool,
        slot: SlotId,
        reason: &'static str,
    },
    /// Manual indicator override from the bus. Drives the LED only; the
    /// reservation and its indicator flag are untouched.
    IndicatorOverride { on: bool },
    /// Buzzer actuator/log change. `Paused` never touches the actuator.
    BuzzerChanged {
        state: BuzzerState,
        slot: SlotId,
        reason: String,
    },
    /// Gate moved; drives the servo and emits the servo callback.
    GateMoved { open: bool, cause: GateCause },
}

/// Read-only view for the health monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub occupancy: [bool; SLOT_COUNT as usize],
    pub reserved_slot: Option<u8>,
    pub indicator_on: bool,
    pub alarm_active: bool,
    pub gate_open: bool,
}

/// The control core: debounced slot occupancy, the single reservation, the
/// wrong-slot alarm, and the entrance gate, stepped together.
///
/// The engine is pure - time is injected, hardware reads come in as raw
/// levels, and every method returns the events the caller must execute. The
/// host serializes all access through one lock, so gate mutations from the
/// command path and the auto-close timer cannot race.
#[derive(Debug, Clone)]
pub struct ParkingEngine {
    config: ControlConfig,
    slots: SlotMonitor,
    reservation: ReservationTracker,
    alarm: BuzzerController,
    gate: GateController,
}

impl ParkingEngine {
    pub fn new(config: ControlConfig) -> Self {
        let slots = SlotMonitor::new(config.debounce_window_ms);
        Self {
            config,
            slots,
            reservation: ReservationTracker::new(),
            alarm: BuzzerController::new(),
            gate: GateController::new(),
        }
    }

    /// Boot-time seeding of occupancy from an initial sensor sweep.
    pub fn prime_slot(&mut self, slot: SlotId, raw_level: bool) {
        self.slots.prime(slot, raw_level);
    }

    /// Feeds one raw sensor reading for one slot.
    pub fn poll_slot(&mut self, slot: SlotId, raw_level: bool, now_ms: u64) -> Vec<EngineEvent> {
        let Some(transition) = self.slots.poll(slot, raw_level, now_ms) else {
            return Vec::new();
        };

        let mut events = vec![EngineEvent::SlotChanged {
            slot: transition.slot,
            occupied: transition.occupied,
        }];

        let outcome = self
            .reservation
            .on_transition(transition, self.alarm.is_active());

        if let ReservationOutcome::CorrectSlotArrival { slot } = outcome {
            events.push(EngineEvent::IndicatorChanged {
                on: false,
                slot,
                reason: "Vehicle detected at reserved slot",
            });
        }

        if let Some(alarm_event) = self.alarm.apply(&outcome, now_ms) {
            events.push(EngineEvent::BuzzerChanged {
                state: alarm_event.state,
                slot: alarm_event.slot,
                reason: alarm_event.reason,
            });
        }

        if matches!(outcome, ReservationOutcome::CorrectSlotArrival { .. }) && self.gate.close() {
            events.push(EngineEvent::GateMoved {
                open: false,
                cause: GateCause::CorrectArrival,
            });
        }

        if !transition.occupied && self.config.close_on_slot_exit && self.gate.close() {
            events.push(EngineEvent::GateMoved {
                open: false,
                cause: GateCause::SlotVacated,
            });
        }

        events
    }

    /// A voucher came back valid for `slot`: reserve it, light the indicator,
    /// open the gate. Any prior reservation is overwritten.
    pub fn on_voucher_valid(&mut self, slot: SlotId, now_ms: u64) -> Vec<EngineEvent> {
        self.reservation.activate(slot, now_ms);

        let mut events = vec![EngineEvent::IndicatorChanged {
            on: true,
            slot,
            reason: "Voucher validated for slot",
        }];

        if self.gate.open(now_ms) {
            events.push(EngineEvent::GateMoved {
                open: true,
                cause: GateCause::VoucherValidated,
            });
        }

        events
    }

    /// Applies a decoded inbound command. The gate path here is the manual
    /// override; it does not consult the reservation.
    pub fn apply_command(&mut self, command: Command, now_ms: u64) -> Vec<EngineEvent> {
        match command {
            Command::Gate { action, .. } => {
                let moved = match action {
                    GateAction::Open => self.gate.open(now_ms),
                    GateAction::Close => self.gate.close(),
                };
                if moved {
                    vec![EngineEvent::GateMoved {
                        open: matches!(action, GateAction::Open),
                        cause: GateCause::Command,
                    }]
                } else {
                    Vec::new()
                }
            }
            Command::SetIndicator { on } => vec![EngineEvent::IndicatorOverride { on }],
        }
    }

    /// Services the auto-close timer.
    pub fn tick(&mut self, now_ms: u64) -> Vec<EngineEvent> {
        let due = self.gate.auto_close_due(
            now_ms,
            self.config.auto_close_delay_ms,
            self.config.auto_close_policy,
            self.slots.any_occupied(),
        );

        if due && self.gate.close() {
            vec![EngineEvent::GateMoved {
                open: false,
                cause: GateCause::AutoClose,
            }]
        } else {
            Vec::new()
        }
    }

    pub fn reserved_slot(&self) -> Option<SlotId> {
        self.reservation.reserved_slot()
    }

    pub fn indicator_on(&self) -> bool {
        self.reservation.indicator_on()
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    pub fn gate_open(&self) -> bool {
        self.gate.is_open()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            occupancy: self.slots.occupancy(),
            reserved_slot: self.reservation.reserved_slot().map(SlotId::number),
            indicator_on: self.reservation.indicator_on(),
            alarm_active: self.alarm.is_active(),
            gate_open: self.gate.is_open(),
        }
    }
}
