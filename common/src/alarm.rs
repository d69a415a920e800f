use crate::reservation::ReservationOutcome;
use crate::slot::SlotId;
use crate::types::BuzzerState;

/// A buzzer state change to act on and log.
///
/// `Paused` is log-only: the actuator stays energized while the offending
/// vehicle is gone but the reserved slot is still empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmEvent {
    pub state: BuzzerState,
    pub slot: SlotId,
    pub reason: String,
}

/// Wrong-slot alarm state machine.
///
/// Deliberately sticky: once raised, the alarm survives the offending slot
/// being vacated and only clears when the reserved slot is occupied. There is
/// no timeout-based auto-clear.
#[derive(Debug, Clone, Default)]
pub struct BuzzerController {
    active: bool,
    activated_at_ms: u64,
    paused_logged: bool,
}

impl BuzzerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activated_at_ms(&self) -> u64 {
        self.activated_at_ms
    }

    /// Whether a paused reason has been logged since the alarm was raised.
    pub fn paused_logged(&self) -> bool {
        self.paused_logged
    }

    pub fn apply(&mut self, outcome: &ReservationOutcome, now_ms: u64) -> Option<AlarmEvent> {
        match *outcome {
            ReservationOutcome::WrongSlotEntry { entered, reserved } => {
                if self.active {
                    // Already sounding; a second wrong slot does not re-drive
                    // the actuator or duplicate the ON log.
                    return None;
                }
                self.active = true;
                self.activated_at_ms = now_ms;
                self.paused_logged = false;
                Some(AlarmEvent {
                    state: BuzzerState::On,
                    slot: entered,
                    reason: format!(
                        "Wrong slot detected - vehicle should go to slot {}",
                        reserved.number()
                    ),
                })
            }
            ReservationOutcome::WrongSlotDeparture { departed, .. } => {
                if !self.active {
                    return None;
                }
                self.paused_logged = true;
                Some(AlarmEvent {
                    state: BuzzerState::Paused,
                    slot: departed,
                    reason: "Vehicle left wrong slot - waiting for correct slot".to_string(),
                })
            }
            ReservationOutcome::CorrectSlotArrival { slot } => {
                if !self.active {
                    return None;
                }
                self.active = false;
                self.paused_logged = false;
                Some(AlarmEvent {
                    state: BuzzerState::Off,
                    slot,
                    reason: "Correct slot detected - buzzer stopped".to_string(),
                })
            }
            ReservationOutcome::Ignored => None,
        }
    }
}
