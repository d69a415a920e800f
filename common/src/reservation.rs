use crate::slot::{SlotId, Transition};

/// What a slot transition means for the active reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// No reservation, or the transition does not concern it.
    Ignored,
    /// The reserved slot became occupied; the reservation is now cleared.
    CorrectSlotArrival { slot: SlotId },
    /// A slot other than the reserved one became occupied.
    WrongSlotEntry { entered: SlotId, reserved: SlotId },
    /// A wrong slot was vacated while the alarm is sounding. The alarm stays
    /// on; only correct-slot arrival resolves it.
    WrongSlotDeparture { departed: SlotId, reserved: SlotId },
}

/// Lifecycle of the single active reservation and its indicator.
///
/// Last validated voucher wins: a new activation overwrites any reservation
/// still pending. The indicator mirrors the reservation at all times.
#[derive(Debug, Clone, Default)]
pub struct ReservationTracker {
    reserved: Option<SlotId>,
    activated_at_ms: u64,
    indicator_on: bool,
}

impl ReservationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserved_slot(&self) -> Option<SlotId> {
        self.reserved
    }

    pub fn indicator_on(&self) -> bool {
        self.indicator_on
    }

    pub fn activated_at_ms(&self) -> u64 {
        self.activated_at_ms
    }

    /// Activates a reservation for `slot`, replacing any prior one.
    pub fn activate(&mut self, slot: SlotId, now_ms: u64) {
        self.reserved = Some(slot);
        self.activated_at_ms = now_ms;
        self.indicator_on = true;
    }

    pub fn on_transition(&mut self, t: Transition, alarm_active: bool) -> ReservationOutcome {
        let Some(reserved) = self.reserved else {
            return ReservationOutcome::Ignored;
        };

        if t.occupied {
            if t.slot == reserved {
                self.reserved = None;
                self.indicator_on = false;
                ReservationOutcome::CorrectSlotArrival { slot: reserved }
            } else {
                ReservationOutcome::WrongSlotEntry {
                    entered: t.slot,
                    reserved,
                }
            }
        } else if t.slot != reserved && alarm_active {
            ReservationOutcome::WrongSlotDeparture {
                departed: t.slot,
                reserved,
            }
        } else {
            ReservationOutcome::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> SlotId {
        SlotId::new(n).unwrap()
    }

    fn occupied(n: u8) -> Transition {
        Transition {
            slot: slot(n),
            occupied: true,
        }
    }

    fn vacated(n: u8) -> Transition {
        Transition {
            slot: slot(n),
            occupied: false,
        }
    }

    #[test]
    fn indicator_always_mirrors_reservation() {
        let mut tracker = ReservationTracker::new();
        assert_eq!(tracker.indicator_on(), tracker.reserved_slot().is_some());

        tracker.activate(slot(2), 1_000);
        assert_eq!(tracker.indicator_on(), tracker.reserved_slot().is_some());

        tracker.on_transition(occupied(2), false);
        assert_eq!(tracker.indicator_on(), tracker.reserved_slot().is_some());
        assert!(!tracker.indicator_on());
    }

    #[test]
    fn transitions_without_reservation_are_ignored() {
        let mut tracker = ReservationTracker::new();

        assert_eq!(
            tracker.on_transition(occupied(1), false),
            ReservationOutcome::Ignored
        );
        assert_eq!(
            tracker.on_transition(vacated(1), false),
            ReservationOutcome::Ignored
        );
    }

    #[test]
    fn correct_slot_arrival_clears_reservation() {
        let mut tracker = ReservationTracker::new();
        tracker.activate(slot(2), 500);

        let outcome = tracker.on_transition(occupied(2), false);

        assert_eq!(
            outcome,
            ReservationOutcome::CorrectSlotArrival { slot: slot(2) }
        );
        assert!(tracker.reserved_slot().is_none());
    }

    #[test]
    fn wrong_slot_entry_keeps_reservation() {
        let mut tracker = ReservationTracker::new();
        tracker.activate(slot(2), 500);

        let outcome = tracker.on_transition(occupied(3), false);

        assert_eq!(
            outcome,
            ReservationOutcome::WrongSlotEntry {
                entered: slot(3),
                reserved: slot(2),
            }
        );
        assert_eq!(tracker.reserved_slot(), Some(slot(2)));
        assert!(tracker.indicator_on());
    }

    #[test]
    fn wrong_slot_departure_only_reported_while_alarm_sounds() {
        let mut tracker = ReservationTracker::new();
        tracker.activate(slot(2), 500);

        assert_eq!(
            tracker.on_transition(vacated(3), false),
            ReservationOutcome::Ignored
        );
        assert_eq!(
            tracker.on_transition(vacated(3), true),
            ReservationOutcome::WrongSlotDeparture {
                departed: slot(3),
                reserved: slot(2),
            }
        );
    }

    #[test]
    fn last_validated_voucher_wins() {
        let mut tracker = ReservationTracker::new();
        tracker.activate(slot(1), 100);
        tracker.activate(slot(4), 200);

        assert_eq!(tracker.reserved_slot(), Some(slot(4)));
        assert_eq!(tracker.activated_at_ms(), 200);

        // Arrival at the superseded slot is now a wrong-slot entry.
        assert_eq!(
            tracker.on_transition(occupied(1), false),
            ReservationOutcome::WrongSlotEntry {
                entered: slot(1),
                reserved: slot(4),
            }
        );
    }

    #[test]
    fn reserved_slot_vacating_is_ignored() {
        let mut tracker = ReservationTracker::new();
        tracker.activate(slot(2), 500);

        assert_eq!(
            tracker.on_transition(vacated(2), true),
            ReservationOutcome::Ignored
        );
        assert_eq!(tracker.reserved_slot(), Some(slot(2)));
    }
}
