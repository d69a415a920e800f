/// Number of physical parking slots wired to the board.
pub const SLOT_COUNT: u8 = 4;

/// Identifier of one parking slot, always within `1..=SLOT_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u8);

impl SlotId {
    pub fn new(number: u8) -> Option<Self> {
        (1..=SLOT_COUNT).contains(&number).then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = SlotId> {
        (1..=SLOT_COUNT).map(SlotId)
    }
}

/// An accepted occupancy change for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub slot: SlotId,
    pub occupied: bool,
}

#[derive(Debug, Clone, Copy)]
struct SlotState {
    occupied: bool,
    last_transition_ms: u64,
}

/// Debounced occupancy reader for all slots.
///
/// Sensor lines are active-low; the inversion to "true means object present"
/// happens here and nowhere else. A raw change is only accepted once the
/// debounce window has elapsed since the previous accepted transition for
/// that slot, which suppresses sensor chatter while a vehicle crosses the
/// beam.
#[derive(Debug, Clone)]
pub struct SlotMonitor {
    debounce_window_ms: u64,
    slots: [SlotState; SLOT_COUNT as usize],
}

impl SlotMonitor {
    pub fn new(debounce_window_ms: u64) -> Self {
        Self {
            debounce_window_ms,
            slots: [SlotState {
                occupied: false,
                last_transition_ms: 0,
            }; SLOT_COUNT as usize],
        }
    }

    /// Seeds the stored occupancy from a boot-time reading without emitting a
    /// transition. Occupancy state is volatile and rebuilt this way after
    /// every restart.
    pub fn prime(&mut self, slot: SlotId, raw_level: bool) {
        self.slots[slot.index()].occupied = !raw_level;
    }

    /// Feeds one raw sensor reading. Returns the transition if the debounced
    /// state changed, `None` otherwise.
    pub fn poll(&mut self, slot: SlotId, raw_level: bool, now_ms: u64) -> Option<Transition> {
        let state = &mut self.slots[slot.index()];

        if now_ms.saturating_sub(state.last_transition_ms) < self.debounce_window_ms {
            return None;
        }

        let occupied = !raw_level;
        if occupied == state.occupied {
            return None;
        }

        state.occupied = occupied;
        state.last_transition_ms = now_ms;
        Some(Transition { slot, occupied })
    }

    pub fn is_occupied(&self, slot: SlotId) -> bool {
        self.slots[slot.index()].occupied
    }

    pub fn any_occupied(&self) -> bool {
        self.slots.iter().any(|state| state.occupied)
    }

    pub fn occupancy(&self) -> [bool; SLOT_COUNT as usize] {
        let mut out = [false; SLOT_COUNT as usize];
        for (dst, state) in out.iter_mut().zip(self.slots.iter()) {
            *dst = state.occupied;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> SlotId {
        SlotId::new(n).unwrap()
    }

    #[test]
    fn slot_id_rejects_out_of_range_numbers() {
        assert!(SlotId::new(0).is_none());
        assert!(SlotId::new(5).is_none());
        assert_eq!(SlotId::new(1).unwrap().index(), 0);
        assert_eq!(SlotId::new(4).unwrap().number(), 4);
    }

    #[test]
    fn active_low_reading_is_inverted() {
        let mut monitor = SlotMonitor::new(2_000);

        // Low line (false) means an object is present.
        let transition = monitor.poll(slot(1), false, 2_000).unwrap();
        assert!(transition.occupied);
        assert!(monitor.is_occupied(slot(1)));
    }

    #[test]
    fn transitions_respect_debounce_window() {
        let mut monitor = SlotMonitor::new(2_000);

        assert!(monitor.poll(slot(2), false, 2_000).is_some());
        // Chatter inside the window is swallowed even though the raw level flips.
        assert!(monitor.poll(slot(2), true, 2_500).is_none());
        assert!(monitor.poll(slot(2), false, 3_000).is_none());
        // Once the window elapses the next real change is accepted.
        assert!(monitor.poll(slot(2), true, 4_000).is_some());
        assert!(!monitor.is_occupied(slot(2)));
    }

    #[test]
    fn consecutive_transitions_are_never_closer_than_window() {
        let mut monitor = SlotMonitor::new(2_000);
        let mut accepted = Vec::new();
        let mut level = true;

        for now in (0..20_000).step_by(50) {
            // Raw line toggles every poll, far faster than the window allows.
            level = !level;
            if let Some(t) = monitor.poll(slot(3), level, now) {
                accepted.push((now, t.occupied));
            }
        }

        for pair in accepted.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= 2_000);
            assert_ne!(pair[0].1, pair[1].1);
        }
    }

    #[test]
    fn unchanged_reading_does_not_reset_the_window() {
        let mut monitor = SlotMonitor::new(2_000);

        assert!(monitor.poll(slot(1), false, 2_000).is_some());
        // Same state repeatedly: no transitions, no timestamp churn.
        assert!(monitor.poll(slot(1), false, 4_500).is_none());
        assert!(monitor.poll(slot(1), true, 4_600).is_some());
    }

    #[test]
    fn prime_sets_state_without_emitting() {
        let mut monitor = SlotMonitor::new(2_000);
        monitor.prime(slot(4), false);

        assert!(monitor.is_occupied(slot(4)));
        // The primed state is current, so the same reading emits nothing.
        assert!(monitor.poll(slot(4), false, 2_000).is_none());
    }

    #[test]
    fn slots_debounce_independently() {
        let mut monitor = SlotMonitor::new(2_000);

        assert!(monitor.poll(slot(1), false, 2_000).is_some());
        // Slot 2 is not held back by slot 1's fresh transition.
        assert!(monitor.poll(slot(2), false, 2_050).is_some());
        assert!(monitor.any_occupied());
    }
}
