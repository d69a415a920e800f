use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::debug;

use parking_common::{SlotId, SLOT_COUNT};

/// One occupancy sensor per slot. `read` returns the raw line level; the
/// sensors are active-low and the inversion happens in the slot monitor, not
/// here.
pub trait SlotSensor: Send + Sync {
    fn read(&self, slot: SlotId) -> bool;
}

/// Entrance gate servo.
pub trait GateServo: Send + Sync {
    fn set_position(&self, angle: u8);
}

/// Reserved-slot indicator LED.
pub trait IndicatorLed: Send + Sync {
    fn set_indicator(&self, on: bool);
}

/// Wrong-slot alarm buzzer.
pub trait Buzzer: Send + Sync {
    fn set_buzzer(&self, on: bool);
}

/// In-process stand-in for the board peripherals, driven from the console.
/// The board build wires these traits to GPIO and PWM drivers instead.
#[derive(Debug)]
pub struct SimHardware {
    // Raw line levels; high (true) means the beam is unbroken, slot empty.
    levels: [AtomicBool; SLOT_COUNT as usize],
    servo_angle: AtomicU8,
    indicator_on: AtomicBool,
    buzzer_on: AtomicBool,
}

impl Default for SimHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHardware {
    pub fn new() -> Self {
        Self {
            levels: std::array::from_fn(|_| AtomicBool::new(true)),
            servo_angle: AtomicU8::new(0),
            indicator_on: AtomicBool::new(false),
            buzzer_on: AtomicBool::new(false),
        }
    }

    pub fn set_slot_occupied(&self, slot: SlotId, occupied: bool) {
        self.levels[slot.index()].store(!occupied, Ordering::Relaxed);
    }

    pub fn servo_angle(&self) -> u8 {
        self.servo_angle.load(Ordering::Relaxed)
    }

    pub fn indicator_is_on(&self) -> bool {
        self.indicator_on.load(Ordering::Relaxed)
    }

    pub fn buzzer_is_on(&self) -> bool {
        self.buzzer_on.load(Ordering::Relaxed)
    }
}

impl SlotSensor for SimHardware {
    fn read(&self, slot: SlotId) -> bool {
        self.levels[slot.index()].load(Ordering::Relaxed)
    }
}

impl GateServo for SimHardware {
    fn set_position(&self, angle: u8) {
        self.servo_angle.store(angle, Ordering::Relaxed);
        debug!("sim servo -> {angle} deg");
    }
}

impl IndicatorLed for SimHardware {
    fn set_indicator(&self, on: bool) {
        self.indicator_on.store(on, Ordering::Relaxed);
        debug!("sim indicator led -> {on}");
    }
}

impl Buzzer for SimHardware {
    fn set_buzzer(&self, on: bool) {
        self.buzzer_on.store(on, Ordering::Relaxed);
        debug!("sim buzzer -> {on}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> SlotId {
        SlotId::new(n).unwrap()
    }

    #[test]
    fn slots_start_empty_with_high_lines() {
        let hardware = SimHardware::new();

        for slot in SlotId::all() {
            assert!(hardware.read(slot));
        }
    }

    #[test]
    fn occupying_a_slot_pulls_its_line_low() {
        let hardware = SimHardware::new();

        hardware.set_slot_occupied(slot(2), true);
        assert!(!hardware.read(slot(2)));
        assert!(hardware.read(slot(1)));

        hardware.set_slot_occupied(slot(2), false);
        assert!(hardware.read(slot(2)));
    }

    #[test]
    fn actuator_writes_are_observable() {
        let hardware = SimHardware::new();

        hardware.set_position(90);
        hardware.set_indicator(true);
        hardware.set_buzzer(true);

        assert_eq!(hardware.servo_angle(), 90);
        assert!(hardware.indicator_is_on());
        assert!(hardware.buzzer_is_on());
    }
}
