pub mod alarm;
pub mod command;
pub mod config;
pub mod engine;
pub mod gate;
pub mod reservation;
pub mod slot;
pub mod topics;
pub mod types;
pub mod voucher;

pub use alarm::{AlarmEvent, BuzzerController};
pub use command::{decode, Command, DecodeError, GateAction};
pub use config::{ControlConfig, HardwareConfig, NetworkConfig, RuntimeConfig, SchedulerConfig};
pub use engine::{EngineEvent, EngineSnapshot, ParkingEngine};
pub use gate::{AutoClosePolicy, GateCause, GateController};
pub use reservation::{ReservationOutcome, ReservationTracker};
pub use slot::{SlotId, SlotMonitor, Transition, SLOT_COUNT};
pub use topics::*;
pub use types::BuzzerState;
pub use voucher::{KeyEvent, VoucherEntry};
