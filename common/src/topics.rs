use crate::slot::SlotId;

pub const TOPIC_GATE_STATE: &str = "parking/gate/state";
pub const TOPIC_LED_LOG: &str = "parking/led/log";
pub const TOPIC_BUZZER_LOG: &str = "parking/buzzer/log";
pub const TOPIC_VOUCHER_SUCCESS: &str = "parking/voucher/success";
pub const TOPIC_VOUCHER_ERROR: &str = "parking/voucher/error";

pub const TOPIC_CMD_GATE_OPEN: &str = "parking/gate/open";
pub const TOPIC_CMD_GATE_CLOSE: &str = "parking/gate/close";
pub const TOPIC_CMD_INDICATOR: &str = "parking/indicator/wrong-slot";

pub const COMMAND_TOPICS: [&str; 3] = [
    TOPIC_CMD_GATE_OPEN,
    TOPIC_CMD_GATE_CLOSE,
    TOPIC_CMD_INDICATOR,
];

pub fn slot_status_topic(slot: SlotId) -> String {
    format!("parking/slot/{}/status", slot.number())
}
