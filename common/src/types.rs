use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzerState {
    On,
    Off,
    Paused,
}

impl BuzzerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Paused => "PAUSED",
        }
    }
}

pub fn occupancy_status(occupied: bool) -> &'static str {
    if occupied {
        "occupied"
    } else {
        "available"
    }
}

pub fn gate_state_str(open: bool) -> &'static str {
    if open {
        "open"
    } else {
        "closed"
    }
}

pub fn led_state_str(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotStatusPayload {
    #[serde(rename = "slotNumber")]
    pub slot_number: u8,
    pub status: &'static str,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GateStatePayload {
    pub state: &'static str,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedLogPayload {
    pub timestamp: i64,
    #[serde(rename = "ledState")]
    pub led_state: &'static str,
    #[serde(rename = "slotNumber")]
    pub slot_number: u8,
    pub reason: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuzzerLogPayload {
    pub timestamp: i64,
    #[serde(rename = "buzzerState")]
    pub buzzer_state: &'static str,
    #[serde(rename = "slotNumber")]
    pub slot_number: u8,
    pub reason: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateCommandPayload {
    #[serde(rename = "slotNumber")]
    pub slot_number: u8,
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorCommandPayload {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub on: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateRequest {
    pub code: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(rename = "slotNumber", default)]
    pub slot_number: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorUpdateRequest {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "slotNumber")]
    pub slot_number: u8,
    #[serde(rename = "sensorIndex")]
    pub sensor_index: u8,
    pub value: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServoCallbackRequest {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "servoState")]
    pub servo_state: &'static str,
}
