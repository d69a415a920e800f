use std::sync::Arc;

use chrono::Utc;
use rumqttc::{AsyncClient, QoS};
use serde::Serialize;
use tracing::{debug, warn};

use parking_common::types::{
    gate_state_str, led_state_str, occupancy_status, BuzzerLogPayload, GateStatePayload,
    LedLogPayload, SlotStatusPayload,
};
use parking_common::{
    slot_status_topic, EngineEvent, TOPIC_BUZZER_LOG, TOPIC_GATE_STATE, TOPIC_LED_LOG,
    TOPIC_VOUCHER_ERROR, TOPIC_VOUCHER_SUCCESS,
};

use crate::backend::BackendClient;
use crate::link::LinkState;

/// Best-effort fan-out of engine events to the bus and the backend.
///
/// Every publish checks link liveness first and drops the event when the
/// relevant leg is down. Nothing is queued or replayed; losing telemetry is
/// acceptable, stalling the actuator-control path is not.
#[derive(Clone)]
pub struct EventPublisher {
    mqtt: AsyncClient,
    backend: BackendClient,
    link: Arc<LinkState>,
    device_id: String,
}

impl EventPublisher {
    pub fn new(
        mqtt: AsyncClient,
        backend: BackendClient,
        link: Arc<LinkState>,
        device_id: String,
    ) -> Self {
        Self {
            mqtt,
            backend,
            link,
            device_id,
        }
    }

    pub async fn publish(&self, event: &EngineEvent) {
        let timestamp = Utc::now().timestamp();

        match event {
            EngineEvent::SlotChanged { slot, occupied } => {
                let payload = SlotStatusPayload {
                    slot_number: slot.number(),
                    status: occupancy_status(*occupied),
                    device_id: self.device_id.clone(),
                };
                self.publish_json(&slot_status_topic(*slot), &payload).await;
                self.backend.sensor_update(*slot, *occupied).await;
            }
            EngineEvent::GateMoved { open, .. } => {
                let payload = GateStatePayload {
                    state: gate_state_str(*open),
                    device_id: self.device_id.clone(),
                };
                self.publish_json(TOPIC_GATE_STATE, &payload).await;
                self.backend.servo_callback(*open).await;
            }
            EngineEvent::IndicatorChanged { on, slot, reason } => {
                let payload = LedLogPayload {
                    timestamp,
                    led_state: led_state_str(*on),
                    slot_number: slot.number(),
                    reason: (*reason).to_string(),
                    device_id: self.device_id.clone(),
                };
                self.publish_json(TOPIC_LED_LOG, &payload).await;
            }
            EngineEvent::BuzzerChanged {
                state,
                slot,
                reason,
            } => {
                let payload = BuzzerLogPayload {
                    timestamp,
                    buzzer_state: state.as_str(),
                    slot_number: slot.number(),
                    reason: reason.clone(),
                    device_id: self.device_id.clone(),
                };
                self.publish_json(TOPIC_BUZZER_LOG, &payload).await;
            }
            // Remote overrides drive the LED only; there is nothing to report
            // back to the side that just commanded it.
            EngineEvent::IndicatorOverride { .. } => {}
        }
    }

    pub async fn voucher_success(&self, code: &str) {
        self.publish_raw(TOPIC_VOUCHER_SUCCESS, code.as_bytes().to_vec())
            .await;
    }

    pub async fn voucher_error(&self) {
        self.publish_raw(TOPIC_VOUCHER_ERROR, b"invalid".to_vec())
            .await;
    }

    async fn publish_json<T: Serialize>(&self, topic: &str, payload: &T) {
        match serde_json::to_vec(payload) {
            Ok(body) => self.publish_raw(topic, body).await,
            Err(err) => warn!("payload serialization failed for {topic}: {err}"),
        }
    }

    async fn publish_raw(&self, topic: &str, body: Vec<u8>) {
        if !self.link.bus_session_up() {
            debug!("bus session down, dropping publish to {topic}");
            return;
        }
        if let Err(err) = self.mqtt.publish(topic, QoS::AtMostOnce, false, body).await {
            warn!("publish to {topic} failed: {err}");
        }
    }
}
