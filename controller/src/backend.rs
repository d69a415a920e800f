use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, warn};

use parking_common::types::{
    occupancy_status, ServoCallbackRequest, SensorUpdateRequest, ValidateRequest, ValidateResponse,
};
use parking_common::{NetworkConfig, SlotId};

use crate::link::LinkState;

const DEVICE_TOKEN_HEADER: &str = "x-device-token";

/// Terminal result of one voucher validation attempt. A transport failure or
/// malformed response resolves to `Error`; the user re-enters the code, the
/// device never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherOutcome {
    Valid { slot: SlotId },
    Invalid,
    Error,
}

/// Synchronous-call client for the backend REST API. Every request is bounded
/// by the client timeout; there is no retry queue, a failed telemetry POST is
/// simply dropped.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    device_token: String,
    device_id: String,
    link: Arc<LinkState>,
}

impl BackendClient {
    pub fn new(network: &NetworkConfig, link: Arc<LinkState>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(network.http_timeout_ms))
            .build()
            .context("failed to build backend http client")?;

        Ok(Self {
            http,
            base_url: network.backend_base_url.clone(),
            device_token: network.device_token.clone(),
            device_id: network.device_id.clone(),
            link,
        })
    }

    /// Reachability probe used by the connectivity supervisor. Any response
    /// at all, error status included, proves the transport.
    pub async fn probe(&self) -> bool {
        let up = self.http.get(&self.base_url).send().await.is_ok();
        self.link.set_transport(up);
        up
    }

    pub async fn validate(&self, code: &str) -> VoucherOutcome {
        if !self.link.transport_up() {
            warn!("transport down, voucher validation resolves to error");
            return VoucherOutcome::Error;
        }

        let request = ValidateRequest {
            code: code.to_string(),
            device_id: self.device_id.clone(),
        };
        let response = match self.post_json("/iot/validate", &request).await {
            Ok(response) => response,
            Err(err) => {
                warn!("voucher validation failed: {err:#}");
                return VoucherOutcome::Error;
            }
        };

        match response.json::<ValidateResponse>().await {
            Ok(body) if body.valid => match body.slot_number.and_then(SlotId::new) {
                Some(slot) => VoucherOutcome::Valid { slot },
                None => {
                    warn!("voucher accepted but response slot number is unusable");
                    VoucherOutcome::Error
                }
            },
            Ok(_) => VoucherOutcome::Invalid,
            Err(err) => {
                warn!("malformed validation response: {err}");
                VoucherOutcome::Error
            }
        }
    }

    pub async fn sensor_update(&self, slot: SlotId, occupied: bool) {
        if !self.link.transport_up() {
            debug!("transport down, dropping sensor update for slot {}", slot.number());
            return;
        }

        let request = SensorUpdateRequest {
            device_id: self.device_id.clone(),
            slot_number: slot.number(),
            sensor_index: slot.number() - 1,
            value: occupancy_status(occupied),
        };
        if let Err(err) = self.post_json("/iot/sensor-update", &request).await {
            warn!("sensor update dropped: {err:#}");
        }
    }

    pub async fn servo_callback(&self, open: bool) {
        if !self.link.transport_up() {
            debug!("transport down, dropping servo callback");
            return;
        }

        let request = ServoCallbackRequest {
            device_id: self.device_id.clone(),
            servo_state: if open { "open" } else { "closed" },
        };
        if let Err(err) = self.post_json("/iot/servo-callback", &request).await {
            warn!("servo callback dropped: {err:#}");
        }
    }

    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> anyhow::Result<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let result = self
            .http
            .post(&url)
            .header(DEVICE_TOKEN_HEADER, &self.device_token)
            .json(body)
            .send()
            .await;

        let response = match result {
            Ok(response) => {
                self.link.set_transport(true);
                response
            }
            Err(err) => {
                if err.is_connect() || err.is_timeout() {
                    self.link.set_transport(false);
                }
                return Err(err).with_context(|| format!("backend POST {path} failed"));
            }
        };

        if !response.status().is_success() {
            anyhow::bail!("backend POST {path} returned {}", response.status());
        }
        Ok(response)
    }
}
