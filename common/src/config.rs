use serde::{Deserialize, Serialize};

use crate::gate::AutoClosePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    pub debounce_window_ms: u64,
    pub auto_close_delay_ms: u64,
    pub auto_close_policy: AutoClosePolicy,
    pub close_on_slot_exit: bool,
    pub reconnect_interval_ms: u64,
    pub voucher_length: usize,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: 2_000,
            auto_close_delay_ms: 5_000,
            auto_close_policy: AutoClosePolicy::Timeout,
            close_on_slot_exit: true,
            reconnect_interval_ms: 5_000,
            voucher_length: 6,
        }
    }
}

impl ControlConfig {
    pub fn sanitize(&mut self) {
        self.debounce_window_ms = self.debounce_window_ms.clamp(100, 60_000);
        self.auto_close_delay_ms = self.auto_close_delay_ms.clamp(500, 600_000);
        self.reconnect_interval_ms = self.reconnect_interval_ms.clamp(1_000, 300_000);
        self.voucher_length = self.voucher_length.clamp(4, 12);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
    pub mqtt_client_id: String,
    pub backend_base_url: String,
    pub device_token: String,
    pub device_id: String,
    pub http_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "127.0.0.1".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
            mqtt_client_id: "parking-controller".to_string(),
            backend_base_url: "http://127.0.0.1:3000/api/v1".to_string(),
            device_token: String::new(),
            device_id: "esp32-main".to_string(),
            http_timeout_ms: 5_000,
        }
    }
}

impl NetworkConfig {
    pub fn sanitize(&mut self) {
        if self.mqtt_client_id.trim().is_empty() {
            self.mqtt_client_id = "parking-controller".to_string();
        }
        if self.device_id.trim().is_empty() {
            self.device_id = "esp32-main".to_string();
        }
        while self.backend_base_url.ends_with('/') {
            self.backend_base_url.pop();
        }
        self.http_timeout_ms = self.http_timeout_ms.clamp(500, 30_000);
    }
}

/// Pin assignments and servo endpoints for the deployed board. The host build
/// never touches these; they ride along so one config file serves both targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardwareConfig {
    pub sensor_pins: [u8; 4],
    pub servo_pin: u8,
    pub indicator_led_pin: u8,
    pub buzzer_pin: u8,
    pub gate_open_angle: u8,
    pub gate_closed_angle: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            sensor_pins: [18, 19, 21, 22],
            servo_pin: 26,
            indicator_led_pin: 2,
            buzzer_pin: 23,
            gate_open_angle: 0,
            gate_closed_angle: 90,
        }
    }
}

impl HardwareConfig {
    pub fn sanitize(&mut self) {
        if self.gate_open_angle > 180 {
            self.gate_open_angle = 0;
        }
        if self.gate_closed_angle > 180 {
            self.gate_closed_angle = 90;
        }
    }
}

/// One execution context: how often it runs and where it sits in the task
/// table. Priority and core affinity are honored on the RTOS target; the host
/// runtime only consumes the interval but keeps the table as documentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskConfig {
    pub poll_interval_ms: u64,
    pub priority: u8,
    pub core: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub connectivity: TaskConfig,
    pub command_input: TaskConfig,
    pub slot_scan: TaskConfig,
    pub gate_service: TaskConfig,
    pub health_monitor: TaskConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            connectivity: TaskConfig {
                poll_interval_ms: 10,
                priority: 3,
                core: 0,
            },
            command_input: TaskConfig {
                poll_interval_ms: 20,
                priority: 2,
                core: 1,
            },
            slot_scan: TaskConfig {
                poll_interval_ms: 50,
                priority: 2,
                core: 1,
            },
            gate_service: TaskConfig {
                poll_interval_ms: 50,
                priority: 1,
                core: 1,
            },
            health_monitor: TaskConfig {
                poll_interval_ms: 5_000,
                priority: 1,
                core: 0,
            },
        }
    }
}

impl SchedulerConfig {
    pub fn sanitize(&mut self) {
        for task in [
            &mut self.connectivity,
            &mut self.command_input,
            &mut self.slot_scan,
            &mut self.gate_service,
            &mut self.health_monitor,
        ] {
            task.poll_interval_ms = task.poll_interval_ms.clamp(5, 60_000);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.control.sanitize();
        self.network.sanitize();
        self.hardware.sanitize();
        self.scheduler.sanitize();
    }
}
