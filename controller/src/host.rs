use std::{
    io::ErrorKind,
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use anyhow::Context;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, Mutex},
};
use tracing::{debug, info, warn};

use parking_common::types::{gate_state_str, led_state_str, occupancy_status, BuzzerState};
use parking_common::{
    decode, EngineEvent, KeyEvent, NetworkConfig, ParkingEngine, RuntimeConfig, SlotId,
    VoucherEntry, COMMAND_TOPICS, SLOT_COUNT,
};

use crate::backend::{BackendClient, VoucherOutcome};
use crate::hardware::{Buzzer, GateServo, IndicatorLed, SimHardware, SlotSensor};
use crate::link::LinkState;
use crate::publisher::EventPublisher;

const MAX_MQTT_PAYLOAD_BYTES: usize = 512;
const INBOUND_QUEUE_DEPTH: usize = 32;

#[derive(Clone)]
struct AppState {
    engine: Arc<Mutex<ParkingEngine>>,
    mqtt: AsyncClient,
    publisher: EventPublisher,
    backend: BackendClient,
    hardware: Arc<SimHardware>,
    link: Arc<LinkState>,
    config: Arc<RuntimeConfig>,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut runtime = load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config: {err:#}");
        RuntimeConfig::default()
    });
    apply_env_overrides(&mut runtime.network);
    runtime.sanitize();

    let hardware = Arc::new(SimHardware::new());
    hardware.set_position(runtime.hardware.gate_closed_angle);
    hardware.set_indicator(false);
    hardware.set_buzzer(false);

    // Occupancy is volatile; rebuild it from an initial sensor sweep.
    let mut engine = ParkingEngine::new(runtime.control.clone());
    for slot in SlotId::all() {
        engine.prime_slot(slot, hardware.read(slot));
    }

    let mut mqtt_options = MqttOptions::new(
        runtime.network.mqtt_client_id.clone(),
        runtime.network.mqtt_host.clone(),
        runtime.network.mqtt_port,
    );
    if !runtime.network.mqtt_user.is_empty() {
        mqtt_options.set_credentials(
            runtime.network.mqtt_user.clone(),
            runtime.network.mqtt_pass.clone(),
        );
    }
    let (mqtt, eventloop) = AsyncClient::new(mqtt_options, 64);

    let link = Arc::new(LinkState::new());
    let backend = BackendClient::new(&runtime.network, link.clone())
        .context("failed to initialize backend client")?;
    let publisher = EventPublisher::new(
        mqtt.clone(),
        backend.clone(),
        link.clone(),
        runtime.network.device_id.clone(),
    );

    let state = AppState {
        engine: Arc::new(Mutex::new(engine)),
        mqtt,
        publisher,
        backend,
        hardware,
        link,
        config: Arc::new(runtime),
    };

    if state.backend.probe().await {
        info!("backend reachable at {}", state.config.network.backend_base_url);
    } else {
        warn!("backend unreachable, telemetry degrades until the link recovers");
    }

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
    spawn_bus_loop(state.clone(), eventloop, inbound_tx);
    spawn_command_loop(state.clone(), inbound_rx);
    spawn_slot_scan_loop(state.clone());
    spawn_gate_loop(state.clone());
    spawn_health_loop(state.clone());
    spawn_console_loop(state.clone());

    info!("parking controller ready");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}

async fn load_runtime_config() -> anyhow::Result<RuntimeConfig> {
    let path = std::env::var("PARKING_CONFIG").unwrap_or_else(|_| "./parking.json".to_string());
    match tokio::fs::read(&path).await {
        Ok(raw) => {
            serde_json::from_slice(&raw).with_context(|| format!("invalid config file {path}"))
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err).with_context(|| format!("failed to read config file {path}")),
    }
}

fn apply_env_overrides(network: &mut NetworkConfig) {
    if let Ok(host) = std::env::var("MQTT_HOST") {
        network.mqtt_host = host;
    }
    if let Some(port) = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        network.mqtt_port = port;
    }
    if let Ok(user) = std::env::var("MQTT_USER") {
        network.mqtt_user = user;
    }
    if let Ok(pass) = std::env::var("MQTT_PASS") {
        network.mqtt_pass = pass;
    }
    if let Ok(url) = std::env::var("BACKEND_URL") {
        network.backend_base_url = url;
    }
    if let Ok(token) = std::env::var("DEVICE_TOKEN") {
        network.device_token = token;
    }
    if let Ok(device_id) = std::env::var("DEVICE_ID") {
        network.device_id = device_id;
    }
}

async fn subscribe_command_topics(mqtt: &AsyncClient) -> anyhow::Result<()> {
    for topic in COMMAND_TOPICS {
        mqtt.subscribe(topic, QoS::AtMostOnce).await?;
    }
    Ok(())
}

/// Connectivity context: owns the bus event loop. Inbound publishes are
/// queued for the command-input context instead of being handled on this
/// call stack, so a slow command can never stall session keep-alive.
fn spawn_bus_loop(
    state: AppState,
    mut eventloop: rumqttc::EventLoop,
    inbound: mpsc::Sender<(String, Vec<u8>)>,
) {
    tokio::spawn(async move {
        let reconnect_interval_ms = state.config.control.reconnect_interval_ms;
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("bus session established");
                    state.link.set_bus_session(true);
                    if let Err(err) = subscribe_command_topics(&state.mqtt).await {
                        warn!("command topic subscription failed: {err:#}");
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(message))) => {
                    if message.payload.len() > MAX_MQTT_PAYLOAD_BYTES {
                        warn!(
                            "dropping oversized payload on {} ({} bytes)",
                            message.topic,
                            message.payload.len()
                        );
                        continue;
                    }
                    if inbound
                        .try_send((message.topic.clone(), message.payload.to_vec()))
                        .is_err()
                    {
                        // Inbound commands are transient control signals;
                        // shedding under pressure beats unbounded queueing.
                        warn!("inbound queue full, dropping message on {}", message.topic);
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("bus poll error: {err}");
                    state.link.set_bus_session(false);

                    // The next poll re-dials the broker; waiting out the rest
                    // of the reconnect interval rate-limits the attempts. The
                    // attempt time is recorded whether or not the dial works.
                    let backoff =
                        state
                            .link
                            .reconnect_backoff_ms(monotonic_ms(), reconnect_interval_ms);
                    if backoff > 0 {
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                    state.link.record_reconnect_attempt(monotonic_ms());

                    if !state.link.transport_up() {
                        state.backend.probe().await;
                    }
                }
            }
        }
    });
}

/// Command-input context: drains the inbound queue, decodes, applies.
fn spawn_command_loop(state: AppState, mut inbound: mpsc::Receiver<(String, Vec<u8>)>) {
    tokio::spawn(async move {
        while let Some((topic, payload)) = inbound.recv().await {
            match decode(&topic, &payload) {
                Ok(Some(command)) => {
                    debug!("inbound command on {topic}: {command:?}");
                    let events = {
                        let mut engine = state.engine.lock().await;
                        engine.apply_command(command, monotonic_ms())
                    };
                    execute_events(&state, events).await;
                }
                Ok(None) => debug!("ignoring message on {topic}"),
                Err(err) => warn!("dropping inbound command on {topic}: {err}"),
            }
        }
    });
}

/// Slot-sensing context: fixed-cadence debounced sweep over all sensors.
fn spawn_slot_scan_loop(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(
            state.config.scheduler.slot_scan.poll_interval_ms,
        ));
        loop {
            interval.tick().await;
            let now_ms = monotonic_ms();

            let events = {
                let mut engine = state.engine.lock().await;
                let mut events = Vec::new();
                for slot in SlotId::all() {
                    events.extend(engine.poll_slot(slot, state.hardware.read(slot), now_ms));
                }
                events
            };

            if !events.is_empty() {
                execute_events(&state, events).await;
            }
        }
    });
}

/// Gate-service context: drives the auto-close timer.
fn spawn_gate_loop(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(
            state.config.scheduler.gate_service.poll_interval_ms,
        ));
        loop {
            interval.tick().await;

            let events = {
                let mut engine = state.engine.lock().await;
                engine.tick(monotonic_ms())
            };

            if !events.is_empty() {
                execute_events(&state, events).await;
            }
        }
    });
}

/// Low-priority health context.
fn spawn_health_loop(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(
            state.config.scheduler.health_monitor.poll_interval_ms,
        ));
        loop {
            interval.tick().await;

            let snapshot = {
                let engine = state.engine.lock().await;
                engine.snapshot()
            };
            debug!(
                "health: uptime={}s occupancy={:?} reserved={:?} alarm={} gate={} servo={}deg led={} buzzer={} transport={} bus={}",
                monotonic_ms() / 1_000,
                snapshot.occupancy,
                snapshot.reserved_slot,
                snapshot.alarm_active,
                gate_state_str(snapshot.gate_open),
                state.hardware.servo_angle(),
                state.hardware.indicator_is_on(),
                state.hardware.buzzer_is_on(),
                state.link.transport_up(),
                state.link.bus_session_up(),
            );
        }
    });
}

/// Keypad context. On the board this scans the matrix keypad; the host build
/// reads the console instead: voucher keys 0-9/A-D with `#` submit and `*`
/// clear, plus `occupy N` / `vacate N` to drive the simulated sensors.
fn spawn_console_loop(state: AppState) {
    tokio::spawn(async move {
        let mut entry = VoucherEntry::new(state.config.control.voucher_length);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        info!("console ready: voucher keys 0-9/A-D (# submit, * clear), 'occupy N', 'vacate N'");

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("console input closed");
                    return;
                }
                Err(err) => {
                    warn!("console read error: {err}");
                    return;
                }
            };
            let line = line.trim();

            if let Some(rest) = line.strip_prefix("occupy ") {
                set_sim_slot(&state, rest, true);
                continue;
            }
            if let Some(rest) = line.strip_prefix("vacate ") {
                set_sim_slot(&state, rest, false);
                continue;
            }

            for key in line.chars() {
                match entry.push_key(key) {
                    KeyEvent::Submit(code) => {
                        info!("validating voucher {code}");
                        handle_voucher(&state, &code).await;
                    }
                    KeyEvent::Rejected => warn!("voucher must be {} characters", state.config.control.voucher_length),
                    KeyEvent::Cleared => info!("voucher entry cleared"),
                    KeyEvent::Pending => {}
                }
            }
        }
    });
}

fn set_sim_slot(state: &AppState, arg: &str, occupied: bool) {
    match arg.trim().parse::<u8>().ok().and_then(SlotId::new) {
        Some(slot) => {
            state.hardware.set_slot_occupied(slot, occupied);
            info!("sim: slot {} {}", slot.number(), occupancy_status(occupied));
        }
        None => warn!("sim: slot number must be 1-{SLOT_COUNT}"),
    }
}

/// Voucher validation is the one synchronous backend call: the keypad context
/// blocks on it, and any failure resolves to a terminal error outcome here
/// rather than a retry.
async fn handle_voucher(state: &AppState, code: &str) {
    match state.backend.validate(code).await {
        VoucherOutcome::Valid { slot } => {
            info!("voucher valid, reserving slot {}", slot.number());
            let events = {
                let mut engine = state.engine.lock().await;
                engine.on_voucher_valid(slot, monotonic_ms())
            };
            execute_events(state, events).await;
            state.publisher.voucher_success(code).await;
        }
        VoucherOutcome::Invalid => {
            warn!("voucher rejected");
            state.publisher.voucher_error().await;
        }
        VoucherOutcome::Error => {
            warn!("voucher validation unavailable, enter the code again");
        }
    }
}

async fn execute_events(state: &AppState, events: Vec<EngineEvent>) {
    for event in events {
        apply_to_hardware(state, &event);
        state.publisher.publish(&event).await;
    }
}

fn apply_to_hardware(state: &AppState, event: &EngineEvent) {
    match event {
        EngineEvent::SlotChanged { slot, occupied } => {
            info!("slot {} {}", slot.number(), occupancy_status(*occupied));
        }
        EngineEvent::GateMoved { open, cause } => {
            let angle = if *open {
                state.config.hardware.gate_open_angle
            } else {
                state.config.hardware.gate_closed_angle
            };
            state.hardware.set_position(angle);
            info!("gate {} ({})", gate_state_str(*open), cause.as_str());
        }
        EngineEvent::IndicatorChanged { on, slot, reason } => {
            state.hardware.set_indicator(*on);
            info!(
                "indicator {} for slot {}: {reason}",
                led_state_str(*on),
                slot.number()
            );
        }
        EngineEvent::IndicatorOverride { on } => {
            state.hardware.set_indicator(*on);
            info!("indicator {} (remote override)", led_state_str(*on));
        }
        EngineEvent::BuzzerChanged {
            state: buzzer,
            slot,
            reason,
        } => {
            match buzzer {
                BuzzerState::On => state.hardware.set_buzzer(true),
                BuzzerState::Off => state.hardware.set_buzzer(false),
                // Paused is log-only; the actuator keeps sounding.
                BuzzerState::Paused => {}
            }
            info!("buzzer {} at slot {}: {reason}", buzzer.as_str(), slot.number());
        }
    }
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
