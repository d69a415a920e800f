use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Combined liveness of the network transport and the message-bus session,
/// tracked separately because one can be up while the other is down.
///
/// Written by the connectivity context and the backend client, read by every
/// publish path. Plain atomics; no lock is ever held across a network call.
#[derive(Debug, Default)]
pub struct LinkState {
    transport_up: AtomicBool,
    bus_session_up: AtomicBool,
    last_reconnect_attempt_ms: AtomicU64,
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport_up(&self) -> bool {
        self.transport_up.load(Ordering::Relaxed)
    }

    pub fn set_transport(&self, up: bool) {
        self.transport_up.store(up, Ordering::Relaxed);
    }

    pub fn bus_session_up(&self) -> bool {
        self.bus_session_up.load(Ordering::Relaxed)
    }

    pub fn set_bus_session(&self, up: bool) {
        self.bus_session_up.store(up, Ordering::Relaxed);
    }

    pub fn record_reconnect_attempt(&self, now_ms: u64) {
        self.last_reconnect_attempt_ms
            .store(now_ms, Ordering::Relaxed);
    }

    /// How long to wait before the next session attempt is allowed. Zero once
    /// the reconnect interval has elapsed since the last recorded attempt.
    pub fn reconnect_backoff_ms(&self, now_ms: u64, interval_ms: u64) -> u64 {
        let last = self.last_reconnect_attempt_ms.load(Ordering::Relaxed);
        interval_ms.saturating_sub(now_ms.saturating_sub(last))
    }
}
