use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Latest aircraft state as served to HTTP clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TelemetrySnapshot {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "altitude")]
    pub altitude_m: f64,
    #[serde(rename = "heading")]
    pub heading_deg: f64,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

/// One tick's worth of position data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub heading_deg: f64,
}

/// Snapshot shared between the updater (single writer) and request handlers.
///
/// Every write replaces the whole field group under one lock, so readers always
/// see the fields of a single tick.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<TelemetrySnapshot>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> TelemetrySnapshot {
        *self.lock()
    }

    pub fn apply_live(&self, fix: Fix, at: DateTime<Utc>) {
        let mut locked = self.lock();
        locked.set_fix(fix);
        locked.connected = true;
        locked.last_update = Some(at);
    }

    /// `connected` is left as it was.
    pub fn apply_simulated(&self, fix: Fix) {
        self.lock().set_fix(fix);
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    fn lock(&self) -> MutexGuard<'_, TelemetrySnapshot> {
        // Plain data, still valid after a poisoning panic.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TelemetrySnapshot {
    fn set_fix(&mut self, fix: Fix) {
        self.latitude = fix.latitude;
        self.longitude = fix.longitude;
        self.altitude_m = fix.altitude_m;
        self.heading_deg = fix.heading_deg;
    }
}
