use log::{debug, info};
use std::sync::Arc;

use crate::config::{Config, SourceConfig};

use super::connection::ConnectionManager;
use super::foreflight::ForeFlightSource;
use super::snapshot::{SharedSnapshot, TelemetrySnapshot};
use super::source::{SimSource, Unavailable};
use super::updater::{StartMode, Updater, UpdaterSettings, UpdaterState};

/// Process-wide telemetry state: the snapshot, the live-source link and the
/// background updater. Built once at startup and shared with request handlers.
pub struct TelemetryContext {
    snapshot: SharedSnapshot,
    connection: Arc<ConnectionManager>,
    updater: Updater,
}

impl TelemetryContext {
    pub fn new(source: Arc<dyn SimSource>, settings: UpdaterSettings) -> Self {
        let snapshot = SharedSnapshot::new();
        let connection = Arc::new(ConnectionManager::new(source, snapshot.clone()));
        let updater = Updater::new(snapshot.clone(), connection.clone(), settings);
        Self {
            snapshot,
            connection,
            updater,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let source: Arc<dyn SimSource> = match config.telemetry.source {
            SourceConfig::None => Arc::new(Unavailable),
            SourceConfig::ForeFlight { port, stale_after } => {
                info!("Live source: ForeFlight UDP on port {}", port);
                Arc::new(ForeFlightSource::new(port, stale_after))
            }
        };
        Self::new(source, UpdaterSettings::from(config))
    }

    pub fn start(&self, mode: StartMode) {
        self.updater.start(mode);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.read()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn updater_state(&self) -> UpdaterState {
        self.updater.state()
    }

    pub fn loops_started(&self) -> u64 {
        self.updater.loops_started()
    }

    pub async fn shutdown(&self) {
        if self.updater_state() == UpdaterState::Running {
            info!("Stopping telemetry updater");
        }
        self.updater.stop().await;
        if self.is_connected() {
            self.connection.disconnect();
        }
        debug!("{} update loop(s) ran", self.loops_started());
    }
}

impl From<&Config> for UpdaterSettings {
    fn from(config: &Config) -> Self {
        UpdaterSettings {
            tick: config.telemetry.tick,
            on_read_error: config.telemetry.on_read_error,
            simulation: config.simulation.clone(),
        }
    }
}
