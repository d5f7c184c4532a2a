use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;
use strum_macros::{Display, EnumString};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::{ReadErrorPolicy, SimulationConfig};

use super::connection::ConnectionManager;
use super::error::TelemetryError;
use super::simulation::CircularFlight;
use super::snapshot::{Fix, SharedSnapshot};
use super::source::{SimLink, SimVar};

const FEET_TO_METERS: f64 = 0.3048;

const FIX_VARS: [SimVar; 4] = [
    SimVar::PlaneLatitude,
    SimVar::PlaneLongitude,
    SimVar::PlaneAltitude,
    SimVar::MagneticCompass,
];

/// Action requested through `/api/simconnect/{status}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StartMode {
    Connect,
    Track,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    NotStarted,
    Running,
}

#[derive(Debug, Clone)]
pub struct UpdaterSettings {
    pub tick: Duration,
    pub on_read_error: ReadErrorPolicy,
    pub simulation: SimulationConfig,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            on_read_error: ReadErrorPolicy::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    fn is_running(&self) -> bool {
        !self.join.is_finished()
    }
}

/// Background task refreshing the shared snapshot once per tick.
pub struct Updater {
    snapshot: SharedSnapshot,
    connection: Arc<ConnectionManager>,
    settings: UpdaterSettings,
    worker: StdMutex<Option<WorkerHandle>>,
    loops_started: Arc<AtomicU64>,
}

impl Updater {
    pub fn new(
        snapshot: SharedSnapshot,
        connection: Arc<ConnectionManager>,
        settings: UpdaterSettings,
    ) -> Self {
        Self {
            snapshot,
            connection,
            settings,
            worker: StdMutex::new(None),
            loops_started: Arc::new(AtomicU64::new(0)),
        }
    }

    /// `Connect` opens the live link synchronously. `Track` spawns the update loop
    /// unless one is already running; it never waits for the loop.
    pub fn start(&self, mode: StartMode) {
        match mode {
            StartMode::Connect => {
                self.connection.connect();
            }
            StartMode::Track => {
                self.spawn_if_idle();
            }
        }
    }

    /// Returns `true` if a new loop was spawned.
    fn spawn_if_idle(&self) -> bool {
        let mut worker = self.worker_slot();
        if worker.as_ref().is_some_and(WorkerHandle::is_running) {
            return false;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let ctx = LoopContext {
            snapshot: self.snapshot.clone(),
            connection: self.connection.clone(),
            settings: self.settings.clone(),
            loops_started: self.loops_started.clone(),
        };
        let join = tokio::spawn(run_update_loop(ctx, stop_rx));

        *worker = Some(WorkerHandle { stop_tx, join });
        true
    }

    pub fn state(&self) -> UpdaterState {
        match self.worker_slot().as_ref() {
            Some(w) if w.is_running() => UpdaterState::Running,
            _ => UpdaterState::NotStarted,
        }
    }

    /// Number of update loops entered since construction.
    pub fn loops_started(&self) -> u64 {
        self.loops_started.load(Ordering::SeqCst)
    }

    /// Asks the loop to finish at its next tick boundary and waits for it.
    pub async fn stop(&self) {
        let worker = self.worker_slot().take();
        if let Some(worker) = worker {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<WorkerHandle>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct LoopContext {
    snapshot: SharedSnapshot,
    connection: Arc<ConnectionManager>,
    settings: UpdaterSettings,
    loops_started: Arc<AtomicU64>,
}

async fn run_update_loop(ctx: LoopContext, mut stop_rx: oneshot::Receiver<()>) {
    ctx.loops_started.fetch_add(1, Ordering::SeqCst);

    // The mode is chosen once; a failed connect is not retried by this loop.
    let mut link = ctx.connection.connect();
    if link.is_some() {
        info!("Starting live telemetry feed");
    } else {
        info!("Starting circular flight demo mode");
    }

    let mut flight = CircularFlight::new(ctx.settings.simulation.clone());
    let mut ticker = interval(ctx.settings.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let stopped = tokio::select! {
            _ = ticker.tick() => false,
            _ = &mut stop_rx => true,
        };
        if stopped {
            info!("Telemetry updater stopped");
            return;
        }

        let live = link.as_ref().map(|l| read_fix(l.as_ref()));
        match live {
            Some(Ok(fix)) => {
                debug!(
                    "live fix lat={:.5} lon={:.5} alt={:.0}m hdg={:.0}",
                    fix.latitude, fix.longitude, fix.altitude_m, fix.heading_deg
                );
                ctx.snapshot.apply_live(fix, Utc::now());
            }
            Some(Err(e)) => {
                error!("Error reading aircraft data: {}", e);
                ctx.snapshot.set_connected(false);
                ctx.connection.disconnect();
                link = None;

                match ctx.settings.on_read_error {
                    ReadErrorPolicy::Stop => {
                        warn!("Telemetry updates halted after read failure");
                        return;
                    }
                    ReadErrorPolicy::Fallback => {
                        info!("Falling back to circular flight demo mode");
                    }
                }
            }
            None => {
                let fix = flight.advance();
                debug!("simulated fix t={:.2} hdg={:.1}", flight.t(), fix.heading_deg);
                ctx.snapshot.apply_simulated(fix);
            }
        }
    }
}

/// Queries one tick's worth of variables in a single batch, so every field comes
/// from the same simulator state. Missing or non-finite values read as 0.0.
fn read_fix(link: &dyn SimLink) -> Result<Fix, TelemetryError> {
    let values = link.get_many(&FIX_VARS)?;
    let value = |i: usize| {
        values
            .get(i)
            .copied()
            .flatten()
            .filter(|x| x.is_finite())
            .unwrap_or(0.0)
    };

    Ok(Fix {
        latitude: value(0),
        longitude: value(1),
        altitude_m: value(2) * FEET_TO_METERS,
        heading_deg: value(3),
    })
}
