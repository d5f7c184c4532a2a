mod connection;
mod context;
mod error;
mod foreflight;
mod simulation;
mod snapshot;
mod source;
mod updater;

pub use context::TelemetryContext;
pub use simulation::CircularFlight;
pub use snapshot::TelemetrySnapshot;
pub use updater::{StartMode, UpdaterState};
