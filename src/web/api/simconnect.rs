use axum::{
    extract::{Path, State},
    Json,
};
use log::debug;

use crate::telemetry::{StartMode, TelemetrySnapshot};
use crate::web::state::AppState;

/// Runs the requested action, then returns the current snapshot.
///
/// `connect` opens the live link before answering; `track` starts the background
/// updater without waiting for it. Any other status is a plain read. Telemetry
/// failures never turn into an error response.
///
/// The updater picks live or demo mode once, when it starts. If it is already
/// flying the demo circle, a later successful `connect` sets `connected` to true
/// but positions keep coming from the demo circle until the updater is restarted.
#[utoipa::path(
    get,
    path = "/api/simconnect/{status}",
    params(
        ("status" = String, Path, description = "Action: connect, track, or anything else for a plain read")
    ),
    responses(
        (status = 200, description = "Current aircraft telemetry. `connected` reports the live link; positions stay synthetic while a demo-mode updater is running", body = TelemetrySnapshot)
    ),
    tag = "simconnect"
)]
pub async fn simconnect(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Json<TelemetrySnapshot> {
    match status.parse::<StartMode>() {
        Ok(mode) => state.telemetry.start(mode),
        Err(_) => debug!("No action for status '{}'", status),
    }

    Json(state.telemetry.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::telemetry::{TelemetryContext, UpdaterState};
    use std::time::Duration;
    use tokio::time::sleep;

    fn state() -> AppState {
        AppState::new(TelemetryContext::from_config(&Config::default()))
    }

    async fn get(state: &AppState, status: &str) -> TelemetrySnapshot {
        let Json(snapshot) = simconnect(State(state.clone()), Path(status.to_string())).await;
        snapshot
    }

    #[tokio::test(start_paused = true)]
    async fn connect_without_live_source_returns_zeros() {
        let state = state();
        let snapshot = get(&state, "connect").await;

        assert!(!snapshot.connected);
        assert_eq!(snapshot.latitude, 0.0);
        assert_eq!(snapshot.longitude, 0.0);
        assert_eq!(snapshot.altitude_m, 0.0);
        assert_eq!(snapshot.heading_deg, 0.0);
        assert_eq!(state.telemetry.updater_state(), UpdaterState::NotStarted);
    }

    #[tokio::test(start_paused = true)]
    async fn track_moves_the_aircraft_between_polls() {
        let state = state();
        get(&state, "track").await;

        sleep(Duration::from_millis(500)).await;
        let first = get(&state, "track").await;
        sleep(Duration::from_secs(2)).await;
        let second = get(&state, "track").await;

        assert_ne!(first.latitude, second.latitude);
        assert_ne!(first.longitude, second.longitude);
        assert_eq!(state.telemetry.loops_started(), 1);
        for v in [
            second.latitude,
            second.longitude,
            second.altitude_m,
            second.heading_deg,
        ] {
            assert!(v.is_finite());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_is_a_plain_read() {
        let state = state();
        let snapshot = get(&state, "status").await;

        sleep(Duration::from_secs(2)).await;
        assert_eq!(snapshot, state.telemetry.snapshot());
        assert_eq!(state.telemetry.updater_state(), UpdaterState::NotStarted);
    }
}
