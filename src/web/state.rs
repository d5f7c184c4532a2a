use std::sync::Arc;

use crate::telemetry::TelemetryContext;

#[derive(Clone)]
pub struct AppState {
    pub telemetry: Arc<TelemetryContext>,
}

impl AppState {
    pub fn new(telemetry: TelemetryContext) -> Self {
        Self {
            telemetry: Arc::new(telemetry),
        }
    }
}
