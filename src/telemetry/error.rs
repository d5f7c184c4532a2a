use std::time::Duration;

use thiserror::Error;

use super::source::SimVar;

/// Failure raised by a live-source driver.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no telemetry received for {0:?}")]
    Stale(Duration),
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("live source not available")]
    SourceUnavailable,
    #[error("failed to connect to live source: {0}")]
    ConnectFailure(#[source] SourceError),
    #[error("failed to read {var}: {source}")]
    ReadFailure {
        var: SimVar,
        #[source]
        source: SourceError,
    },
}
