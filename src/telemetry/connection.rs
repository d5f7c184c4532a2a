use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use super::error::TelemetryError;
use super::snapshot::SharedSnapshot;
use super::source::{SimLink, SimSource};

/// Owns the single process-wide link to the live source.
pub struct ConnectionManager {
    source: Arc<dyn SimSource>,
    snapshot: SharedSnapshot,
    link: Mutex<Option<Arc<dyn SimLink>>>,
}

impl ConnectionManager {
    pub fn new(source: Arc<dyn SimSource>, snapshot: SharedSnapshot) -> Self {
        Self {
            source,
            snapshot,
            link: Mutex::new(None),
        }
    }

    /// Returns the existing link, or opens one.
    ///
    /// Failures are logged and reported as `None`; the caller decides whether to fall
    /// back to simulation.
    pub fn connect(&self) -> Option<Arc<dyn SimLink>> {
        let mut slot = self.slot();
        if let Some(link) = slot.as_ref() {
            return Some(link.clone());
        }

        match self.source.connect() {
            Ok(link) => {
                info!("Connected to live source '{}'", self.source.name());
                *slot = Some(link.clone());
                self.snapshot.set_connected(true);
                Some(link)
            }
            Err(TelemetryError::SourceUnavailable) => {
                info!("Live source connectivity not available");
                None
            }
            Err(e) => {
                warn!("Live source '{}': {}", self.source.name(), e);
                None
            }
        }
    }

    /// Drops the current link, if any. The next `connect` opens a new one.
    pub fn disconnect(&self) {
        if self.slot().take().is_some() {
            info!("Dropped link to live source '{}'", self.source.name());
        }
    }

    pub fn is_connected(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<dyn SimLink>>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::telemetry::source::testing::{ScriptedLink, ScriptedSource};
    use crate::telemetry::source::Unavailable;

    #[test]
    fn unavailable_source_yields_none() {
        let snapshot = SharedSnapshot::new();
        let manager = ConnectionManager::new(Arc::new(Unavailable), snapshot.clone());

        assert!(manager.connect().is_none());
        assert!(!manager.is_connected());
        assert!(!snapshot.read().connected);
    }

    #[test]
    fn connect_failure_is_not_raised() {
        let snapshot = SharedSnapshot::new();
        let manager =
            ConnectionManager::new(Arc::new(ScriptedSource::failing()), snapshot.clone());

        assert!(manager.connect().is_none());
        assert!(!snapshot.read().connected);
    }

    #[test]
    fn repeated_connect_reuses_the_link() {
        let source = Arc::new(ScriptedSource::new(ScriptedLink::default()));
        let snapshot = SharedSnapshot::new();
        let manager = ConnectionManager::new(source.clone(), snapshot.clone());

        let first = manager.connect().unwrap();
        let second = manager.connect().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.connects.load(Ordering::SeqCst), 1);
        assert!(snapshot.read().connected);
    }

    #[test]
    fn disconnect_allows_a_fresh_link() {
        let source = Arc::new(ScriptedSource::new(ScriptedLink::default()));
        let manager = ConnectionManager::new(source.clone(), SharedSnapshot::new());

        manager.connect().unwrap();
        manager.disconnect();
        assert!(!manager.is_connected());

        manager.connect().unwrap();
        assert_eq!(source.connects.load(Ordering::SeqCst), 2);
    }
}
