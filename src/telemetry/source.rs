use std::sync::Arc;

use strum_macros::{Display, EnumIter};

use super::error::{SourceError, TelemetryError};

/// Named simulator variables queried on every live tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SimVar {
    PlaneLatitude,
    PlaneLongitude,
    /// Feet above mean sea level.
    PlaneAltitude,
    MagneticCompass,
}

/// An open link to a running simulator.
///
/// `get` returns `Ok(None)` when the simulator has no value for the variable yet;
/// an `Err` means the link itself is broken.
pub trait SimLink: Send + Sync {
    fn get(&self, var: SimVar) -> Result<Option<f64>, SourceError>;

    /// Reads `vars` from one view of the simulator state, in order.
    ///
    /// Links that receive updates asynchronously must override this so that all
    /// values come from the same state.
    fn get_many(&self, vars: &[SimVar]) -> Result<Vec<Option<f64>>, TelemetryError> {
        vars.iter()
            .map(|&var| {
                self.get(var)
                    .map_err(|source| TelemetryError::ReadFailure { var, source })
            })
            .collect()
    }
}

/// Driver capable of opening a [`SimLink`].
pub trait SimSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn connect(&self) -> Result<Arc<dyn SimLink>, TelemetryError>;
}

/// Stand-in used when no simulator driver is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unavailable;

impl SimSource for Unavailable {
    fn name(&self) -> &'static str {
        "none"
    }

    fn connect(&self) -> Result<Arc<dyn SimLink>, TelemetryError> {
        Err(TelemetryError::SourceUnavailable)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Link returning canned values. Every call to `advance` bumps all values by one,
    /// so readers can tell ticks apart.
    #[derive(Default)]
    pub struct ScriptedLink {
        pub values: Mutex<HashMap<SimVar, Option<f64>>>,
        pub fail_after: Option<usize>,
        pub reads: AtomicUsize,
    }

    impl ScriptedLink {
        pub fn with_values(values: &[(SimVar, Option<f64>)]) -> Self {
            Self {
                values: Mutex::new(values.iter().copied().collect()),
                ..Default::default()
            }
        }
    }

    impl SimLink for ScriptedLink {
        fn get(&self, var: SimVar) -> Result<Option<f64>, SourceError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(SourceError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "simulator closed",
                )));
            }
            Ok(self.values.lock().unwrap().get(&var).copied().flatten())
        }
    }

    /// Link whose every variable reads as the number of completed ticks.
    #[derive(Default)]
    pub struct CountingLink {
        reads: AtomicUsize,
    }

    impl SimLink for CountingLink {
        fn get(&self, _var: SimVar) -> Result<Option<f64>, SourceError> {
            // Four variables per tick.
            let n = self.reads.fetch_add(1, Ordering::SeqCst) / 4;
            Ok(Some(n as f64))
        }
    }

    /// Link whose single reads change on every call while batched reads are
    /// consistent.
    #[derive(Default)]
    pub struct TearingLink {
        reads: AtomicUsize,
    }

    impl SimLink for TearingLink {
        fn get(&self, _var: SimVar) -> Result<Option<f64>, SourceError> {
            Ok(Some(self.reads.fetch_add(1, Ordering::SeqCst) as f64))
        }

        fn get_many(&self, vars: &[SimVar]) -> Result<Vec<Option<f64>>, TelemetryError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst) as f64;
            Ok(vec![Some(n); vars.len()])
        }
    }

    pub struct ScriptedSource {
        link: Option<Arc<dyn SimLink>>,
        pub connects: AtomicUsize,
        pub refuse: AtomicBool,
    }

    impl ScriptedSource {
        pub fn new(link: impl SimLink + 'static) -> Self {
            Self {
                link: Some(Arc::new(link)),
                connects: AtomicUsize::new(0),
                refuse: AtomicBool::new(false),
            }
        }

        pub fn failing() -> Self {
            Self {
                link: None,
                connects: AtomicUsize::new(0),
                refuse: AtomicBool::new(false),
            }
        }
    }

    impl SimSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn connect(&self) -> Result<Arc<dyn SimLink>, TelemetryError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let link = if self.refuse.load(Ordering::SeqCst) {
                None
            } else {
                self.link.clone()
            };
            link.ok_or_else(|| {
                TelemetryError::ConnectFailure(SourceError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            })
        }
    }
}
