use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub web: WebConfig,
    pub telemetry: TelemetryConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_tick", deserialize_with = "duration")]
    pub tick: Duration,
    #[serde(default)]
    pub on_read_error: ReadErrorPolicy,
    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tick: default_tick(),
            on_read_error: ReadErrorPolicy::default(),
            source: SourceConfig::default(),
        }
    }
}

fn default_tick() -> Duration {
    Duration::from_secs(1)
}

/// What the updater does after a live read fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorPolicy {
    /// Keep ticking on the circular flight generator.
    #[default]
    Fallback,
    /// End the loop; the next `track` request starts a new one.
    Stop,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    #[default]
    None,
    #[serde(rename = "foreflight")]
    ForeFlight {
        #[serde(default = "default_foreflight_port")]
        port: u16,
        #[serde(default = "default_stale_after", deserialize_with = "duration")]
        stale_after: Duration,
    },
}

impl SourceConfig {
    pub fn foreflight(port: u16) -> Self {
        SourceConfig::ForeFlight {
            port,
            stale_after: default_stale_after(),
        }
    }
}

fn default_foreflight_port() -> u16 {
    49002
}

fn default_stale_after() -> Duration {
    Duration::from_secs(5)
}

/// Parameters of the demo circular flight.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_deg: f64,
    pub step_rad: f64,
    pub altitude_m: f64,
}

impl Default for SimulationConfig {
    // Orbit over SFO.
    fn default() -> Self {
        Self {
            center_lat: 37.6188,
            center_lon: -122.3754,
            radius_deg: 0.01,
            step_rad: 0.05,
            altitude_m: 100.0,
        }
    }
}

fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.tick.is_zero() {
            return Err(ConfigError::Invalid("telemetry.tick must be non-zero".into()));
        }
        if let SourceConfig::ForeFlight { stale_after, .. } = self.telemetry.source {
            if stale_after.is_zero() {
                return Err(ConfigError::Invalid(
                    "telemetry.source.stale_after must be non-zero".into(),
                ));
            }
        }
        let sim = &self.simulation;
        let finite = [
            sim.center_lat,
            sim.center_lon,
            sim.radius_deg,
            sim.step_rad,
            sim.altitude_m,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(ConfigError::Invalid("simulation values must be finite".into()));
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }
}
