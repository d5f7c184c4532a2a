//! Live source fed by the ForeFlight UDP protocol.
//!
//! X-Plane ("Send position to ForeFlight") and several MSFS bridges broadcast two
//! plain-text datagrams:
//!
//! - `XGPS<sim>,lon,lat,alt_m,track,gs_m/s`
//! - `XATT<sim>,heading,pitch,roll`
//!
//! The link keeps the latest values and serves them as simulator variables.

use log::{debug, trace};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::error::{SourceError, TelemetryError};
use super::source::{SimLink, SimSource, SimVar};

const MAX_PACKET_SIZE: usize = 1024;
const METERS_TO_FEET: f64 = 1.0 / 0.3048;

#[derive(Debug, Clone)]
pub struct ForeFlightSource {
    port: u16,
    stale_after: Duration,
}

impl ForeFlightSource {
    pub fn new(port: u16, stale_after: Duration) -> Self {
        Self { port, stale_after }
    }
}

impl SimSource for ForeFlightSource {
    fn name(&self) -> &'static str {
        "foreflight"
    }

    fn connect(&self) -> Result<Arc<dyn SimLink>, TelemetryError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let link = ForeFlightLink::bind(addr, self.stale_after)
            .map_err(|e| TelemetryError::ConnectFailure(e.into()))?;
        Ok(Arc::new(link))
    }
}

pub struct ForeFlightLink {
    socket: UdpSocket,
    stale_after: Duration,
    state: Mutex<LinkState>,
}

#[derive(Debug, Default, Clone, Copy)]
struct LinkState {
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude_ft: Option<f64>,
    track: Option<f64>,
    heading: Option<f64>,
    last_packet: Option<Instant>,
    packets: u64,
}

impl ForeFlightLink {
    pub fn bind(addr: SocketAddr, stale_after: Duration) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        let link = Self {
            socket,
            stale_after,
            state: Mutex::new(LinkState::default()),
        };
        debug!("ForeFlight listener bound to {}", link.local_addr()?);
        Ok(link)
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Drains pending datagrams once and copies out the resulting state.
    fn current_state(&self) -> Result<LinkState, SourceError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.drain(&mut state)?;

        if let Some(last) = state.last_packet {
            let age = last.elapsed();
            if age > self.stale_after {
                return Err(SourceError::Stale(age));
            }
        }
        Ok(*state)
    }

    fn drain(&self, state: &mut LinkState) -> Result<(), SourceError> {
        let mut buf = [0u8; MAX_PACKET_SIZE];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(len) => match parse_datagram(&buf[..len]) {
                    Some(update) => {
                        state.apply(update);
                        state.last_packet = Some(Instant::now());
                        state.packets += 1;
                        if state.packets == 1 {
                            debug!("First ForeFlight datagram received");
                        }
                    }
                    None => trace!("Ignoring {} byte datagram", len),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl SimLink for ForeFlightLink {
    fn get(&self, var: SimVar) -> Result<Option<f64>, SourceError> {
        Ok(self.current_state()?.value(var))
    }

    fn get_many(&self, vars: &[SimVar]) -> Result<Vec<Option<f64>>, TelemetryError> {
        let state = self.current_state().map_err(|source| TelemetryError::ReadFailure {
            var: vars.first().copied().unwrap_or(SimVar::PlaneLatitude),
            source,
        })?;
        Ok(vars.iter().map(|&var| state.value(var)).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Datagram {
    Gps {
        longitude: f64,
        latitude: f64,
        altitude_m: f64,
        track: f64,
    },
    Attitude {
        heading: f64,
    },
}

impl LinkState {
    fn value(&self, var: SimVar) -> Option<f64> {
        match var {
            SimVar::PlaneLatitude => self.latitude,
            SimVar::PlaneLongitude => self.longitude,
            SimVar::PlaneAltitude => self.altitude_ft,
            // ForeFlight carries no magnetic variation; attitude heading is the best
            // available, ground track otherwise.
            SimVar::MagneticCompass => self.heading.or(self.track),
        }
    }

    fn apply(&mut self, update: Datagram) {
        match update {
            Datagram::Gps {
                longitude,
                latitude,
                altitude_m,
                track,
            } => {
                self.longitude = Some(longitude);
                self.latitude = Some(latitude);
                self.altitude_ft = Some(altitude_m * METERS_TO_FEET);
                self.track = Some(track);
            }
            Datagram::Attitude { heading } => self.heading = Some(heading),
        }
    }
}

fn parse_datagram(data: &[u8]) -> Option<Datagram> {
    let text = std::str::from_utf8(data).ok()?.trim();
    let mut parts = text.split(',');
    let header = parts.next()?;
    let fields: Vec<f64> = parts
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    if header.starts_with("XGPS") {
        if fields.len() < 5 {
            return None;
        }
        Some(Datagram::Gps {
            longitude: fields[0],
            latitude: fields[1],
            altitude_m: fields[2],
            track: normalize_heading(fields[3]),
        })
    } else if header.starts_with("XATT") {
        if fields.len() < 3 {
            return None;
        }
        Some(Datagram::Attitude {
            heading: normalize_heading(fields[0]),
        })
    } else {
        None
    }
}

fn normalize_heading(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}
