use crate::config::SimulationConfig;

use super::snapshot::Fix;

/// Deterministic circular flight around a fixed reference point.
#[derive(Debug, Clone)]
pub struct CircularFlight {
    config: SimulationConfig,
    t: f64,
}

impl CircularFlight {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config, t: 0.0 }
    }

    /// Orbit parameter in radians.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Moves one tick along the circle and returns the new position.
    pub fn advance(&mut self) -> Fix {
        self.t += self.config.step_rad;
        self.current_fix()
    }

    /// Position at the current `t`, without advancing.
    pub fn current_fix(&self) -> Fix {
        let c = &self.config;
        Fix {
            latitude: c.center_lat + c.radius_deg * self.t.cos(),
            longitude: c.center_lon + c.radius_deg * self.t.sin(),
            altitude_m: c.altitude_m,
            heading_deg: (90.0 + self.t.to_degrees()).rem_euclid(360.0),
        }
    }
}

impl Iterator for CircularFlight {
    type Item = Fix;

    fn next(&mut self) -> Option<Fix> {
        Some(self.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn trajectory_after_k_ticks() {
        let mut flight = CircularFlight::new(SimulationConfig::default());
        for k in 1..=200u32 {
            let fix = flight.advance();
            let t = 0.05 * k as f64;

            assert!((flight.t() - t).abs() < EPS, "t at tick {k}");
            assert!((fix.latitude - (37.6188 + 0.01 * t.cos())).abs() < EPS);
            assert!((fix.longitude - (-122.3754 + 0.01 * t.sin())).abs() < EPS);
            assert!((fix.heading_deg - (90.0 + t.to_degrees()).rem_euclid(360.0)).abs() < EPS);
            assert_eq!(fix.altitude_m, 100.0);
        }
    }

    #[test]
    fn heading_wraps_into_compass_range() {
        let flight = CircularFlight::new(SimulationConfig::default());
        let headings: Vec<f64> = flight.take(400).map(|f| f.heading_deg).collect();

        assert!(headings.iter().all(|h| (0.0..360.0).contains(h)));
        // 0.05 rad per tick passes 270 degrees of orbit after ~95 ticks.
        assert!(headings[99] < 90.0);
    }

    #[test]
    fn advance_and_current_fix_agree() {
        let mut flight = CircularFlight::new(SimulationConfig::default());
        let start = flight.current_fix();
        assert_eq!(start.latitude, 37.6188 + 0.01);
        assert_eq!(start.heading_deg, 90.0);

        let fix = flight.advance();
        assert_eq!(fix, flight.current_fix());
        // Used as an iterator, the flight yields the same sequence.
        let mut again = CircularFlight::new(SimulationConfig::default());
        assert_eq!(again.next(), Some(fix));
    }

    #[test]
    fn consecutive_ticks_move_the_aircraft() {
        let mut flight = CircularFlight::new(SimulationConfig::default());
        let a = flight.advance();
        let b = flight.advance();
        assert_ne!(a.latitude, b.latitude);
        assert_ne!(a.longitude, b.longitude);
    }
}
