use log::warn;
use std::collections::VecDeque;

use crate::core::particle::Particle;

/// Anomalies retained for inspection; older entries are dropped.
const MAX_RECORDED: usize = 64;

/// A step-over-step drop in total kinetic energy beyond tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyAnomaly {
    pub frame: u64,
    pub previous: f64,
    pub current: f64,
}

impl EnergyAnomaly {
    pub fn delta(&self) -> f64 {
        self.current - self.previous
    }
}

/// Diagnostic that watches total kinetic energy across frames.
///
/// Elastic contacts and wall reflections conserve kinetic energy, so a drop
/// points at a collision-handling defect. The monitor only records; it never
/// touches simulation state.
#[derive(Debug, Clone)]
pub struct EnergyMonitor {
    tolerance: f64,
    previous: Option<f64>,
    anomalies: VecDeque<EnergyAnomaly>,
    total_anomalies: u64,
}

impl EnergyMonitor {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.abs(),
            previous: None,
            anomalies: VecDeque::with_capacity(MAX_RECORDED),
            total_anomalies: 0,
        }
    }

    /// Total Σ½mv² over `particles`.
    pub fn total_kinetic_energy(particles: &[Particle]) -> f64 {
        particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Compare this frame's energy against the last one.
    pub fn check(&mut self, frame: u64, particles: &[Particle]) -> (f64, Option<EnergyAnomaly>) {
        let current = Self::total_kinetic_energy(particles);
        let anomaly = match self.previous {
            Some(previous) if current - previous < -self.tolerance => {
                let a = EnergyAnomaly {
                    frame,
                    previous,
                    current,
                };
                warn!(
                    "kinetic energy dropped by {:.6} at frame {frame} ({previous:.6} -> {current:.6})",
                    -a.delta()
                );
                if self.anomalies.len() == MAX_RECORDED {
                    self.anomalies.pop_front();
                }
                self.anomalies.push_back(a);
                self.total_anomalies += 1;
                Some(a)
            }
            _ => None,
        };
        self.previous = Some(current);
        (current, anomaly)
    }

    /// Forget the baseline after a deliberate energy change (population or
    /// temperature update, stop).
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Recorded anomalies, oldest first.
    pub fn anomalies(&self) -> &VecDeque<EnergyAnomaly> {
        &self.anomalies
    }

    pub fn total_anomalies(&self) -> u64 {
        self.total_anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particles(speed: f64) -> Vec<Particle> {
        vec![Particle::new([0.0, 0.0], [speed, 0.0], 1.0, 2.0).unwrap()]
    }

    #[test]
    fn first_check_sets_baseline() {
        let mut m = EnergyMonitor::new(0.001);
        let (e, a) = m.check(0, &particles(3.0));
        assert_eq!(e, 9.0);
        assert!(a.is_none());
    }

    #[test]
    fn drop_beyond_tolerance_is_recorded() {
        let mut m = EnergyMonitor::new(0.001);
        m.check(0, &particles(3.0));
        let (_, a) = m.check(1, &particles(2.0));
        let a = a.unwrap();
        assert_eq!(a.frame, 1);
        assert_eq!(a.delta(), -5.0);
        assert_eq!(m.anomalies().len(), 1);
    }

    #[test]
    fn gains_and_tiny_drops_are_ignored() {
        let mut m = EnergyMonitor::new(0.001);
        m.check(0, &particles(2.0));
        assert!(m.check(1, &particles(3.0)).1.is_none());
        assert!(m.check(2, &particles(2.99999)).1.is_none());
        assert_eq!(m.total_anomalies(), 0);
    }

    #[test]
    fn reset_forgets_baseline() {
        let mut m = EnergyMonitor::new(0.001);
        m.check(0, &particles(3.0));
        m.reset();
        assert!(m.check(1, &particles(0.0)).1.is_none());
    }

    #[test]
    fn history_is_bounded() {
        let mut m = EnergyMonitor::new(0.001);
        for frame in 0..200u64 {
            let speed = if frame % 2 == 0 { 3.0 } else { 1.0 };
            m.check(frame, &particles(speed));
        }
        assert_eq!(m.anomalies().len(), MAX_RECORDED);
        assert_eq!(m.total_anomalies(), 100);
        // Drops happen on odd frames; the oldest 36 have been evicted.
        assert_eq!(m.anomalies().front().map(|a| a.frame), Some(73));
        assert_eq!(m.anomalies().back().map(|a| a.frame), Some(199));
    }
}
