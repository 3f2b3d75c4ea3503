use crate::error::{Error, Result};

/// Spatial dimension of the arena.
pub const DIM: usize = 2;

/// A gas molecule drawn as a hard disc in the arena.
///
/// Fields:
/// - `r`: position [x, y] in arena pixels (y grows downward)
/// - `v`: velocity [vx, vy] in pixels per frame
/// - `radius`: disc radius (> 0)
/// - `mass`: particle mass (> 0)
/// - `collision_count`: bumped each time the particle takes part in a resolved contact
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    /// Disc radius (> 0).
    pub radius: f64,
    /// Mass (> 0).
    pub mass: f64,
    /// Contact participation counter (for contact invalidation within a sub-step).
    pub collision_count: u64,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` or `mass` is non-positive or any component is NaN/inf.
    pub fn new(r: [f64; DIM], v: [f64; DIM], radius: f64, mass: f64) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            r,
            v,
            radius,
            mass,
            collision_count: 0,
        })
    }

    #[inline]
    pub fn bump_collision_count(&mut self) {
        self.collision_count = self.collision_count.saturating_add(1);
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.v.iter().map(|&c| c * c).sum::<f64>().sqrt()
    }

    /// 1/2 m |v|^2
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        let vsq: f64 = self.v.iter().map(|&c| c * c).sum();
        0.5 * self.mass * vsq
    }

    /// Linear drift over `dt` frames.
    #[inline]
    pub fn drift(&mut self, dt: f64) {
        for (r, v) in self.r.iter_mut().zip(self.v.iter()) {
            *r += v * dt;
        }
    }

    /// Replace the velocity by one of magnitude `speed` along `angle` (radians).
    pub fn aim(&mut self, speed: f64, angle: f64) {
        self.v = [speed * angle.cos(), speed * angle.sin()];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_ok() -> Result<()> {
        let p = Particle::new([0.0, 1.0], [2.0, -3.0], 0.5, 2.0)?;
        assert_eq!(p.r, [0.0, 1.0]);
        assert_eq!(p.v, [2.0, -3.0]);
        assert_eq!(p.radius, 0.5);
        assert_eq!(p.mass, 2.0);
        assert_eq!(p.collision_count, 0);
        Ok(())
    }

    #[test]
    fn invalid_radius_rejected() {
        let err = Particle::new([0.0, 0.0], [0.0, 0.0], 0.0, 1.0).unwrap_err();
        assert!(err.to_string().contains("radius"));
    }

    #[test]
    fn invalid_mass_rejected() {
        let err = Particle::new([0.0, 0.0], [0.0, 0.0], 1.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("mass"));
    }

    #[test]
    fn non_finite_velocity_rejected() {
        let err = Particle::new([0.0, 0.0], [f64::NAN, 0.0], 1.0, 1.0).unwrap_err();
        assert!(err.to_string().contains("velocity"));
    }

    #[test]
    fn kinetic_energy_and_speed() -> Result<()> {
        // v = (3,4), |v|^2 = 25; KE = 0.5 * m * 25
        let p = Particle::new([0.0, 0.0], [3.0, 4.0], 1.0, 2.0)?;
        assert!((p.kinetic_energy() - 25.0).abs() < 1e-12);
        assert!((p.speed() - 5.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn drift_and_aim() -> Result<()> {
        let mut p = Particle::new([1.0, 1.0], [2.0, -1.0], 1.0, 1.0)?;
        p.drift(0.5);
        assert_eq!(p.r, [2.0, 0.5]);
        p.aim(3.0, 0.0);
        assert_eq!(p.v, [3.0, 0.0]);
        Ok(())
    }
}
