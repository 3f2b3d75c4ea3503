//! Mapping from macroscopic quantities to particle population and speed.
//!
//! Every particle is given the same speed for a temperature, with a fresh
//! uniformly random direction. This is a visual simplification and not a
//! Maxwell–Boltzmann resample: the arena shows "hotter means faster" and
//! nothing more. The curve is convex (exponent > 1) so the upper end of the
//! temperature range reads as clearly more agitated.

use rand::Rng;
use std::f64::consts::TAU;

use crate::config::{SimConfig, PARTICLES_PER_MOLE};
use crate::core::particle::Particle;
use crate::state::bounds::{MOLES, TEMPERATURE};

/// Display speed (px per frame) for temperature `t` (K).
pub fn speed_for_temperature(t: f64, config: &SimConfig) -> f64 {
    let shaped = TEMPERATURE.normalize(t).powf(config.speed_exponent);
    config.min_speed + shaped * (config.max_speed - config.min_speed)
}

/// Number of particles drawn for `moles` of gas, between one and the count
/// for the largest allowed amount.
pub fn target_particle_count(moles: f64) -> usize {
    if !moles.is_finite() || moles <= 0.0 {
        return 1;
    }
    ((moles.min(MOLES.max) * PARTICLES_PER_MOLE).round() as usize).max(1)
}

/// Give every particle `speed` along an independent uniformly random direction.
pub fn rescale_speeds<R: Rng + ?Sized>(particles: &mut [Particle], speed: f64, rng: &mut R) {
    for p in particles.iter_mut() {
        let angle = rng.random_range(0.0..TAU);
        p.aim(speed, angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn speed_curve_spans_configured_range() {
        let cfg = SimConfig::default();
        assert_eq!(speed_for_temperature(200.0, &cfg), cfg.min_speed);
        assert_eq!(speed_for_temperature(400.0, &cfg), cfg.max_speed);
        assert_eq!(speed_for_temperature(50.0, &cfg), cfg.min_speed);
    }

    #[test]
    fn speed_curve_is_convex() {
        let cfg = SimConfig::default();
        let mid = speed_for_temperature(300.0, &cfg);
        let linear_mid = 0.5 * (cfg.min_speed + cfg.max_speed);
        assert!(mid < linear_mid, "{mid} vs {linear_mid}");
    }

    #[test]
    fn particle_count_scales_with_moles() {
        assert_eq!(target_particle_count(1.0), 20);
        assert_eq!(target_particle_count(0.5), 10);
        assert_eq!(target_particle_count(3.0), 60);
        assert_eq!(target_particle_count(0.0), 1);
    }

    #[test]
    fn particle_count_is_capped_at_largest_amount() {
        assert_eq!(target_particle_count(3.5), 60);
        assert_eq!(target_particle_count(1e300), 60);
        assert_eq!(target_particle_count(f64::MAX), 60);
        assert_eq!(target_particle_count(f64::INFINITY), 1);
    }

    #[test]
    fn rescale_sets_exact_magnitude() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut ps: Vec<Particle> = (0..8)
            .map(|i| Particle::new([i as f64, 0.0], [0.0, 0.0], 1.0, 1.0).unwrap())
            .collect();
        rescale_speeds(&mut ps, 4.5, &mut rng);
        for p in &ps {
            assert_relative_eq!(p.speed(), 4.5, max_relative = 1e-12);
        }
    }
}
