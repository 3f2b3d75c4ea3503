use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Particles spawned per mole of gas. Used both at creation and whenever n changes.
pub const PARTICLES_PER_MOLE: f64 = 20.0;

/// Tunable parameters of the particle arena.
///
/// Lengths are in arena pixels and velocities in pixels per frame; one call
/// to `step` advances one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Piston x at minimum volume, as a fraction of arena width.
    pub piston_min_fraction: f64,
    /// Piston x at maximum volume, as a fraction of arena width.
    pub piston_max_fraction: f64,
    pub particle_radius: f64,
    pub particle_mass: f64,
    /// Particle speed at the lowest temperature.
    pub min_speed: f64,
    /// Particle speed at the highest temperature.
    pub max_speed: f64,
    /// Exponent (> 1) shaping the temperature→speed curve.
    pub speed_exponent: f64,
    /// Proportional gain of the piston homing controller (per frame).
    pub homing_gain: f64,
    /// Position error (px) below which the piston is considered home.
    pub homing_deadband: f64,
    /// Residual error (px) above which a settled piston snaps to its target.
    pub homing_snap: f64,
    /// Step-over-step kinetic energy drop flagged as an anomaly.
    pub energy_tolerance: f64,
    /// Integration sub-steps per frame.
    pub substeps: u32,
    /// Clearance from every wall when spawning particles.
    pub spawn_margin: f64,
    /// RNG seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            piston_min_fraction: 0.3,
            piston_max_fraction: 0.95,
            particle_radius: 4.0,
            particle_mass: 1.0,
            min_speed: 1.0,
            max_speed: 6.0,
            speed_exponent: 1.5,
            homing_gain: 0.2,
            homing_deadband: 0.5,
            homing_snap: 0.1,
            energy_tolerance: 0.001,
            substeps: 4,
            spawn_margin: 10.0,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check internal consistency. Arena-dependent checks live in
    /// [`crate::core::Arena::validate_for`].
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("particle_radius", self.particle_radius),
            ("particle_mass", self.particle_mass),
            ("max_speed", self.max_speed),
            ("homing_gain", self.homing_gain),
            ("homing_deadband", self.homing_deadband),
            ("energy_tolerance", self.energy_tolerance),
            ("spawn_margin", self.spawn_margin),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParam(format!("{name} must be finite and > 0")));
            }
        }
        if !self.min_speed.is_finite() || self.min_speed < 0.0 || self.min_speed > self.max_speed {
            return Err(Error::InvalidParam(
                "min_speed must be finite and within [0, max_speed]".into(),
            ));
        }
        if !self.speed_exponent.is_finite() || self.speed_exponent <= 1.0 {
            return Err(Error::InvalidParam("speed_exponent must be > 1".into()));
        }
        if self.homing_gain > 1.0 {
            return Err(Error::InvalidParam("homing_gain must not exceed 1".into()));
        }
        if !self.homing_snap.is_finite()
            || self.homing_snap < 0.0
            || self.homing_snap > self.homing_deadband
        {
            return Err(Error::InvalidParam(
                "homing_snap must lie within [0, homing_deadband]".into(),
            ));
        }
        let (lo, hi) = (self.piston_min_fraction, self.piston_max_fraction);
        if !(lo > 0.0 && lo < hi && hi <= 1.0) {
            return Err(Error::InvalidParam(
                "piston fractions must satisfy 0 < min < max <= 1".into(),
            ));
        }
        if self.spawn_margin < self.particle_radius {
            return Err(Error::InvalidParam(
                "spawn_margin must be at least particle_radius".into(),
            ));
        }
        if self.substeps == 0 {
            return Err(Error::InvalidParam("substeps must be >= 1".into()));
        }
        Ok(())
    }
}
