use crate::config::SimConfig;
use crate::core::boundary;
use crate::core::collision::{self, approaching, dot};
use crate::core::energy::{EnergyAnomaly, EnergyMonitor};
use crate::core::event::{Contact, ContactKind};
use crate::core::particle::{Particle, DIM};
use crate::core::render::Scene;
use crate::core::thermal::{rescale_speeds, speed_for_temperature, target_particle_count};
use crate::core::wall::{
    Arena, Bounds, HomingController, Piston, PistonTrack, PointerMessage, WallId,
};
use crate::error::{Error, Result};
use crate::state::GasState;
use log::{debug, info, warn};
use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::f64::consts::TAU;

/// Changes in n or T smaller than this are treated as no change.
const EPS_STATE: f64 = 1e-9;

/// Placement attempts per particle before an overlapping spot is accepted.
const MAX_SPAWN_ATTEMPTS: usize = 64;

/// Diagnostics from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub frame: u64,
    pub kinetic_energy: f64,
    /// Contacts resolved across all sub-steps.
    pub contacts: usize,
    /// Particles pulled back inside by the boundary pass.
    pub corrections: usize,
    /// Whether the homing controller drove the piston this frame.
    pub homing: bool,
    pub anomaly: Option<EnergyAnomaly>,
}

/// The particle arena: particles, the piston and the three fixed walls.
///
/// Each call to [`SimulationWorld::step`] advances one frame:
/// 1. sync population and speeds with the state's n and T
/// 2. homing update for the piston
/// 3. per sub-step: move piston, drift particles, detect and resolve contacts
/// 4. boundary pass
/// 5. energy check
#[derive(Debug)]
pub struct SimulationWorld {
    config: SimConfig,
    arena: Arena,
    pub particles: Vec<Particle>,
    piston: Piston,
    homing: HomingController,
    monitor: EnergyMonitor,
    rng: StdRng,
    queue: BinaryHeap<Reverse<Contact>>,
    moles: f64,
    temperature: f64,
    frame: u64,
}

impl SimulationWorld {
    /// Build a world for `state`, spawning `round(n * PARTICLES_PER_MOLE)`
    /// particles at the speed for its temperature.
    pub fn new(config: SimConfig, arena: Arena, state: &GasState) -> Result<Self> {
        let mut world = Self::empty(config, arena, state)?;
        world.spawn(target_particle_count(state.moles))?;
        Ok(world)
    }

    /// Build a world with an explicit particle set. The population is only
    /// re-synchronised once the state's n changes.
    pub fn with_particles(
        config: SimConfig,
        arena: Arena,
        state: &GasState,
        particles: Vec<Particle>,
    ) -> Result<Self> {
        let mut world = Self::empty(config, arena, state)?;
        if !boundary::all_inside(&particles, &world.bounds()) {
            return Err(Error::OutOfBounds(
                "initial particles must lie inside the arena".into(),
            ));
        }
        world.particles = particles;
        Ok(world)
    }

    fn empty(config: SimConfig, arena: Arena, state: &GasState) -> Result<Self> {
        config.validate()?;
        arena.validate_for(&config)?;
        for (name, value) in [
            ("volume", state.volume),
            ("temperature", state.temperature),
            ("moles", state.moles),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidParam(format!("state {name} must be finite")));
            }
        }

        let rng: StdRng = match config.seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        let track = PistonTrack::new(&arena, &config);
        Ok(Self {
            piston: Piston::new(track, state.volume),
            homing: HomingController::from_config(&config),
            monitor: EnergyMonitor::new(config.energy_tolerance),
            config,
            arena,
            particles: Vec::new(),
            rng,
            queue: BinaryHeap::new(),
            moles: state.moles,
            temperature: state.temperature,
            frame: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn piston(&self) -> &Piston {
        &self.piston
    }

    pub fn monitor(&self) -> &EnergyMonitor {
        &self.monitor
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Current wall rectangle.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            left: 0.0,
            right: self.piston.x,
            top: 0.0,
            bottom: self.arena.height,
        }
    }

    pub fn kinetic_energy(&self) -> f64 {
        EnergyMonitor::total_kinetic_energy(&self.particles)
    }

    pub fn mean_speed(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        self.particles.iter().map(Particle::speed).sum::<f64>() / self.particles.len() as f64
    }

    /// Volume implied by the current piston position.
    pub fn piston_volume(&self) -> f64 {
        self.piston.track().volume_for_x(self.piston.x)
    }

    pub fn scene(&self) -> Scene<'_> {
        Scene {
            arena: self.arena,
            particles: &self.particles,
            piston_x: self.piston.x,
            owner: self.piston.owner(),
            frame: self.frame,
        }
    }

    /// Advance one frame toward `state`.
    pub fn step(&mut self, state: &GasState) -> StepReport {
        self.frame += 1;
        if state.moles.is_finite() && (state.moles - self.moles).abs() > EPS_STATE {
            self.sync_population(state.moles);
        }
        if state.temperature.is_finite() && (state.temperature - self.temperature).abs() > EPS_STATE
        {
            self.sync_temperature(state.temperature);
        }

        let homing = state.volume.is_finite() && self.homing.update(&mut self.piston, state.volume);

        let substeps = self.config.substeps;
        let dt = 1.0 / f64::from(substeps);
        let mut contacts = 0usize;
        for s in 0..substeps {
            self.piston.advance(dt);
            for p in &mut self.particles {
                p.drift(dt);
            }
            contacts += self.resolve_contacts(f64::from(s + 1) * dt);
        }

        let bounds = self.bounds();
        let corrections = boundary::enforce(&mut self.particles, &bounds);
        if corrections > 0 {
            debug!("frame {}: boundary pass corrected {corrections} particle(s)", self.frame);
        }

        let (kinetic_energy, anomaly) = self.monitor.check(self.frame, &self.particles);
        StepReport {
            frame: self.frame,
            kinetic_energy,
            contacts,
            corrections,
            homing,
            anomaly,
        }
    }

    /// Freeze the arena: zero every particle velocity and the piston velocity.
    pub fn stop(&mut self) {
        for p in &mut self.particles {
            p.v = [0.0; DIM];
        }
        self.piston.vx = 0.0;
        self.monitor.reset();
        info!("arena stopped at frame {} with {} particles", self.frame, self.particles.len());
    }

    /// Route a pointer message to the piston. Returns the released volume on drag end.
    pub fn handle_pointer(&mut self, msg: PointerMessage) -> Option<f64> {
        let released = self.piston.handle(msg);
        if let Some(volume) = released {
            info!("piston released at x = {:.2} (V = {volume:.3} L)", self.piston.x);
        }
        released
    }

    // ============ Internal helpers ============

    fn sync_population(&mut self, moles: f64) {
        let target = target_particle_count(moles);
        let current = self.particles.len();
        if target > current {
            if let Err(e) = self.spawn(target - current) {
                warn!("failed to spawn particles: {e}");
            }
        } else {
            self.particles.truncate(target);
        }
        debug!("population {current} -> {} for n = {moles:.3} mol", self.particles.len());
        self.moles = moles;
        self.monitor.reset();
    }

    fn sync_temperature(&mut self, temperature: f64) {
        let speed = speed_for_temperature(temperature, &self.config);
        rescale_speeds(&mut self.particles, speed, &mut self.rng);
        debug!("speeds reset to {speed:.3} px/frame for T = {temperature:.2} K");
        self.temperature = temperature;
        self.monitor.reset();
    }

    /// Append `count` particles at random interior positions, preferring
    /// spots that do not overlap existing particles.
    fn spawn(&mut self, count: usize) -> Result<()> {
        let radius = self.config.particle_radius;
        let margin = self.config.spawn_margin;
        let (x_lo, x_hi) = (margin, self.piston.x - margin);
        let (y_lo, y_hi) = (margin, self.arena.height - margin);
        if x_hi <= x_lo || y_hi <= y_lo {
            return Err(Error::OutOfBounds(format!(
                "no room to spawn: x in [{x_lo}, {x_hi}], y in [{y_lo}, {y_hi}]"
            )));
        }
        let speed = speed_for_temperature(self.temperature, &self.config);
        self.particles.reserve(count);
        for _ in 0..count {
            let mut r = [0.0_f64; DIM];
            for attempt in 0..MAX_SPAWN_ATTEMPTS {
                r = [
                    self.rng.random_range(x_lo..=x_hi),
                    self.rng.random_range(y_lo..=y_hi),
                ];
                if !overlaps_existing(&self.particles, &r, radius) {
                    break;
                }
                if attempt + 1 == MAX_SPAWN_ATTEMPTS {
                    debug!("accepting overlapping spawn after {MAX_SPAWN_ATTEMPTS} attempts");
                }
            }
            let mut p = Particle::new(r, [0.0; DIM], radius, self.config.particle_mass)?;
            p.aim(speed, self.rng.random_range(0.0..TAU));
            self.particles.push(p);
        }
        Ok(())
    }

    /// Queue every contact present at the end of the sub-step ending at `t_end`.
    fn detect_contacts(&mut self, t_end: f64) {
        let bounds = self.bounds();
        let particles = &self.particles;
        let queue = &mut self.queue;
        for (i, p) in particles.iter().enumerate() {
            for wall in WallId::ALL {
                let axis = wall.orientation().normal_axis();
                let outward = wall.outward();
                let limit = bounds.plane(wall) - outward * p.radius;
                let depth = (p.r[axis] - limit) * outward;
                let closing = p.v[axis] * outward;
                if depth >= 0.0 && closing > 0.0 {
                    push_contact(
                        queue,
                        t_end - depth / closing,
                        ContactKind::Wall { i, wall },
                        p.collision_count,
                        None,
                    );
                }
            }
            for (j, q) in particles.iter().enumerate().skip(i + 1) {
                let mut d = [0.0_f64; DIM];
                let mut u = [0.0_f64; DIM];
                for k in 0..DIM {
                    d[k] = q.r[k] - p.r[k];
                    u[k] = q.v[k] - p.v[k];
                }
                let dist = dot(&d, &d).sqrt();
                let r_sum = p.radius + q.radius;
                if dist >= r_sum || dist <= 0.0 || !approaching(p, q) {
                    continue;
                }
                let closing = -dot(&d, &u) / dist;
                push_contact(
                    queue,
                    t_end - (r_sum - dist) / closing,
                    ContactKind::Pair { i, j },
                    p.collision_count,
                    Some(q.collision_count),
                );
            }
        }
    }

    /// Resolve queued contacts earliest first. Contacts whose participants were
    /// already involved in an earlier one this sub-step are skipped; if still
    /// relevant they are detected again next sub-step.
    fn resolve_contacts(&mut self, t_end: f64) -> usize {
        self.queue.clear();
        self.detect_contacts(t_end);

        let mut resolved = 0usize;
        while let Some(Reverse(contact)) = self.queue.pop() {
            match contact.kind {
                ContactKind::Pair { i, j } => {
                    let (cci, ccj) = (
                        self.particles[i].collision_count,
                        self.particles[j].collision_count,
                    );
                    if !contact.is_valid(cci, Some(ccj)) {
                        continue;
                    }
                    if let Err(e) = collision::resolve_pair(&mut self.particles, i, j) {
                        warn!("skipping contact between {i} and {j}: {e}");
                        continue;
                    }
                    self.particles[i].bump_collision_count();
                    self.particles[j].bump_collision_count();
                }
                ContactKind::Wall { i, wall } => {
                    let p = &mut self.particles[i];
                    if !contact.is_valid(p.collision_count, None) {
                        continue;
                    }
                    p.v = collision::reflect(p.v, wall.orientation());
                    p.bump_collision_count();
                }
            }
            resolved += 1;
        }
        resolved
    }
}

// ============ Utility helpers ============

fn push_contact(
    queue: &mut BinaryHeap<Reverse<Contact>>,
    time: f64,
    kind: ContactKind,
    cc_i: u64,
    cc_j: Option<u64>,
) {
    match Contact::new(time, kind, cc_i, cc_j) {
        Ok(c) => queue.push(Reverse(c)),
        Err(e) => debug!("dropping contact {kind:?}: {e}"),
    }
}

fn overlaps_existing(existing: &[Particle], r: &[f64; DIM], radius: f64) -> bool {
    existing.iter().any(|p| {
        let mut d = [0.0_f64; DIM];
        for ((dk, &rk), &pk) in d.iter_mut().zip(r.iter()).zip(p.r.iter()) {
            *dk = rk - pk;
        }
        let min = radius + p.radius;
        dot(&d, &d) < min * min
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wall::PistonOwner;

    fn arena() -> Arena {
        Arena::new(800.0, 400.0).unwrap()
    }

    fn config() -> SimConfig {
        SimConfig::default().with_seed(42)
    }

    #[test]
    fn new_world_matches_state() -> Result<()> {
        let state = GasState::default();
        let world = SimulationWorld::new(config(), arena(), &state)?;
        assert_eq!(world.num_particles(), 20);
        assert_eq!(world.piston().x, world.piston().track().x_for_volume(22.4));
        let speed = speed_for_temperature(273.15, world.config());
        for p in &world.particles {
            assert!((p.speed() - speed).abs() < 1e-12);
        }
        assert!(boundary::all_inside(&world.particles, &world.bounds()));
        Ok(())
    }

    #[test]
    fn invalid_state_is_rejected() {
        let state = GasState {
            volume: f64::NAN,
            ..GasState::default()
        };
        assert!(SimulationWorld::new(config(), arena(), &state).is_err());
    }

    #[test]
    fn wall_contact_detected_and_reflected() -> Result<()> {
        let state = GasState::default();
        let p = Particle::new([5.0, 200.0], [-2.0, 0.5], 4.0, 1.0)?;
        let mut world = SimulationWorld::with_particles(config(), arena(), &state, vec![p])?;
        let report = world.step(&state);
        assert_eq!(report.contacts, 1);
        assert_eq!(world.particles[0].v, [2.0, 0.5]);
        assert!(boundary::all_inside(&world.particles, &world.bounds()));
        Ok(())
    }

    #[test]
    fn population_follows_moles_without_touching_survivors() -> Result<()> {
        let state = GasState::default();
        let mut world = SimulationWorld::new(config(), arena(), &state)?;
        let originals = world.particles.clone();

        world.sync_population(2.0);
        assert_eq!(world.num_particles(), 40);
        assert_eq!(&world.particles[..20], &originals[..]);

        world.sync_population(0.5);
        assert_eq!(world.num_particles(), 10);
        assert_eq!(&world.particles[..], &originals[..10]);
        Ok(())
    }

    #[test]
    fn step_picks_up_moles_change() -> Result<()> {
        let mut state = GasState::default();
        let mut world = SimulationWorld::new(config(), arena(), &state)?;
        state.moles = 3.0;
        world.step(&state);
        assert_eq!(world.num_particles(), 60);
        assert!(boundary::all_inside(&world.particles, &world.bounds()));
        Ok(())
    }

    #[test]
    fn temperature_change_resets_speeds() -> Result<()> {
        let state = GasState::default();
        let mut world = SimulationWorld::new(config(), arena(), &state)?;
        world.sync_temperature(400.0);
        let expected = speed_for_temperature(400.0, world.config());
        for p in &world.particles {
            assert!((p.speed() - expected).abs() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn stop_zeroes_velocities() -> Result<()> {
        let state = GasState::default();
        let mut world = SimulationWorld::new(config(), arena(), &state)?;
        world.step(&state);
        world.stop();
        assert_eq!(world.kinetic_energy(), 0.0);
        let report = world.step(&state);
        assert_eq!(report.kinetic_energy, 0.0);
        assert!(report.anomaly.is_none());
        Ok(())
    }

    #[test]
    fn homing_suspended_during_drag() -> Result<()> {
        let mut state = GasState::default();
        let mut world = SimulationWorld::new(config(), arena(), &state)?;
        world.handle_pointer(PointerMessage::DragStart);
        assert_eq!(world.piston().owner(), PistonOwner::UserDragging);
        let x0 = world.piston().x;
        state.volume = 40.0;
        let report = world.step(&state);
        assert!(!report.homing);
        assert_eq!(world.piston().x, x0);
        Ok(())
    }

    #[test]
    fn overlap_check() -> Result<()> {
        let ps = vec![Particle::new([10.0, 10.0], [0.0, 0.0], 4.0, 1.0)?];
        assert!(overlaps_existing(&ps, &[15.0, 10.0], 4.0));
        assert!(!overlaps_existing(&ps, &[18.5, 10.0], 4.0));
        Ok(())
    }
}
