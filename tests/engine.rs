use gassandbox::core::boundary;
use gassandbox::core::{
    Arena, FrameRecorder, MolecularEngine, Particle, PistonOwner, PointerMessage,
    SimulationWorld,
};
use gassandbox::error::Result;
use gassandbox::state::{GasState, InMemoryStore, LockedVariable, StateStore};
use gassandbox::SimConfig;

fn arena() -> Result<Arena> {
    Arena::new(800.0, 400.0)
}

fn config(seed: u64) -> SimConfig {
    SimConfig::default().with_seed(seed)
}

/// A lone particle bouncing off the fixed walls and a resting piston keeps its
/// kinetic energy exactly; the monitor never fires.
#[test]
fn single_particle_conserves_energy() -> Result<()> {
    let state = GasState::default();
    let p = Particle::new([120.0, 80.0], [3.7, -2.9], 4.0, 1.0)?;
    let e0 = p.kinetic_energy();
    let mut world = SimulationWorld::with_particles(config(3), arena()?, &state, vec![p])?;

    let mut contacts = 0usize;
    for _ in 0..1000 {
        let report = world.step(&state);
        assert!(report.anomaly.is_none(), "frame {}: {:?}", report.frame, report.anomaly);
        contacts += report.contacts;
    }
    assert!(contacts > 0, "particle never reached a wall");
    assert_eq!(world.monitor().total_anomalies(), 0);
    assert!((world.kinetic_energy() - e0).abs() < 1e-9);
    assert_eq!(world.frame(), 1000);
    Ok(())
}

/// A populated arena at fixed state keeps its energy within tolerance and its
/// particles inside the walls.
#[test]
fn populated_arena_stays_inside_and_conserves() -> Result<()> {
    let state = GasState {
        temperature: 380.0,
        moles: 2.0,
        ..GasState::default()
    };
    let mut world = SimulationWorld::new(config(11), arena()?, &state)?;
    assert_eq!(world.num_particles(), 40);
    let e0 = world.kinetic_energy();

    for _ in 0..500 {
        world.step(&state);
        assert!(boundary::all_inside(&world.particles, &world.bounds()));
    }
    assert_eq!(world.monitor().total_anomalies(), 0);
    assert!(((world.kinetic_energy() - e0) / e0).abs() < 1e-9);
    Ok(())
}

/// Shrinking the volume drives the piston in; particles are swept along and
/// never left outside.
#[test]
fn piston_homes_onto_new_volume() -> Result<()> {
    let mut state = GasState::default();
    let mut world = SimulationWorld::new(config(5), arena()?, &state)?;
    let start_x = world.piston().x;

    state.volume = 10.0;
    let target = world.piston().track().x_for_volume(state.volume);
    let mut homed = false;
    for _ in 0..200 {
        let report = world.step(&state);
        homed |= report.homing;
        assert!(boundary::all_inside(&world.particles, &world.bounds()));
    }
    assert!(homed);
    assert!(world.piston().x < start_x);
    assert!((world.piston().x - target).abs() < 0.5);
    assert!((world.piston_volume() - 10.0).abs() < 0.1);
    Ok(())
}

/// Dragging past the end of the track releases at the largest volume. The
/// coordinator pins P at its floor and trims n so the stored state stays on
/// its equation of state; homing then holds the piston there.
#[test]
fn drag_release_commits_clamped_volume() -> Result<()> {
    let mut store = InMemoryStore::default();
    let mut engine = MolecularEngine::new(config(9));
    engine.initialize(FrameRecorder::new(arena()?), &store.snapshot())?;

    assert_eq!(engine.handle_pointer(PointerMessage::DragStart, &mut store), None);
    engine.step(&store.snapshot());
    engine.handle_pointer(PointerMessage::DragMove { x: 10_000.0 }, &mut store);
    let rec = engine.target().map(FrameRecorder::owner);
    assert_eq!(rec, Some(PistonOwner::UserDragging));
    assert_eq!(store.revision(), 0);

    let released = engine.handle_pointer(PointerMessage::DragEnd, &mut store);
    assert_eq!(released, Some(50.0));
    let stored = store.snapshot();
    assert_eq!(stored.volume, 50.0);
    assert_eq!(stored.pressure, 50.0);
    assert!(stored.moles < 1.0 && stored.moles >= 0.5, "{stored:?}");
    assert!(stored.relative_residual() < 1e-6, "{stored:?}");
    assert_eq!(store.revision(), 1);

    let x = engine.world().map(|w| w.piston().x);
    for _ in 0..10 {
        let report = engine.step(&store.snapshot());
        assert!(report.is_some_and(|r| r.homing));
    }
    assert_eq!(engine.world().map(|w| w.piston().x), x);
    assert_eq!(
        engine.world().map(|w| w.piston().owner()),
        Some(PistonOwner::AutoTracking)
    );
    Ok(())
}

/// With V locked a release is refused; the store keeps its volume and the
/// piston returns to it.
#[test]
fn locked_volume_release_homes_back() -> Result<()> {
    let start = GasState {
        locked: LockedVariable::Volume,
        ..GasState::default()
    };
    let mut store = InMemoryStore::new(start);
    let mut engine = MolecularEngine::new(config(17));
    engine.initialize(FrameRecorder::new(arena()?), &store.snapshot())?;
    let home = engine
        .world()
        .map(|w| w.piston().track().x_for_volume(start.volume))
        .unwrap_or_default();

    engine.handle_pointer(PointerMessage::DragStart, &mut store);
    engine.handle_pointer(PointerMessage::DragMove { x: 10_000.0 }, &mut store);
    assert_eq!(engine.handle_pointer(PointerMessage::DragEnd, &mut store), None);
    assert_eq!(store.snapshot(), start);
    assert_eq!(store.revision(), 0);
    assert_eq!(
        engine.world().map(|w| w.piston().owner()),
        Some(PistonOwner::AutoTracking)
    );

    for _ in 0..200 {
        engine.step(&store.snapshot());
    }
    let x = engine.world().map(|w| w.piston().x).unwrap_or_default();
    assert!((x - home).abs() < 0.5, "piston at {x}, home {home}");
    Ok(())
}

/// Before a render target arrives nothing happens and nothing is written.
#[test]
fn engine_without_target_is_a_no_op() {
    let mut store = InMemoryStore::default();
    let mut engine: MolecularEngine<FrameRecorder> = MolecularEngine::new(config(1));
    for msg in [
        PointerMessage::DragStart,
        PointerMessage::DragMove { x: 300.0 },
        PointerMessage::DragEnd,
    ] {
        assert_eq!(engine.handle_pointer(msg, &mut store), None);
    }
    assert!(engine.step(&store.snapshot()).is_none());
    assert!(!engine.stop());
    assert!(engine.world().is_none());
    assert_eq!(store.revision(), 0);
}

/// After stop every particle stays where it is.
#[test]
fn stop_freezes_the_arena() -> Result<()> {
    let state = GasState::default();
    let mut engine = MolecularEngine::new(config(21));
    engine.initialize(FrameRecorder::new(arena()?), &state)?;
    for _ in 0..20 {
        engine.step(&state);
    }
    assert!(engine.stop());

    let frozen: Vec<[f64; 2]> = engine
        .target()
        .map(|r| r.positions().to_vec())
        .unwrap_or_default();
    for _ in 0..5 {
        let report = engine.step(&state);
        assert_eq!(report.map(|r| r.kinetic_energy), Some(0.0));
    }
    let after = engine.world().map(|w| w.particles.iter().map(|p| p.r).collect::<Vec<_>>());
    assert_eq!(after, Some(frozen.clone()));
    assert_eq!(engine.target().map(|r| r.positions().to_vec()), Some(frozen));
    Ok(())
}

/// Adding moles grows the population at the fixed per-mole rate; the energy
/// baseline restarts so the change is not reported as an anomaly.
#[test]
fn population_tracks_moles_without_false_alarms() -> Result<()> {
    let mut state = GasState::default();
    let mut world = SimulationWorld::new(config(13), arena()?, &state)?;
    for moles in [2.5, 0.5, 1.25] {
        state.moles = moles;
        let report = world.step(&state);
        assert_eq!(
            world.num_particles(),
            (moles * gassandbox::PARTICLES_PER_MOLE).round() as usize
        );
        assert!(report.anomaly.is_none());
    }
    assert_eq!(world.monitor().total_anomalies(), 0);
    Ok(())
}
