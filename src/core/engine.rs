//! Frame-driven facade over [`SimulationWorld`] and a [`RenderTarget`].
//!
//! The engine is constructible before a drawing surface exists. Until
//! [`MolecularEngine::initialize`] succeeds every call is a no-op.

use log::{info, warn};

use crate::config::SimConfig;
use crate::core::render::RenderTarget;
use crate::core::wall::PointerMessage;
use crate::core::world::{SimulationWorld, StepReport};
use crate::error::Result;
use crate::state::{commit, compute_new_state, ChangeRequest, GasState, StateStore};

#[derive(Debug)]
pub struct MolecularEngine<R: RenderTarget> {
    config: SimConfig,
    world: Option<SimulationWorld>,
    target: Option<R>,
}

impl<R: RenderTarget> MolecularEngine<R> {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            world: None,
            target: None,
        }
    }

    /// Build the arena for `state` inside `target`. Re-initializing replaces
    /// the previous world and target.
    pub fn initialize(&mut self, target: R, state: &GasState) -> Result<()> {
        let arena = target.arena();
        let world = SimulationWorld::new(self.config.clone(), arena, state)?;
        info!(
            "engine initialized: {}x{} px arena, {} particles",
            arena.width,
            arena.height,
            world.num_particles()
        );
        self.world = Some(world);
        self.target = Some(target);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.world.is_some()
    }

    /// Advance one frame toward `state` and render it.
    pub fn step(&mut self, state: &GasState) -> Option<StepReport> {
        let world = self.world.as_mut()?;
        let report = world.step(state);
        if let Some(target) = self.target.as_mut() {
            target.render(&world.scene());
        }
        Some(report)
    }

    /// Zero every velocity. Returns false when there is nothing to stop.
    pub fn stop(&mut self) -> bool {
        match self.world.as_mut() {
            Some(world) => {
                world.stop();
                true
            }
            None => false,
        }
    }

    /// Route a pointer message to the piston. On drag release the implied
    /// volume goes through the coordinator like any other V edit; the accepted
    /// volume is committed to `store` and returned. A rejected release leaves
    /// the store alone and the piston homes back to the stored volume.
    pub fn handle_pointer<S: StateStore + ?Sized>(
        &mut self,
        msg: PointerMessage,
        store: &mut S,
    ) -> Option<f64> {
        let volume = self.world.as_mut()?.handle_pointer(msg)?;
        let result = compute_new_state(&store.snapshot(), ChangeRequest::Volume(volume));
        if commit(store, &result) {
            if let Some(note) = result.notification() {
                info!("{note}");
            }
            return Some(volume);
        }
        if let Some(reason) = result.reason() {
            warn!("piston release to {volume:.3} L rejected: {reason}");
        }
        None
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn world(&self) -> Option<&SimulationWorld> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut SimulationWorld> {
        self.world.as_mut()
    }

    pub fn target(&self) -> Option<&R> {
        self.target.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::FrameRecorder;
    use crate::core::wall::Arena;
    use crate::state::InMemoryStore;

    fn recorder() -> FrameRecorder {
        FrameRecorder::new(Arena::new(800.0, 400.0).unwrap())
    }

    #[test]
    fn uninitialized_engine_is_inert() {
        let mut engine: MolecularEngine<FrameRecorder> =
            MolecularEngine::new(SimConfig::default().with_seed(1));
        let mut store = InMemoryStore::default();
        assert!(!engine.is_initialized());
        assert!(engine.step(&GasState::default()).is_none());
        assert!(!engine.stop());
        assert_eq!(engine.handle_pointer(PointerMessage::DragStart, &mut store), None);
        assert_eq!(store.revision(), 0);
        assert!(engine.target().is_none());
    }

    #[test]
    fn step_renders_each_frame() -> Result<()> {
        let state = GasState::default();
        let mut engine = MolecularEngine::new(SimConfig::default().with_seed(1));
        engine.initialize(recorder(), &state)?;
        for _ in 0..3 {
            assert!(engine.step(&state).is_some());
        }
        let rec = engine.target().unwrap();
        assert_eq!(rec.frames(), 3);
        assert_eq!(rec.positions().len(), 20);
        Ok(())
    }

    #[test]
    fn drag_release_writes_volume() -> Result<()> {
        let state = GasState::default();
        let mut store = InMemoryStore::new(state);
        let mut engine = MolecularEngine::new(SimConfig::default().with_seed(1));
        engine.initialize(recorder(), &state)?;

        let x = engine.world().unwrap().piston().track().x_for_volume(40.0);
        assert_eq!(engine.handle_pointer(PointerMessage::DragStart, &mut store), None);
        assert_eq!(
            engine.handle_pointer(PointerMessage::DragMove { x }, &mut store),
            None
        );
        let released = engine
            .handle_pointer(PointerMessage::DragEnd, &mut store)
            .unwrap();
        assert!((released - 40.0).abs() < 1e-9);
        let stored = store.state();
        assert_eq!(stored.volume, released);
        assert_eq!(stored.temperature, state.temperature);
        assert_eq!(stored.moles, state.moles);
        assert!((stored.pressure - 8.314 * 273.15 / released).abs() < 1e-9);
        assert!(stored.relative_residual() < 1e-6, "{stored:?}");
        assert_eq!(store.revision(), 1);
        Ok(())
    }

    #[test]
    fn rejected_release_leaves_store_untouched() -> Result<()> {
        let state = GasState {
            locked: crate::state::LockedVariable::Volume,
            ..GasState::default()
        };
        let mut store = InMemoryStore::new(state);
        let mut engine = MolecularEngine::new(SimConfig::default().with_seed(1));
        engine.initialize(recorder(), &state)?;

        let x = engine.world().unwrap().piston().track().x_for_volume(40.0);
        engine.handle_pointer(PointerMessage::DragStart, &mut store);
        engine.handle_pointer(PointerMessage::DragMove { x }, &mut store);
        assert_eq!(engine.handle_pointer(PointerMessage::DragEnd, &mut store), None);
        assert_eq!(store.snapshot(), state);
        assert_eq!(store.revision(), 0);
        Ok(())
    }

    #[test]
    fn initialize_rejects_bad_config() {
        let cfg = SimConfig {
            substeps: 0,
            ..SimConfig::default()
        };
        let mut engine = MolecularEngine::new(cfg);
        assert!(engine.initialize(recorder(), &GasState::default()).is_err());
        assert!(!engine.is_initialized());
    }
}
