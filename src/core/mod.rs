//! The particle arena: particles, walls and the piston, contact handling,
//! diagnostics and the engine facade that drives it frame by frame.

pub mod boundary;
pub mod collision;
pub mod energy;
pub mod engine;
pub mod event;
pub mod particle;
pub mod render;
pub mod thermal;
pub mod wall;
pub mod world;

pub use energy::{EnergyAnomaly, EnergyMonitor};
pub use engine::MolecularEngine;
pub use event::{Contact, ContactKind};
pub use particle::{Particle, DIM};
pub use render::{FrameRecorder, RenderTarget, Scene};
pub use wall::{Arena, Piston, PistonOwner, PistonTrack, PointerMessage, WallId};
pub use world::{SimulationWorld, StepReport};
