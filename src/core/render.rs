//! Rendering seam between the arena and whatever draws it.

use crate::core::particle::{Particle, DIM};
use crate::core::wall::{Arena, PistonOwner};

/// Borrowed view of one frame, handed to a [`RenderTarget`] after each step.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub arena: Arena,
    pub particles: &'a [Particle],
    pub piston_x: f64,
    pub owner: PistonOwner,
    pub frame: u64,
}

impl Scene<'_> {
    /// Particle centers in draw order.
    pub fn positions(&self) -> impl Iterator<Item = [f64; DIM]> + '_ {
        self.particles.iter().map(|p| p.r)
    }
}

/// A drawing surface. The engine only starts once it has one.
pub trait RenderTarget {
    /// Fixed drawing area in px.
    fn arena(&self) -> Arena;
    fn render(&mut self, scene: &Scene<'_>);
}

/// Headless target keeping the latest frame, used for tests and bindings.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    arena: Arena,
    frames: u64,
    positions: Vec<[f64; DIM]>,
    piston_x: f64,
    owner: PistonOwner,
}

impl FrameRecorder {
    pub fn new(arena: Arena) -> Self {
        Self {
            arena,
            frames: 0,
            positions: Vec::new(),
            piston_x: arena.width,
            owner: PistonOwner::AutoTracking,
        }
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn positions(&self) -> &[[f64; DIM]] {
        &self.positions
    }

    pub fn piston_x(&self) -> f64 {
        self.piston_x
    }

    pub fn owner(&self) -> PistonOwner {
        self.owner
    }
}

impl RenderTarget for FrameRecorder {
    fn arena(&self) -> Arena {
        self.arena
    }

    fn render(&mut self, scene: &Scene<'_>) {
        self.positions.clear();
        self.positions.extend(scene.positions());
        self.piston_x = scene.piston_x;
        self.owner = scene.owner;
        self.frames += 1;
    }
}
