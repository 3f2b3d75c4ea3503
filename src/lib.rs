//! Gas-state sandbox.
//!
//! Two cooperating parts:
//! - [`state`]: the macroscopic state (P, V, T, n), ideal and van der Waals
//!   equations of state, and the coordinator that turns a requested change
//!   into a new consistent state or a rejection.
//! - [`core`]: a 2D particle arena whose right wall is a piston tracking the
//!   volume, driven one frame at a time by [`core::MolecularEngine`].
//!
//! Python bindings are available behind the `python` feature.

pub mod config;
pub mod core;
pub mod error;
pub mod state;

#[cfg(feature = "python")]
mod python;

pub use config::{SimConfig, PARTICLES_PER_MOLE};
pub use error::{Error, Result};
