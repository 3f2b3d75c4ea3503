//! Macroscopic gas state: bounds, equations of state and the state coordinator.

pub mod bounds;
pub mod coordinator;
pub mod eos;
pub mod gas;
pub mod store;

pub use bounds::{BoundSide, Range, Variable, GAS_CONSTANT};
pub use coordinator::{
    compute_new_state, dependent_variable, ChangeRequest, CoordinatorResult, Notification,
    Rejection,
};
pub use eos::{Degradation, EquationOfState, Precision, Solution};
pub use gas::{GasState, GasType, LockedVariable, RealGas, VanDerWaals};
pub use store::{commit, GasStatePatch, InMemoryStore, StateStore};
