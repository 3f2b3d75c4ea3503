use serde::{Deserialize, Serialize};

use crate::state::coordinator::CoordinatorResult;
use crate::state::gas::{GasState, GasType, LockedVariable};

/// Partial update to a [`GasState`]; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GasStatePatch {
    pub pressure: Option<f64>,
    pub volume: Option<f64>,
    pub temperature: Option<f64>,
    pub moles: Option<f64>,
    pub gas: Option<GasType>,
    pub locked: Option<LockedVariable>,
}

impl GasStatePatch {
    pub fn volume(volume: f64) -> Self {
        Self {
            volume: Some(volume),
            ..Self::default()
        }
    }

    /// Patch overwriting every field with `state`.
    pub fn full(state: &GasState) -> Self {
        Self {
            pressure: Some(state.pressure),
            volume: Some(state.volume),
            temperature: Some(state.temperature),
            moles: Some(state.moles),
            gas: Some(state.gas),
            locked: Some(state.locked),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, state: &mut GasState) {
        if let Some(p) = self.pressure {
            state.pressure = p;
        }
        if let Some(v) = self.volume {
            state.volume = v;
        }
        if let Some(t) = self.temperature {
            state.temperature = t;
        }
        if let Some(n) = self.moles {
            state.moles = n;
        }
        if let Some(gas) = self.gas {
            state.gas = gas;
        }
        if let Some(locked) = self.locked {
            state.locked = locked;
        }
    }
}

/// Application state store holding the authoritative [`GasState`].
pub trait StateStore {
    /// Current state snapshot.
    fn snapshot(&self) -> GasState;
    /// Merge a partial update.
    fn apply(&mut self, patch: GasStatePatch);
}

/// Store backed by a single owned value, with a revision counter bumped on
/// every non-empty patch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: GasState,
    revision: u64,
}

impl InMemoryStore {
    pub fn new(state: GasState) -> Self {
        Self { state, revision: 0 }
    }

    pub fn state(&self) -> &GasState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl StateStore for InMemoryStore {
    fn snapshot(&self) -> GasState {
        self.state
    }

    fn apply(&mut self, patch: GasStatePatch) {
        if patch.is_empty() {
            return;
        }
        patch.apply_to(&mut self.state);
        self.revision += 1;
    }
}

/// Commit a successful coordinator result; failures leave the store as is.
/// Returns whether anything was written.
pub fn commit<S: StateStore + ?Sized>(store: &mut S, result: &CoordinatorResult) -> bool {
    match result.state() {
        Some(state) => {
            store.apply(GasStatePatch::full(state));
            true
        }
        None => false,
    }
}
