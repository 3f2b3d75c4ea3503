use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::SimConfig;
use crate::core::{Arena, FrameRecorder, MolecularEngine, PointerMessage, DIM};
use crate::state::{
    commit, compute_new_state, ChangeRequest, GasStatePatch, GasType, InMemoryStore,
    LockedVariable, RealGas, StateStore, VanDerWaals, Variable,
};

fn py_err<E: ToString>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Python-facing gas sandbox: a state store, the coordinator and the arena.
///
/// API:
/// - __new__(width, height, seed=None)
/// - state() -> dict
/// - change(variable, value) -> (success, reason_code, message)
/// - set_locked(name), set_gas(name) / set_custom_gas(a, b)
/// - step() -> kinetic energy, stop()
/// - drag_start(), drag_move(x), drag_end() -> released volume
/// - get_positions() -> np.ndarray, shape (N, 2)
#[pyclass]
pub struct GasSandbox {
    store: InMemoryStore,
    engine: MolecularEngine<FrameRecorder>,
}

#[pymethods]
impl GasSandbox {
    /// Create a sandbox at the default state with an arena of `width` x `height` px.
    ///
    /// Errors: raises ValueError when the arena cannot hold the particles.
    #[new]
    #[pyo3(signature = (width, height, seed=None))]
    fn new(width: f64, height: f64, seed: Option<u64>) -> PyResult<Self> {
        let arena = Arena::new(width, height).map_err(py_err)?;
        let config = SimConfig {
            seed,
            ..SimConfig::default()
        };
        let store = InMemoryStore::default();
        let mut engine = MolecularEngine::new(config);
        engine
            .initialize(FrameRecorder::new(arena), &store.snapshot())
            .map_err(py_err)?;
        Ok(Self { store, engine })
    }

    /// Current state as a dict with keys pressure, volume, temperature, moles, locked.
    fn state<'py>(&self, py: Python<'py>) -> PyResult<Py<PyDict>> {
        let s = self.store.snapshot();
        let out = PyDict::new(py);
        out.set_item("pressure", s.pressure)?;
        out.set_item("volume", s.volume)?;
        out.set_item("temperature", s.temperature)?;
        out.set_item("moles", s.moles)?;
        let locked = match s.locked.variable() {
            Some(v) => v.symbol(),
            None => "none",
        };
        out.set_item("locked", locked)?;
        out.set_item("gas", s.gas.to_string())?;
        Ok(out.into())
    }

    /// Request a change of `variable` ("P", "V", "T" or "n") to `value`.
    ///
    /// Returns (success, reason_code, message); reason_code is empty on success
    /// and message carries the clamp notification, if any.
    fn change(&mut self, variable: &str, value: f64) -> PyResult<(bool, String, String)> {
        let variable: Variable = variable.parse().map_err(py_err)?;
        let result = compute_new_state(&self.store.snapshot(), ChangeRequest::new(variable, value));
        commit(&mut self.store, &result);
        let message = match (result.reason(), result.notification()) {
            (Some(reason), _) => reason.to_string(),
            (None, Some(note)) => note.to_string(),
            (None, None) => String::new(),
        };
        let code = result.reason().map(|r| r.code()).unwrap_or_default();
        Ok((result.is_success(), code.to_string(), message))
    }

    /// Lock "P", "V", "T" or "none".
    fn set_locked(&mut self, name: &str) -> PyResult<()> {
        let locked: LockedVariable = name.parse().map_err(py_err)?;
        self.store.apply(GasStatePatch {
            locked: Some(locked),
            ..GasStatePatch::default()
        });
        Ok(())
    }

    /// Select "ideal" or a named real gas such as "CO2".
    fn set_gas(&mut self, name: &str) -> PyResult<()> {
        let gas = if name.trim().eq_ignore_ascii_case("ideal") {
            GasType::Ideal
        } else {
            GasType::Named(name.parse::<RealGas>().map_err(py_err)?)
        };
        self.store.apply(GasStatePatch {
            gas: Some(gas),
            ..GasStatePatch::default()
        });
        Ok(())
    }

    /// Use custom van der Waals constants (kPa·L²/mol², L/mol).
    fn set_custom_gas(&mut self, a: f64, b: f64) -> PyResult<()> {
        if !(a.is_finite() && a >= 0.0 && b.is_finite() && b >= 0.0) {
            return Err(py_err("a and b must be finite and >= 0"));
        }
        self.store.apply(GasStatePatch {
            gas: Some(GasType::Custom(VanDerWaals { a, b })),
            ..GasStatePatch::default()
        });
        Ok(())
    }

    /// Advance one frame (releases the GIL). Returns total kinetic energy.
    fn step(&mut self, py: Python<'_>) -> PyResult<f64> {
        let state = self.store.snapshot();
        let engine = &mut self.engine;
        py.detach(|| engine.step(&state))
            .map(|r| r.kinetic_energy)
            .ok_or_else(|| py_err("engine is not initialized"))
    }

    fn stop(&mut self) -> bool {
        self.engine.stop()
    }

    fn drag_start(&mut self) {
        self.engine
            .handle_pointer(PointerMessage::DragStart, &mut self.store);
    }

    fn drag_move(&mut self, x: f64) {
        self.engine
            .handle_pointer(PointerMessage::DragMove { x }, &mut self.store);
    }

    /// Release the piston; returns the committed volume, or None when no drag was
    /// active or the coordinator refused the volume.
    fn drag_end(&mut self) -> Option<f64> {
        self.engine
            .handle_pointer(PointerMessage::DragEnd, &mut self.store)
    }

    /// Piston x in px.
    fn piston_x(&self) -> Option<f64> {
        self.engine.world().map(|w| w.piston().x)
    }

    /// Return positions as a NumPy array of shape (N, 2), dtype=float64.
    fn get_positions<'py>(&self, py: Python<'py>) -> PyResult<Py<PyArray2<f64>>> {
        let particles = self
            .engine
            .world()
            .map(|w| w.particles.as_slice())
            .unwrap_or_default();
        let mut arr = Array2::<f64>::zeros((particles.len(), DIM));
        for (i, p) in particles.iter().enumerate() {
            for k in 0..DIM {
                arr[[i, k]] = p.r[k];
            }
        }
        Ok(arr.into_pyarray(py).to_owned().into())
    }
}

/// The gassandbox Python module entry point.
#[pymodule]
fn gassandbox(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<GasSandbox>()?;
    Ok(())
}
