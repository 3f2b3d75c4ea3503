//! Ideal-gas and van der Waals equations of state.
//!
//! Units throughout: P in kPa, V in L, T in K, n in mol, with
//! [`GAS_CONSTANT`] in L·kPa·mol⁻¹·K⁻¹, so no SI scale conversion is needed.
//!
//! van der Waals:
//! ```text
//! P = nRT / (V - n b) - a n² / V²
//! ```
//! Closed forms exist for P and T. V and n are found by Newton iteration,
//! seeded from the ideal-gas value. A solve that cannot be trusted still
//! yields a value but is marked [`Precision::Degraded`].

use log::warn;
use serde::{Deserialize, Serialize};

use crate::state::bounds::GAS_CONSTANT;
use crate::state::gas::{GasType, VanDerWaals};

/// Newton iteration budget.
pub const MAX_ITERATIONS: usize = 100;
/// Convergence threshold on the Newton step size.
pub const TOLERANCE: f64 = 1e-6;
/// Effective volume `V - n b` (L) at or below which van der Waals is abandoned
/// for the ideal-gas formula.
pub const MIN_EFFECTIVE_VOLUME: f64 = 0.1;

/// Why a solve fell short of an exact answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// Newton iteration exhausted its budget; value is the last iterate.
    NonConvergence { iterations: usize, residual: f64 },
    /// `V - n b` collapsed; value comes from the ideal-gas law instead.
    DegenerateEffectiveVolume { effective_volume: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    #[default]
    Exact,
    Degraded(Degradation),
}

impl Precision {
    pub fn is_exact(&self) -> bool {
        matches!(self, Precision::Exact)
    }

    /// Keep the first degradation seen across a chain of solves.
    pub fn and(self, other: Precision) -> Precision {
        match self {
            Precision::Exact => other,
            degraded => degraded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub value: f64,
    pub precision: Precision,
}

impl Solution {
    fn exact(value: f64) -> Self {
        Self {
            value,
            precision: Precision::Exact,
        }
    }

    fn degraded(value: f64, why: Degradation) -> Self {
        Self {
            value,
            precision: Precision::Degraded(why),
        }
    }
}

/// Ideal-gas law helpers.
pub mod ideal {
    use super::GAS_CONSTANT;

    #[inline]
    pub fn pressure(v: f64, t: f64, n: f64) -> f64 {
        n * GAS_CONSTANT * t / v
    }

    #[inline]
    pub fn volume(p: f64, t: f64, n: f64) -> f64 {
        n * GAS_CONSTANT * t / p
    }

    #[inline]
    pub fn temperature(p: f64, v: f64, n: f64) -> f64 {
        p * v / (n * GAS_CONSTANT)
    }

    #[inline]
    pub fn moles(p: f64, v: f64, t: f64) -> f64 {
        p * v / (GAS_CONSTANT * t)
    }
}

/// The equation of state active for a given gas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EquationOfState {
    Ideal,
    VanDerWaals(VanDerWaals),
}

impl EquationOfState {
    /// van der Waals unless both constants are zero.
    pub fn for_gas(gas: &GasType) -> Self {
        let params = gas.van_der_waals();
        if params.is_ideal() {
            EquationOfState::Ideal
        } else {
            EquationOfState::VanDerWaals(params)
        }
    }

    pub fn pressure(&self, v: f64, t: f64, n: f64) -> Solution {
        match *self {
            EquationOfState::Ideal => Solution::exact(ideal::pressure(v, t, n)),
            EquationOfState::VanDerWaals(p) => {
                let eff = v - n * p.b;
                if eff <= MIN_EFFECTIVE_VOLUME {
                    return degenerate(ideal::pressure(v, t, n), eff);
                }
                Solution::exact(vdw_pressure(p, v, t, n))
            }
        }
    }

    pub fn temperature(&self, pressure: f64, v: f64, n: f64) -> Solution {
        match *self {
            EquationOfState::Ideal => Solution::exact(ideal::temperature(pressure, v, n)),
            EquationOfState::VanDerWaals(p) => {
                let eff = v - n * p.b;
                if eff <= MIN_EFFECTIVE_VOLUME {
                    return degenerate(ideal::temperature(pressure, v, n), eff);
                }
                let t = (pressure + p.a * n * n / (v * v)) * eff / (n * GAS_CONSTANT);
                Solution::exact(t)
            }
        }
    }

    /// Volume from pressure. Under van der Waals this is a cubic in V, solved
    /// by Newton iteration from the ideal-gas volume.
    pub fn volume(&self, pressure: f64, t: f64, n: f64) -> Solution {
        let guess = ideal::volume(pressure, t, n);
        match *self {
            EquationOfState::Ideal => Solution::exact(guess),
            EquationOfState::VanDerWaals(p) => {
                let f = |v: f64| vdw_pressure(p, v, t, n) - pressure;
                let df = |v: f64| {
                    let eff = v - n * p.b;
                    -n * GAS_CONSTANT * t / (eff * eff) + 2.0 * p.a * n * n / (v * v * v)
                };
                newton(guess, f, df, |v| v - n * p.b, "volume")
            }
        }
    }

    /// Amount of substance from P, V and T.
    pub fn moles(&self, pressure: f64, v: f64, t: f64) -> Solution {
        let guess = ideal::moles(pressure, v, t);
        match *self {
            EquationOfState::Ideal => Solution::exact(guess),
            EquationOfState::VanDerWaals(p) => {
                let f = |n: f64| vdw_pressure(p, v, t, n) - pressure;
                let df = |n: f64| {
                    let eff = v - n * p.b;
                    GAS_CONSTANT * t * v / (eff * eff) - 2.0 * p.a * n / (v * v)
                };
                newton(guess, f, df, |n| v - n * p.b, "moles")
            }
        }
    }

    /// `|P_eos(V, T, n) - P| / P`, evaluated with the raw formula (no fallback).
    pub fn relative_residual(&self, pressure: f64, v: f64, t: f64, n: f64) -> f64 {
        let model = match *self {
            EquationOfState::Ideal => ideal::pressure(v, t, n),
            EquationOfState::VanDerWaals(p) => vdw_pressure(p, v, t, n),
        };
        ((model - pressure) / pressure).abs()
    }
}

#[inline]
fn vdw_pressure(p: VanDerWaals, v: f64, t: f64, n: f64) -> f64 {
    n * GAS_CONSTANT * t / (v - n * p.b) - p.a * n * n / (v * v)
}

fn degenerate(ideal_value: f64, effective_volume: f64) -> Solution {
    warn!(
        "effective volume {effective_volume:.4} L too small for van der Waals; using ideal-gas value {ideal_value:.4}"
    );
    Solution::degraded(
        ideal_value,
        Degradation::DegenerateEffectiveVolume { effective_volume },
    )
}

/// Newton iteration on `f(x) = 0`. `effective_volume(x)` is checked on every
/// iterate; if it collapses the ideal-gas seed is returned instead.
fn newton<F, D, E>(seed: f64, f: F, df: D, effective_volume: E, what: &str) -> Solution
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
    E: Fn(f64) -> f64,
{
    let mut x = seed;
    for iteration in 1..=MAX_ITERATIONS {
        let eff = effective_volume(x);
        if eff <= MIN_EFFECTIVE_VOLUME {
            return degenerate(seed, eff);
        }
        let slope = df(x);
        if !slope.is_finite() || slope == 0.0 {
            let residual = f(x);
            warn!("van der Waals {what} solve hit a flat derivative at iteration {iteration}");
            return Solution::degraded(
                x,
                Degradation::NonConvergence {
                    iterations: iteration,
                    residual,
                },
            );
        }
        let next = x - f(x) / slope;
        if (next - x).abs() < TOLERANCE {
            let eff = effective_volume(next);
            if eff <= MIN_EFFECTIVE_VOLUME {
                return degenerate(seed, eff);
            }
            return Solution::exact(next);
        }
        x = next;
    }
    let residual = f(x);
    warn!(
        "van der Waals {what} solve did not converge in {MAX_ITERATIONS} iterations (residual {residual:.3e}); returning best estimate {x:.6}"
    );
    Solution::degraded(
        x,
        Degradation::NonConvergence {
            iterations: MAX_ITERATIONS,
            residual,
        },
    )
}
