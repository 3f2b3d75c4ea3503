//! Single-variable state changes under a locked variable.
//!
//! A change to P, V or T recomputes one dependent quantity from the equation
//! of state. If that value leaves its range it is clamped and the amount of
//! substance is re-derived to keep the state consistent. A change to n
//! recomputes the dependent quantity and fails outright if anything ends up
//! out of range, the requested amount included. P, V and T requests outside
//! their own range are rejected before any solving.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::state::bounds::{BoundSide, Range, Variable};
use crate::state::eos::{EquationOfState, Precision, Solution};
use crate::state::gas::{GasState, LockedVariable};

/// A user-originated change to exactly one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variable", content = "value", rename_all = "snake_case")]
pub enum ChangeRequest {
    Pressure(f64),
    Volume(f64),
    Temperature(f64),
    Moles(f64),
}

impl ChangeRequest {
    pub fn new(variable: Variable, value: f64) -> Self {
        match variable {
            Variable::Pressure => ChangeRequest::Pressure(value),
            Variable::Volume => ChangeRequest::Volume(value),
            Variable::Temperature => ChangeRequest::Temperature(value),
            Variable::Moles => ChangeRequest::Moles(value),
        }
    }

    pub fn variable(&self) -> Variable {
        match self {
            ChangeRequest::Pressure(_) => Variable::Pressure,
            ChangeRequest::Volume(_) => Variable::Volume,
            ChangeRequest::Temperature(_) => Variable::Temperature,
            ChangeRequest::Moles(_) => Variable::Moles,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            ChangeRequest::Pressure(v)
            | ChangeRequest::Volume(v)
            | ChangeRequest::Temperature(v)
            | ChangeRequest::Moles(v) => v,
        }
    }
}

/// Advisory attached to a success that had to adjust the amount of substance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Dependent quantity that was pinned to a bound.
    pub clamped: Variable,
    pub side: BoundSide,
    /// Value the dependent quantity was pinned to.
    pub value: f64,
    /// Re-derived amount of substance.
    pub moles: f64,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) held at its {} of {} {}; amount of substance adjusted to {:.3} mol",
            self.clamped,
            self.clamped.symbol(),
            self.side,
            self.value,
            self.clamped.unit(),
            self.moles
        )
    }
}

/// Why a change request was refused. Returned as data, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Rejection {
    #[error("requested {variable} {value} is not a finite positive number")]
    InvalidValue { variable: Variable, value: f64 },

    #[error("requested {variable} {value} {} lies outside {range}", .variable.unit())]
    RequestOutOfRange {
        variable: Variable,
        value: f64,
        range: Range,
    },

    #[error("{0} is locked and cannot be changed directly")]
    VariableLocked(Variable),

    #[error("{variable} would become {value:.3} {}, outside {range}", .variable.unit())]
    DependentOutOfRange {
        variable: Variable,
        value: f64,
        range: Range,
    },

    #[error(
        "{dependent} would become {dependent_value:.3} {} (outside {dependent_range}) and the \
         amount of substance needed to compensate, {moles:.3} mol, is outside {}",
        .dependent.unit(),
        Variable::Moles.range()
    )]
    MolesCoordinationFailed {
        dependent: Variable,
        dependent_value: f64,
        dependent_range: Range,
        moles: f64,
    },
}

impl Rejection {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::InvalidValue { .. } => "invalid-value",
            Rejection::RequestOutOfRange { .. } => "request-out-of-range",
            Rejection::VariableLocked(_) => "variable-locked",
            Rejection::DependentOutOfRange { .. } => "dependent-variable-out-of-range",
            Rejection::MolesCoordinationFailed { .. } => "moles-coordination-failed",
        }
    }
}

/// Outcome of [`compute_new_state`]. The input state is never modified; the
/// caller commits `state` on success.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorResult {
    Success {
        state: GasState,
        notification: Option<Notification>,
        precision: Precision,
    },
    Failure {
        reason: Rejection,
        notification: Option<Notification>,
    },
}

impl CoordinatorResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CoordinatorResult::Success { .. })
    }

    pub fn state(&self) -> Option<&GasState> {
        match self {
            CoordinatorResult::Success { state, .. } => Some(state),
            CoordinatorResult::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&Rejection> {
        match self {
            CoordinatorResult::Success { .. } => None,
            CoordinatorResult::Failure { reason, .. } => Some(reason),
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            CoordinatorResult::Success { notification, .. }
            | CoordinatorResult::Failure { notification, .. } => notification.as_ref(),
        }
    }

    fn fail(reason: Rejection) -> Self {
        debug!("state change rejected: {reason}");
        CoordinatorResult::Failure {
            reason,
            notification: None,
        }
    }
}

/// The quantity recomputed when `changed` is driven under `lock`.
///
/// With nothing locked, a pressure change holds volume and solves
/// temperature; volume and temperature changes hold each other's
/// complement and solve pressure.
pub fn dependent_variable(lock: LockedVariable, changed: Variable) -> Result<Variable, Rejection> {
    use Variable::*;
    match (lock, changed) {
        (_, Moles) => Ok(match lock {
            LockedVariable::Pressure => Volume,
            _ => Pressure,
        }),
        (LockedVariable::None, Pressure) => Ok(Temperature),
        (LockedVariable::None, Volume) => Ok(Pressure),
        (LockedVariable::None, Temperature) => Ok(Pressure),
        (LockedVariable::Pressure, Volume) => Ok(Temperature),
        (LockedVariable::Pressure, Temperature) => Ok(Volume),
        (LockedVariable::Volume, Pressure) => Ok(Temperature),
        (LockedVariable::Volume, Temperature) => Ok(Pressure),
        (LockedVariable::Temperature, Pressure) => Ok(Volume),
        (LockedVariable::Temperature, Volume) => Ok(Pressure),
        (LockedVariable::Pressure, Pressure)
        | (LockedVariable::Volume, Volume)
        | (LockedVariable::Temperature, Temperature) => Err(Rejection::VariableLocked(changed)),
    }
}

/// Derive a consistent state after applying `request` to `current`.
pub fn compute_new_state(current: &GasState, request: ChangeRequest) -> CoordinatorResult {
    let variable = request.variable();
    let value = request.value();
    if !value.is_finite() || value <= 0.0 {
        return CoordinatorResult::fail(Rejection::InvalidValue { variable, value });
    }
    // An amount outside its range is reported alongside the dependent
    // quantity by the moles path, which checks the whole state.
    let range = variable.range();
    if !range.contains(value) && !matches!(request, ChangeRequest::Moles(_)) {
        return CoordinatorResult::fail(Rejection::RequestOutOfRange {
            variable,
            value,
            range,
        });
    }
    let dependent = match dependent_variable(current.locked, variable) {
        Ok(d) => d,
        Err(reason) => return CoordinatorResult::fail(reason),
    };

    let eos = current.equation_of_state();
    let next = current.with(variable, value);
    match request {
        ChangeRequest::Moles(_) => change_moles(&eos, next, dependent),
        _ => coordinate(&eos, next, dependent),
    }
}

fn solve(eos: &EquationOfState, state: &GasState, dependent: Variable) -> Solution {
    let (p, v, t, n) = (state.pressure, state.volume, state.temperature, state.moles);
    match dependent {
        Variable::Pressure => eos.pressure(v, t, n),
        Variable::Volume => eos.volume(p, t, n),
        Variable::Temperature => eos.temperature(p, v, n),
        Variable::Moles => eos.moles(p, v, t),
    }
}

fn change_moles(eos: &EquationOfState, mut next: GasState, dependent: Variable) -> CoordinatorResult {
    let sol = solve(eos, &next, dependent);
    next.set(dependent, sol.value);
    if let Some(variable) = next.first_violation() {
        return CoordinatorResult::fail(Rejection::DependentOutOfRange {
            variable,
            value: next.get(variable),
            range: variable.range(),
        });
    }
    CoordinatorResult::Success {
        state: next,
        notification: None,
        precision: sol.precision,
    }
}

fn coordinate(eos: &EquationOfState, mut next: GasState, dependent: Variable) -> CoordinatorResult {
    let sol = solve(eos, &next, dependent);
    let range = dependent.range();
    let (pinned, side) = range.clamp(sol.value);
    next.set(dependent, pinned);

    let Some(side) = side else {
        return CoordinatorResult::Success {
            state: next,
            notification: None,
            precision: sol.precision,
        };
    };

    // Dependent value is infeasible: let n absorb the difference.
    let moles = solve(eos, &next, Variable::Moles);
    if !Variable::Moles.range().contains(moles.value) {
        return CoordinatorResult::fail(Rejection::MolesCoordinationFailed {
            dependent,
            dependent_value: sol.value,
            dependent_range: range,
            moles: moles.value,
        });
    }
    next.moles = moles.value;
    let notification = Notification {
        clamped: dependent,
        side,
        value: pinned,
        moles: moles.value,
    };
    debug!("{notification}");
    CoordinatorResult::Success {
        state: next,
        notification: Some(notification),
        precision: sol.precision.and(moles.precision),
    }
}
