use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::state::bounds::Variable;
use crate::state::eos::EquationOfState;

/// van der Waals constants: `a` in kPa·L²·mol⁻², `b` in L·mol⁻¹.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VanDerWaals {
    pub a: f64,
    pub b: f64,
}

impl VanDerWaals {
    pub const fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Both constants zero: the model reduces to the ideal-gas law.
    #[inline]
    pub fn is_ideal(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }
}

/// Real gases with tabulated van der Waals constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealGas {
    CarbonDioxide,
    Nitrogen,
    Oxygen,
    Water,
    Helium,
    Argon,
    Methane,
}

impl RealGas {
    pub const ALL: [RealGas; 7] = [
        RealGas::CarbonDioxide,
        RealGas::Nitrogen,
        RealGas::Oxygen,
        RealGas::Water,
        RealGas::Helium,
        RealGas::Argon,
        RealGas::Methane,
    ];

    pub fn constants(self) -> VanDerWaals {
        match self {
            RealGas::CarbonDioxide => VanDerWaals::new(364.3, 0.0427),
            RealGas::Nitrogen => VanDerWaals::new(137.0, 0.0387),
            RealGas::Oxygen => VanDerWaals::new(138.2, 0.0319),
            RealGas::Water => VanDerWaals::new(553.6, 0.0305),
            RealGas::Helium => VanDerWaals::new(3.46, 0.0238),
            RealGas::Argon => VanDerWaals::new(135.5, 0.0320),
            RealGas::Methane => VanDerWaals::new(228.3, 0.0428),
        }
    }

    pub fn formula(self) -> &'static str {
        match self {
            RealGas::CarbonDioxide => "CO2",
            RealGas::Nitrogen => "N2",
            RealGas::Oxygen => "O2",
            RealGas::Water => "H2O",
            RealGas::Helium => "He",
            RealGas::Argon => "Ar",
            RealGas::Methane => "CH4",
        }
    }
}

impl FromStr for RealGas {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        RealGas::ALL
            .into_iter()
            .find(|g| g.formula().eq_ignore_ascii_case(key))
            .ok_or_else(|| Error::InvalidParam(format!("unknown gas '{key}'")))
    }
}

/// Gas model selecting the equation of state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasType {
    #[default]
    Ideal,
    Named(RealGas),
    Custom(VanDerWaals),
}

impl GasType {
    pub fn van_der_waals(&self) -> VanDerWaals {
        match self {
            GasType::Ideal => VanDerWaals::new(0.0, 0.0),
            GasType::Named(gas) => gas.constants(),
            GasType::Custom(params) => *params,
        }
    }
}

impl fmt::Display for GasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GasType::Ideal => f.write_str("ideal gas"),
            GasType::Named(gas) => f.write_str(gas.formula()),
            GasType::Custom(p) => write!(f, "custom (a={}, b={})", p.a, p.b),
        }
    }
}

/// The quantity held constant by user choice. Only P, V or T can be locked,
/// and at most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockedVariable {
    #[default]
    None,
    Pressure,
    Volume,
    Temperature,
}

impl LockedVariable {
    pub fn variable(self) -> Option<Variable> {
        match self {
            LockedVariable::None => None,
            LockedVariable::Pressure => Some(Variable::Pressure),
            LockedVariable::Volume => Some(Variable::Volume),
            LockedVariable::Temperature => Some(Variable::Temperature),
        }
    }
}

impl FromStr for LockedVariable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        if key.is_empty() || key == "none" {
            return Ok(LockedVariable::None);
        }
        match key.parse::<Variable>()? {
            Variable::Pressure => Ok(LockedVariable::Pressure),
            Variable::Volume => Ok(LockedVariable::Volume),
            Variable::Temperature => Ok(LockedVariable::Temperature),
            Variable::Moles => Err(Error::InvalidParam(
                "amount of substance cannot be locked".into(),
            )),
        }
    }
}

/// Macroscopic state of the confined gas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasState {
    /// kPa
    pub pressure: f64,
    /// L
    pub volume: f64,
    /// K
    pub temperature: f64,
    /// mol
    pub moles: f64,
    pub gas: GasType,
    pub locked: LockedVariable,
}

impl Default for GasState {
    /// One mole of ideal gas at standard temperature and pressure.
    fn default() -> Self {
        Self {
            pressure: 101.325,
            volume: 22.4,
            temperature: 273.15,
            moles: 1.0,
            gas: GasType::Ideal,
            locked: LockedVariable::None,
        }
    }
}

impl GasState {
    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Pressure => self.pressure,
            Variable::Volume => self.volume,
            Variable::Temperature => self.temperature,
            Variable::Moles => self.moles,
        }
    }

    pub fn set(&mut self, variable: Variable, value: f64) {
        match variable {
            Variable::Pressure => self.pressure = value,
            Variable::Volume => self.volume = value,
            Variable::Temperature => self.temperature = value,
            Variable::Moles => self.moles = value,
        }
    }

    /// Copy of this state with one quantity replaced.
    pub fn with(mut self, variable: Variable, value: f64) -> Self {
        self.set(variable, value);
        self
    }

    pub fn equation_of_state(&self) -> EquationOfState {
        EquationOfState::for_gas(&self.gas)
    }

    /// First quantity (in P, V, T, n order) lying outside its allowed range.
    pub fn first_violation(&self) -> Option<Variable> {
        Variable::ALL
            .into_iter()
            .find(|&v| !v.range().contains(self.get(v)))
    }

    pub fn is_within_bounds(&self) -> bool {
        self.first_violation().is_none()
    }

    /// Relative pressure mismatch between this state and its equation of state.
    pub fn relative_residual(&self) -> f64 {
        self.equation_of_state()
            .relative_residual(self.pressure, self.volume, self.temperature, self.moles)
    }
}
