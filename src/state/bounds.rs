use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Molar gas constant in L·kPa·mol⁻¹·K⁻¹ (numerically equal to J·mol⁻¹·K⁻¹).
pub const GAS_CONSTANT: f64 = 8.314;

/// Pressure range in kPa.
pub const PRESSURE: Range = Range::new(50.0, 200.0);
/// Volume range in L.
pub const VOLUME: Range = Range::new(10.0, 50.0);
/// Temperature range in K.
pub const TEMPERATURE: Range = Range::new(200.0, 400.0);
/// Amount of substance range in mol.
pub const MOLES: Range = Range::new(0.5, 3.0);

/// One of the four macroscopic quantities of a confined gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Pressure,
    Volume,
    Temperature,
    Moles,
}

impl Variable {
    pub const ALL: [Variable; 4] = [
        Variable::Pressure,
        Variable::Volume,
        Variable::Temperature,
        Variable::Moles,
    ];

    /// Short symbol used in gas-law notation.
    pub fn symbol(self) -> &'static str {
        match self {
            Variable::Pressure => "P",
            Variable::Volume => "V",
            Variable::Temperature => "T",
            Variable::Moles => "n",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Variable::Pressure => "kPa",
            Variable::Volume => "L",
            Variable::Temperature => "K",
            Variable::Moles => "mol",
        }
    }

    /// Allowed domain for this quantity.
    pub fn range(self) -> Range {
        match self {
            Variable::Pressure => PRESSURE,
            Variable::Volume => VOLUME,
            Variable::Temperature => TEMPERATURE,
            Variable::Moles => MOLES,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variable::Pressure => "pressure",
            Variable::Volume => "volume",
            Variable::Temperature => "temperature",
            Variable::Moles => "amount of substance",
        };
        f.write_str(name)
    }
}

impl FromStr for Variable {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "pressure" => Ok(Variable::Pressure),
            "v" | "volume" => Ok(Variable::Volume),
            "t" | "temperature" => Ok(Variable::Temperature),
            "n" | "moles" => Ok(Variable::Moles),
            other => Err(Error::InvalidParam(format!("unknown variable '{other}'"))),
        }
    }
}

/// Which end of a [`Range`] a clamped value was pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundSide {
    Min,
    Max,
}

impl fmt::Display for BoundSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundSide::Min => f.write_str("minimum"),
            BoundSide::Max => f.write_str("maximum"),
        }
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp `value` into the range, reporting which bound was hit (if any).
    ///
    /// Values already inside the range are returned unchanged with `None`.
    pub fn clamp(&self, value: f64) -> (f64, Option<BoundSide>) {
        if value < self.min {
            (self.min, Some(BoundSide::Min))
        } else if value > self.max {
            (self.max, Some(BoundSide::Max))
        } else {
            (value, None)
        }
    }

    /// Position of `value` within the range as a fraction in [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_inside_is_identity() {
        for var in Variable::ALL {
            let r = var.range();
            for v in [r.min, r.max, 0.5 * (r.min + r.max)] {
                assert_eq!(r.clamp(v), (v, None), "{var} at {v}");
            }
        }
    }

    #[test]
    fn clamp_reports_side() {
        assert_eq!(PRESSURE.clamp(202.65), (200.0, Some(BoundSide::Max)));
        assert_eq!(VOLUME.clamp(3.0), (10.0, Some(BoundSide::Min)));
    }

    #[test]
    fn normalize_saturates() {
        assert_eq!(TEMPERATURE.normalize(100.0), 0.0);
        assert_eq!(TEMPERATURE.normalize(300.0), 0.5);
        assert_eq!(TEMPERATURE.normalize(900.0), 1.0);
    }

    #[test]
    fn variable_parses_symbols_and_names() -> crate::error::Result<()> {
        assert_eq!("P".parse::<Variable>()?, Variable::Pressure);
        assert_eq!("volume".parse::<Variable>()?, Variable::Volume);
        assert_eq!(" n ".parse::<Variable>()?, Variable::Moles);
        assert!("x".parse::<Variable>().is_err());
        Ok(())
    }
}
