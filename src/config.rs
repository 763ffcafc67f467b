//! Gain and coefficient records for configuring the controllers.
//!
//! Loading these from storage or a host link is up to the caller; the records
//! derive `serde` so any format will do. Validation happens once, when a
//! record is turned into a controller, never on the control path.

#[cfg(feature = "defmt")]
use defmt::Format;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    filter::LowPassFirstOrder,
    pid::{PIController, PIDController},
};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum ConfigError {
    #[error("output limits are inverted (min {min} > max {max})")]
    InvertedLimits { min: f32, max: f32 },
    #[error("{0} is not a finite number")]
    NonFinite(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct PiGains {
    pub k_p: f32,
    pub k_i: f32,
    pub out_min: f32,
    pub out_max: f32,
}

impl PiGains {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite(self.k_p, "k_p")?;
        check_finite(self.k_i, "k_i")?;
        check_limits(self.out_min, self.out_max)
    }
}

/// Coefficients of a first order filter, `y[n] = b0*x[n] + b1*x[n-1] - a1*y[n-1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct FirstOrderCoefficients {
    pub a1: f32,
    pub b0: f32,
    pub b1: f32,
}

impl FirstOrderCoefficients {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite(self.a1, "a1")?;
        check_finite(self.b0, "b0")?;
        check_finite(self.b1, "b1")
    }
}

impl Default for FirstOrderCoefficients {
    /// A pass-through filter.
    fn default() -> Self {
        Self {
            a1: 0.0,
            b0: 1.0,
            b1: 0.0,
        }
    }
}

impl From<FirstOrderCoefficients> for LowPassFirstOrder {
    fn from(value: FirstOrderCoefficients) -> Self {
        LowPassFirstOrder::new(value.a1, value.b0, value.b1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct PidGains {
    pub k_p: f32,
    pub k_i: f32,
    pub k_d: f32,
    pub out_min: f32,
    pub out_max: f32,
    #[serde(default)]
    pub derivative_filter: FirstOrderCoefficients,
}

impl PidGains {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite(self.k_p, "k_p")?;
        check_finite(self.k_i, "k_i")?;
        check_finite(self.k_d, "k_d")?;
        self.derivative_filter.validate()?;
        check_limits(self.out_min, self.out_max)
    }
}

/// Gains of the d and q axis current controllers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct CurrentLoopConfig {
    pub id: PiGains,
    pub iq: PiGains,
}

impl CurrentLoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.id.validate()?;
        self.iq.validate()
    }
}

impl TryFrom<PiGains> for PIController {
    type Error = ConfigError;

    fn try_from(gains: PiGains) -> Result<Self, Self::Error> {
        if let Err(err) = gains.validate() {
            log::warn!("rejecting PI gains {:?}: {}", gains, err);
            return Err(err);
        }
        Ok(PIController::new(
            gains.k_p,
            gains.k_i,
            gains.out_min,
            gains.out_max,
        ))
    }
}

impl TryFrom<PidGains> for PIDController {
    type Error = ConfigError;

    fn try_from(gains: PidGains) -> Result<Self, Self::Error> {
        if let Err(err) = gains.validate() {
            log::warn!("rejecting PID gains {:?}: {}", gains, err);
            return Err(err);
        }
        let mut controller = PIDController::new(
            gains.k_p,
            gains.k_i,
            gains.k_d,
            gains.out_min,
            gains.out_max,
        );
        let FirstOrderCoefficients { a1, b0, b1 } = gains.derivative_filter;
        controller.set_derivative_filter(a1, b0, b1, 0.0, 0.0);
        Ok(controller)
    }
}

fn check_finite(value: f32, name: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite(name))
    }
}

fn check_limits(min: f32, max: f32) -> Result<(), ConfigError> {
    check_finite(min, "out_min")?;
    check_finite(max, "out_max")?;
    if min > max {
        return Err(ConfigError::InvertedLimits { min, max });
    }
    Ok(())
}
