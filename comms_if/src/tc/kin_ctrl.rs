//! # Kinematics telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use structopt::{clap::AppSettings, StructOpt};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single-letter keyed option value, such as `T150` for an arm length of
/// 150 mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionWord {
    pub key: char,
    pub value: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands handled by kinematics control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum KinCmd {
    /// Move the tool tip to a cartesian target, running the full segment
    /// pipeline (compensation then inverse kinematics).
    #[structopt(name = "move", setting = AppSettings::AllowNegativeNumbers)]
    Move {
        /// Target X.
        ///
        /// Units: millimeters
        x_mm: f64,

        /// Target Y.
        ///
        /// Units: millimeters
        y_mm: f64,

        /// Target Z.
        ///
        /// Units: millimeters
        z_mm: f64,
    },

    /// Compute the cartesian position of a set of actuator positions.
    #[structopt(name = "fwd", setting = AppSettings::AllowNegativeNumbers)]
    Fwd {
        /// Inner arm actuator angle in degrees.
        alpha_deg: f64,

        /// Outer arm actuator angle in degrees.
        beta_deg: f64,

        /// Z actuator rotation in degrees.
        gamma_deg: f64,
    },

    /// Patch the arm options, e.g. `set-opts T150 P150 A1 C128`.
    ///
    /// Keys: T arm 1 length, P arm 2 length, A default arm mode flag, C Z
    /// millimeters per rotation.
    #[structopt(name = "set-opts", setting = AppSettings::AllowNegativeNumbers)]
    SetOpts {
        #[structopt(required = true)]
        options: Vec<OptionWord>,
    },

    /// Report the current arm options.
    #[structopt(name = "get-opts")]
    GetOpts,
}

/// Errors parsing an option word.
#[derive(Debug, Error, PartialEq)]
pub enum OptionWordError {
    #[error("Option word is empty")]
    Empty,

    #[error("Option key '{0}' is not an uppercase letter")]
    InvalidKey(char),

    #[error("Option value \"{0}\" is not a number")]
    InvalidValue(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FromStr for OptionWord {
    type Err = OptionWordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();

        let key = chars.next().ok_or(OptionWordError::Empty)?;
        if !key.is_ascii_uppercase() {
            return Err(OptionWordError::InvalidKey(key));
        }

        let value_str = chars.as_str();
        let value = value_str
            .parse::<f64>()
            .map_err(|_| OptionWordError::InvalidValue(value_str.into()))?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_option_word() {
        assert_eq!(
            "T150".parse::<OptionWord>(),
            Ok(OptionWord {
                key: 'T',
                value: 150.0
            })
        );
        assert_eq!(
            "C-12.5".parse::<OptionWord>(),
            Ok(OptionWord {
                key: 'C',
                value: -12.5
            })
        );
        assert_eq!("".parse::<OptionWord>(), Err(OptionWordError::Empty));
        assert_eq!(
            "t150".parse::<OptionWord>(),
            Err(OptionWordError::InvalidKey('t'))
        );
        assert_eq!(
            "P".parse::<OptionWord>(),
            Err(OptionWordError::InvalidValue("".into()))
        );
    }
}
