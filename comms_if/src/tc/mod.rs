//! # Telecommand module
//!
//! A telecommand is one instruction to the motion software. Telecommands can
//! be written as a single line of text (`comp probe --samples 3`), which is
//! how scripts and the interactive prompt provide them, or as JSON.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod comp_ctrl;
pub mod kin_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use structopt::StructOpt;
use thiserror::Error;

// Internal
use comp_ctrl::CompCmd;
use kin_ctrl::KinCmd;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Program name used as the first argument when parsing a line.
const TC_PROG_NAME: &str = "helios";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, routed by the executable to the module named by its
/// variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(name = "helios")]
pub enum Tc {
    /// Kinematics commands
    #[structopt(name = "kin")]
    Kin(KinCmd),

    /// Height compensation commands
    #[structopt(name = "comp")]
    Comp(CompCmd),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC line is empty")]
    EmptyLine,

    #[error("TC line is invalid: {0}")]
    InvalidLine(structopt::clap::Error),

    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a TC from a whitespace separated line of text.
    pub fn from_line(line: &str) -> Result<Self, TcParseError> {
        if line.trim().is_empty() {
            return Err(TcParseError::EmptyLine);
        }

        Tc::from_iter_safe(std::iter::once(TC_PROG_NAME).chain(line.split_whitespace()))
            .map_err(TcParseError::InvalidLine)
    }

    /// Parse a TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }

    /// Serialize the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use kin_ctrl::OptionWord;

    #[test]
    fn test_from_line() {
        assert_eq!(
            Tc::from_line("kin move 100 -50.5 2").unwrap(),
            Tc::Kin(KinCmd::Move {
                x_mm: 100.0,
                y_mm: -50.5,
                z_mm: 2.0
            })
        );

        assert_eq!(
            Tc::from_line("kin set-opts T150 P149.5").unwrap(),
            Tc::Kin(KinCmd::SetOpts {
                options: vec![
                    OptionWord {
                        key: 'T',
                        value: 150.0
                    },
                    OptionWord {
                        key: 'P',
                        value: 149.5
                    },
                ]
            })
        );

        assert_eq!(
            Tc::from_line("comp probe --samples 3").unwrap(),
            Tc::Comp(CompCmd::Probe {
                samples: 3,
                max_travel_mm: None,
                feed_rate_mm_min: None,
            })
        );

        assert_eq!(Tc::from_line("comp clear").unwrap(), Tc::Comp(CompCmd::Clear));
        assert_eq!(
            Tc::from_line("  comp   identity ").unwrap(),
            Tc::Comp(CompCmd::Identity)
        );
    }

    #[test]
    fn test_from_line_errors() {
        assert!(matches!(Tc::from_line(""), Err(TcParseError::EmptyLine)));
        assert!(matches!(
            Tc::from_line("kin jump 1 2 3"),
            Err(TcParseError::InvalidLine(_))
        ));
        assert!(matches!(
            Tc::from_line("kin set-opts 150"),
            Err(TcParseError::InvalidLine(_))
        ));
    }

    #[test]
    fn test_json() {
        let tc = Tc::Comp(CompCmd::Query {
            x_mm: -10.0,
            y_mm: 20.0,
        });

        let json = tc.to_json().unwrap();
        assert_eq!(Tc::from_json(&json).unwrap(), tc);

        assert!(matches!(
            Tc::from_json("{\"Kin\": 3}"),
            Err(TcParseError::InvalidJson(_))
        ));
    }
}
