//! Actuator position structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Positions of the three actuators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorPos {
    /// Inner arm actuator angle.
    ///
    /// Units: degrees
    pub alpha_deg: f64,

    /// Outer arm actuator angle.
    ///
    /// Units: degrees
    pub beta_deg: f64,

    /// Z actuator rotation, the linear Z travel expressed in lead screw
    /// rotation minus the outer arm angle.
    ///
    /// Units: degrees
    pub gamma_deg: f64,
}

impl ActuatorPos {
    pub fn new(alpha_deg: f64, beta_deg: f64, gamma_deg: f64) -> Self {
        Self {
            alpha_deg,
            beta_deg,
            gamma_deg,
        }
    }

    /// True if all three actuator values are finite.
    pub fn is_finite(&self) -> bool {
        self.alpha_deg.is_finite() && self.beta_deg.is_finite() && self.gamma_deg.is_finite()
    }
}
