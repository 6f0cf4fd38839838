//! Arm mode selection
//!
//! The two arm actuators can swap the kinematic roles of inner and outer arm.
//! Swapping keeps the mechanism away from configurations that would pass
//! through a singularity. The swap is hysteretic: each threshold only ever
//! moves the mode in one direction.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{ALTERNATE_MODE_ALPHA_THRESHOLD_DEG, DEFAULT_MODE_BETA_THRESHOLD_DEG};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which physical arm plays which kinematic role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmMode {
    /// Alpha drives the inner arm, beta the outer arm.
    Default,

    /// Roles swapped: alpha takes the outer arm angle, beta the inner one.
    Alternate,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmMode {
    /// Compute the mode after a kinematics evaluation.
    ///
    /// `alpha_deg` and `beta_deg` are the actuator angles of the *default*
    /// mapping for the new target. Beta above the default threshold selects
    /// `Default`, then alpha below the alternate threshold selects
    /// `Alternate`; when both fire `Alternate` wins. Otherwise the mode is
    /// unchanged.
    pub fn next(self, alpha_deg: f64, beta_deg: f64) -> Self {
        let mut mode = self;

        if beta_deg > DEFAULT_MODE_BETA_THRESHOLD_DEG {
            mode = ArmMode::Default;
        }
        if alpha_deg < ALTERNATE_MODE_ALPHA_THRESHOLD_DEG {
            mode = ArmMode::Alternate;
        }

        mode
    }

    /// Decode the numeric arm mode option, non-zero meaning `Default`.
    pub fn from_flag(flag: f64) -> Self {
        if flag != 0.0 {
            ArmMode::Default
        } else {
            ArmMode::Alternate
        }
    }

    /// Encode as the numeric arm mode option.
    pub fn as_flag(self) -> f64 {
        match self {
            ArmMode::Default => 1.0,
            ArmMode::Alternate => 0.0,
        }
    }
}

impl Default for ArmMode {
    fn default() -> Self {
        ArmMode::Default
    }
}
