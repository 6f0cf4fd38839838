//! Kinematics control module
//!
//! Converts tool tip positions into actuator positions (and back) for the
//! dual-arm SCARA-class mechanism. The two arm actuators are angular
//! (degrees), the third actuator drives Z through a lead screw that also
//! rotates with the outer arm, so its demand combines the linear Z travel with
//! the outer arm angle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod actuator_pos;
mod arm_mode;
mod forward_kinematics;
mod geometry;
mod inverse_kinematics;
mod options;
mod params;
mod state;
mod workspace;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;

// Internal
pub use actuator_pos::*;
pub use arm_mode::*;
pub use geometry::*;
pub use options::*;
pub use params::*;
pub use state::*;
pub use workspace::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Outer arm angle above which the default arm mode is selected.
///
/// Units: degrees
pub const DEFAULT_MODE_BETA_THRESHOLD_DEG: f64 = 210.0;

/// Inner arm angle below which the alternate arm mode is selected.
///
/// Units: degrees
pub const ALTERNATE_MODE_ALPHA_THRESHOLD_DEG: f64 = -30.0;

/// Number of decimal places forward kinematics results are rounded to.
pub const FWD_KIN_ROUND_DP: i32 = 7;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// A tool tip position in the machine frame.
///
/// Units: millimeters
pub type CartesianPos = Vector3<f64>;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during KinCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum KinCtrlError {
    #[error("Position contains a non-finite coordinate")]
    NonFinite,

    #[error("Target is unreachable, elbow cosine {c2} is outside (-1, 1)")]
    Unreachable { c2: f64 },

    #[error("Invalid arm geometry: {0}")]
    InvalidGeometry(String),

    #[error("Could not load the kinematics parameters: {0}")]
    ParamLoad(#[from] util::params::LoadError),
}
