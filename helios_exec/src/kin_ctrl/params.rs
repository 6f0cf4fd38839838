//! Parameters structure for KinCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for kinematics control.
///
/// Any field missing from the parameter file takes its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Length of the inner arm, hinge to hinge.
    ///
    /// Units: millimeters
    pub arm1_length_mm: f64,

    /// Length of the outer arm, hinge to tool tip.
    ///
    /// Units: millimeters
    pub arm2_length_mm: f64,

    /// Z travel for one full rotation of the Z actuator.
    ///
    /// Units: millimeters/rotation
    pub z_mm_per_rotation: f64,

    // ---- WORKSPACE ----
    /// Radius inside which the arms would fold onto the tower.
    ///
    /// Units: millimeters
    pub min_radius_mm: f64,

    /// Radius beyond which the arms would be fully extended.
    ///
    /// Units: millimeters
    pub max_radius_mm: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            arm1_length_mm: 150.0,
            arm2_length_mm: 150.0,
            z_mm_per_rotation: 128.0,
            min_radius_mm: 115.0,
            max_radius_mm: 299.99,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params_file() {
        let p: Params = util::params::from_str(
            "arm1_length_mm = 160.0\n\
             max_radius_mm = 250.0",
        )
        .unwrap();

        assert_eq!(p.arm1_length_mm, 160.0);
        assert_eq!(p.max_radius_mm, 250.0);
        assert_eq!(p.arm2_length_mm, 150.0);
        assert_eq!(p.z_mm_per_rotation, 128.0);
        assert_eq!(p.min_radius_mm, 115.0);
    }
}
