//! Arm geometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{KinCtrlError, Params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Validated arm geometry.
///
/// The only way to build one is from a [`Params`] through
/// [`ArmGeometry::new`], so every instance satisfies:
///
/// - all values finite,
/// - arm lengths and Z lead strictly positive,
/// - `0 < min_radius < max_radius`,
/// - the annulus `[min_radius, max_radius]` is reachable by the arms, i.e.
///   `|arm1 - arm2| < min_radius` and `max_radius < arm1 + arm2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArmGeometry {
    arm1_length_mm: f64,
    arm2_length_mm: f64,
    z_mm_per_rotation: f64,
    min_radius_mm: f64,
    max_radius_mm: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmGeometry {
    /// Build and validate a geometry from parameters.
    pub fn new(params: &Params) -> Result<Self, KinCtrlError> {
        let geom = Self {
            arm1_length_mm: params.arm1_length_mm,
            arm2_length_mm: params.arm2_length_mm,
            z_mm_per_rotation: params.z_mm_per_rotation,
            min_radius_mm: params.min_radius_mm,
            max_radius_mm: params.max_radius_mm,
        };

        geom.validate()?;

        Ok(geom)
    }

    /// Convert back into parameters, for patching.
    pub fn to_params(&self) -> Params {
        Params {
            arm1_length_mm: self.arm1_length_mm,
            arm2_length_mm: self.arm2_length_mm,
            z_mm_per_rotation: self.z_mm_per_rotation,
            min_radius_mm: self.min_radius_mm,
            max_radius_mm: self.max_radius_mm,
        }
    }

    pub fn arm1_length_mm(&self) -> f64 {
        self.arm1_length_mm
    }

    pub fn arm2_length_mm(&self) -> f64 {
        self.arm2_length_mm
    }

    pub fn z_mm_per_rotation(&self) -> f64 {
        self.z_mm_per_rotation
    }

    pub fn min_radius_mm(&self) -> f64 {
        self.min_radius_mm
    }

    pub fn max_radius_mm(&self) -> f64 {
        self.max_radius_mm
    }

    /// True if both arms have the same length, in which case the symmetric
    /// form of the law of cosines is used.
    pub fn has_equal_arms(&self) -> bool {
        self.arm1_length_mm == self.arm2_length_mm
    }

    fn validate(&self) -> Result<(), KinCtrlError> {
        let values = [
            ("arm1_length_mm", self.arm1_length_mm),
            ("arm2_length_mm", self.arm2_length_mm),
            ("z_mm_per_rotation", self.z_mm_per_rotation),
            ("min_radius_mm", self.min_radius_mm),
            ("max_radius_mm", self.max_radius_mm),
        ];

        for (name, value) in values.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(KinCtrlError::InvalidGeometry(format!(
                    "{} must be finite and positive, found {}",
                    name, value
                )));
            }
        }

        if self.min_radius_mm >= self.max_radius_mm {
            return Err(KinCtrlError::InvalidGeometry(format!(
                "min_radius_mm ({}) must be less than max_radius_mm ({})",
                self.min_radius_mm, self.max_radius_mm
            )));
        }

        let reach_mm = self.arm1_length_mm + self.arm2_length_mm;
        if self.max_radius_mm >= reach_mm {
            return Err(KinCtrlError::InvalidGeometry(format!(
                "max_radius_mm ({}) must be less than the total arm reach ({})",
                self.max_radius_mm, reach_mm
            )));
        }

        let fold_mm = (self.arm1_length_mm - self.arm2_length_mm).abs();
        if self.min_radius_mm <= fold_mm {
            return Err(KinCtrlError::InvalidGeometry(format!(
                "min_radius_mm ({}) must be greater than the folded arm radius ({})",
                self.min_radius_mm, fold_mm
            )));
        }

        Ok(())
    }
}

impl Default for ArmGeometry {
    fn default() -> Self {
        let p = Params::default();

        Self {
            arm1_length_mm: p.arm1_length_mm,
            arm2_length_mm: p.arm2_length_mm,
            z_mm_per_rotation: p.z_mm_per_rotation,
            min_radius_mm: p.min_radius_mm,
            max_radius_mm: p.max_radius_mm,
        }
    }
}
