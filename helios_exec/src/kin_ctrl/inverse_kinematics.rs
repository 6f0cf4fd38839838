//! Inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinCtrl {
    /// Perform the inverse kinematics calculations.
    ///
    /// The target is first clamped into the reachable annulus (see
    /// [`clamp_to_workspace`]), then the two-link elbow problem is solved with
    /// the law of cosines. The arm mode is updated from the default mapping of
    /// the solution and the active mapping is used for the output. The Z
    /// channel is the lead screw rotation for `z` minus the outer arm angle,
    /// since the screw turns with the outer arm.
    ///
    /// On error the arm mode and status report are left unchanged.
    pub fn cartesian_to_actuator(
        &mut self,
        target: &CartesianPos,
    ) -> Result<ActuatorPos, KinCtrlError> {
        if !target.iter().all(|v| v.is_finite()) {
            return Err(KinCtrlError::NonFinite);
        }

        let (x_mm, y_mm, clamp_zone) = clamp_to_workspace(
            target[0],
            target[1],
            self.geometry.min_radius_mm(),
            self.geometry.max_radius_mm(),
        );

        let (theta_deg, psi_deg) = elbow_solution(&self.geometry, x_mm, y_mm)?;

        let prev_mode = self.arm_mode;
        self.arm_mode = prev_mode.next(theta_deg, theta_deg + psi_deg);

        let (alpha_deg, beta_deg) = match self.arm_mode {
            ArmMode::Default => (theta_deg, theta_deg + psi_deg),
            ArmMode::Alternate => (theta_deg + psi_deg, theta_deg),
        };

        let gamma_deg = (target[2] / self.geometry.z_mm_per_rotation()) * 360.0 - beta_deg;

        self.report = StatusReport {
            clamp_zone,
            arm_mode: self.arm_mode,
            arm_mode_changed: self.arm_mode != prev_mode,
        };

        Ok(ActuatorPos::new(alpha_deg, beta_deg, gamma_deg))
    }
}

/// Solve the planar elbow problem for an already clamped target.
///
/// Returns `(theta, psi)` in degrees, the inner arm angle and the elbow angle
/// of the default mapping. Only the non-negative root of the elbow sine is
/// used.
pub(crate) fn elbow_solution(
    geometry: &ArmGeometry,
    x_mm: f64,
    y_mm: f64,
) -> Result<(f64, f64), KinCtrlError> {
    let l1 = geometry.arm1_length_mm();
    let l2 = geometry.arm2_length_mm();
    let r2 = x_mm.powi(2) + y_mm.powi(2);

    let c2 = if geometry.has_equal_arms() {
        (r2 - 2.0 * l1.powi(2)) / (2.0 * l1.powi(2))
    } else {
        (r2 - l1.powi(2) - l2.powi(2)) / (2.0 * l1 * l2)
    };

    // Also catches NaN
    if !(c2.abs() < 1.0) {
        return Err(KinCtrlError::Unreachable { c2 });
    }

    let s2 = (1.0 - c2.powi(2)).sqrt();
    let k1 = l1 + l2 * c2;
    let k2 = l2 * s2;

    let theta_rad = -(x_mm.atan2(y_mm) - k1.atan2(k2));
    let psi_rad = s2.atan2(c2);

    Ok((theta_rad.to_degrees(), psi_rad.to_degrees()))
}
