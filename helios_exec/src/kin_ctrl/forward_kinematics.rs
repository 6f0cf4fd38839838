//! Forward kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;
use util::maths::round_dp;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinCtrl {
    /// Compute the tool tip position for the given actuator positions.
    ///
    /// The result does not depend on the arm mode, the actuator angles are
    /// interpreted as given. Each coordinate is rounded to
    /// [`FWD_KIN_ROUND_DP`] decimal places.
    pub fn actuator_to_cartesian(&self, act_pos: &ActuatorPos) -> Result<CartesianPos, KinCtrlError> {
        if !act_pos.is_finite() {
            return Err(KinCtrlError::NonFinite);
        }

        let l1 = self.geometry.arm1_length_mm();
        let l2 = self.geometry.arm2_length_mm();
        let alpha_rad = act_pos.alpha_deg.to_radians();
        let beta_rad = act_pos.beta_deg.to_radians();

        let x_mm = alpha_rad.cos() * l1 + beta_rad.cos() * l2;
        let y_mm = alpha_rad.sin() * l1 + beta_rad.sin() * l2;
        let z_mm =
            (act_pos.gamma_deg + act_pos.beta_deg) / 360.0 * self.geometry.z_mm_per_rotation();

        Ok(CartesianPos::new(
            round_dp(x_mm, FWD_KIN_ROUND_DP),
            round_dp(y_mm, FWD_KIN_ROUND_DP),
            round_dp(z_mm, FWD_KIN_ROUND_DP),
        ))
    }
}
