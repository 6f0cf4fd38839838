//! Workspace clamping
//!
//! The arms cannot bring the tool tip closer than `min_radius` to the tower
//! (they would fold through the singular retracted configuration) nor further
//! than `max_radius` (fully extended). Targets outside that annulus are moved
//! onto its boundary before the inverse kinematics run, in a way which keeps
//! motion continuous as the target sweeps across the forbidden regions.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which clamping rule was applied to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClampZone {
    /// Target was already inside the workspace.
    None,

    /// Target was inside `min_radius` in front of the tower (`y >= 0`) and
    /// was moved onto the inner arc.
    InnerFront,

    /// Target was behind the tower (`y < 0`) and within `min_radius` of it,
    /// either radially or sideways, and was moved onto the inner arc or onto
    /// the straight sides at `x = ±min_radius`.
    InnerRear,

    /// Target was beyond `max_radius` and was pulled radially onto it.
    Outer,
}

impl Default for ClampZone {
    fn default() -> Self {
        ClampZone::None
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a planar target into the reachable annulus.
///
/// Returns the clamped `(x, y)` and the zone rule that was applied.
///
/// In front of the tower the target is moved onto the inner arc at an angle
/// proportional to how far across the arc's chord it lies. Behind the tower
/// the region between `x = ±min_radius` is unreachable; targets there are
/// mapped onto a path that follows the inner arc and then runs straight down
/// the sides, by the fraction of that path's length proportional to `x`.
pub fn clamp_to_workspace(
    x_mm: f64,
    y_mm: f64,
    min_radius_mm: f64,
    max_radius_mm: f64,
) -> (f64, f64, ClampZone) {
    let r_mm = x_mm.hypot(y_mm);

    // Quarter circumference of the inner circle
    let arc_length_mm = FRAC_PI_2 * min_radius_mm;

    if r_mm < min_radius_mm && y_mm >= 0.0 {
        // Half-width of the inner circle at this y, always > |x| here
        let x_max_mm = (min_radius_mm.powi(2) - y_mm.powi(2)).sqrt();
        let arc_rad = FRAC_PI_2 - y_mm.atan2(x_max_mm);
        let prop_arc_rad = arc_rad * (x_mm / x_max_mm);

        (
            min_radius_mm * (FRAC_PI_2 - prop_arc_rad).cos(),
            min_radius_mm * (FRAC_PI_2 - prop_arc_rad).sin(),
            ClampZone::InnerFront,
        )
    } else if (r_mm < min_radius_mm || x_mm.abs() < min_radius_mm) && y_mm < 0.0 {
        let path_length_mm = -y_mm + arc_length_mm;
        let sub_length_mm = (x_mm / min_radius_mm) * path_length_mm;

        if sub_length_mm.abs() > arc_length_mm {
            // On the straight part of the path
            let (x_mm, y_mm) = (
                min_radius_mm.copysign(x_mm),
                arc_length_mm - sub_length_mm.abs(),
            );

            // Far behind the tower the straight part leaves the annulus
            let r_mm = x_mm.hypot(y_mm);
            if r_mm > max_radius_mm {
                let scale = max_radius_mm / r_mm;
                (x_mm * scale, y_mm * scale, ClampZone::InnerRear)
            } else {
                (x_mm, y_mm, ClampZone::InnerRear)
            }
        } else {
            let angle_rad = FRAC_PI_2 * (1.0 - sub_length_mm / arc_length_mm);

            (
                min_radius_mm * angle_rad.cos(),
                min_radius_mm * angle_rad.sin(),
                ClampZone::InnerRear,
            )
        }
    } else if r_mm > max_radius_mm {
        let scale = max_radius_mm / r_mm;

        (x_mm * scale, y_mm * scale, ClampZone::Outer)
    } else {
        (x_mm, y_mm, ClampZone::None)
    }
}
