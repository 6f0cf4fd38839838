//! Collaborator interfaces
//!
//! The compensation controller drives hardware it does not own: the motion
//! queue, the probe and the position readback. It also installs its
//! transform into a pipeline owned by someone else. These traits are the
//! seams to those collaborators.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use super::CompensationTransform;
use crate::kin_ctrl::CartesianPos;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors from a single probe move.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProbeDriveError {
    #[error("Probe did not trigger within {max_travel_mm} mm")]
    NotTriggered { max_travel_mm: f64 },

    #[error("Probe move timed out")]
    Timeout,

    #[error("Probe fault: {0}")]
    Fault(String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The queue of planned motion.
pub trait MotionQueue {
    /// Block until every queued move has completed.
    fn wait_for_idle(&mut self);
}

/// The physical Z probe.
pub trait ProbeDrive {
    /// Move the probe towards the bed until it triggers.
    ///
    /// Returns the deflection distance travelled.
    ///
    /// Units: millimeters
    fn run_probe(
        &mut self,
        max_travel_mm: f64,
        feed_rate_mm_min: f64,
        reverse: bool,
    ) -> Result<f64, ProbeDriveError>;

    /// Height of the probe trigger point above the tool tip.
    ///
    /// Units: millimeters
    fn probe_height(&self) -> f64;
}

/// Readback of the current machine position.
pub trait PositionSource {
    fn current_machine_position(&self) -> CartesianPos;
}

/// Everything the probe sequence needs from the machine.
pub trait ProbeHost: MotionQueue + ProbeDrive + PositionSource {}

impl<T: MotionQueue + ProbeDrive + PositionSource + ?Sized> ProbeHost for T {}

/// The installation point of the compensation transform.
pub trait TransformSink {
    /// Install a transform, replacing any existing one.
    fn install_transform(&mut self, transform: Arc<dyn CompensationTransform>);

    /// Remove the installed transform if there is one.
    fn remove_transform(&mut self);

    fn has_transform(&self) -> bool;
}
