//! Motion segment pipeline
//!
//! Every motion segment passes through here before it reaches the actuators:
//! the installed compensation transform (if any) adjusts the logical target
//! into machine coordinates, then the kinematics turn it into actuator
//! positions.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use std::sync::Arc;

// Internal
use crate::{
    comp_ctrl::{CompDirection, CompensationTransform, TransformSink},
    kin_ctrl::{self, ActuatorPos, CartesianPos, KinCtrl, KinCtrlError},
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Holds the kinematics and the installed compensation transform.
pub struct SegmentPipeline {
    kin_ctrl: KinCtrl,

    transform: Option<Arc<dyn CompensationTransform>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SegmentPipeline {
    /// Create a new pipeline with no compensation installed.
    pub fn new(kin_ctrl: KinCtrl) -> Self {
        Self {
            kin_ctrl,
            transform: None,
        }
    }

    /// Prepare a segment ending at the given logical target.
    ///
    /// Returns the actuator positions and the kinematics report.
    pub fn prepare_segment(
        &mut self,
        target: &CartesianPos,
    ) -> Result<(ActuatorPos, kin_ctrl::StatusReport), KinCtrlError> {
        let machine = self.machine_position(target);

        self.kin_ctrl.proc(&machine)
    }

    /// Convert a logical position into machine coordinates.
    pub fn machine_position(&self, logical: &CartesianPos) -> CartesianPos {
        let mut machine = *logical;

        if let Some(ref t) = self.transform {
            t.transform(&mut machine, CompDirection::Apply);
        }

        machine
    }

    /// Convert a machine position back into logical coordinates.
    pub fn logical_position(&self, machine: &CartesianPos) -> CartesianPos {
        let mut logical = *machine;

        if let Some(ref t) = self.transform {
            t.transform(&mut logical, CompDirection::Invert);
        }

        logical
    }

    pub fn kin_ctrl(&self) -> &KinCtrl {
        &self.kin_ctrl
    }

    pub fn kin_ctrl_mut(&mut self) -> &mut KinCtrl {
        &mut self.kin_ctrl
    }
}

impl TransformSink for SegmentPipeline {
    fn install_transform(&mut self, transform: Arc<dyn CompensationTransform>) {
        debug!("Compensation transform installed");
        self.transform = Some(transform);
    }

    fn remove_transform(&mut self) {
        if self.transform.take().is_some() {
            debug!("Compensation transform removed");
        }
    }

    fn has_transform(&self) -> bool {
        self.transform.is_some()
    }
}
