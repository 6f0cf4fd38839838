//! Implementations for the KinCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::{Deserialize, Serialize};

// Internal
use super::{ActuatorPos, ArmGeometry, ArmMode, CartesianPos, ClampZone, KinCtrlError, Params};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematics control module state
#[derive(Debug, Default)]
pub struct KinCtrl {
    pub(crate) geometry: ArmGeometry,

    pub(crate) arm_mode: ArmMode,

    pub(crate) report: StatusReport,
}

/// Status report for KinCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Clamping rule applied to the last target.
    pub clamp_zone: ClampZone,

    /// Arm mode after the last target.
    pub arm_mode: ArmMode,

    /// True if the last target switched the arm mode.
    pub arm_mode_changed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinCtrl {
    /// Create a new solver from the given parameters, starting in the default
    /// arm mode.
    pub fn new(params: &Params) -> Result<Self, KinCtrlError> {
        Ok(Self {
            geometry: ArmGeometry::new(params)?,
            ..Default::default()
        })
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    pub fn arm_mode(&self) -> ArmMode {
        self.arm_mode
    }

    /// Report of the last inverse kinematics evaluation.
    pub fn report(&self) -> StatusReport {
        self.report
    }
}

impl State for KinCtrl {
    type InitData = &'static str;
    type InitError = KinCtrlError;

    type InputData = CartesianPos;
    type OutputData = ActuatorPos;
    type StatusReport = StatusReport;
    type ProcError = KinCtrlError;

    /// Initialise the KinCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)?;

        self.geometry = ArmGeometry::new(&params)?;
        self.arm_mode = ArmMode::default();
        self.report = StatusReport::default();

        info!(
            "KinCtrl initialised, arms {} mm and {} mm, workspace {} mm to {} mm",
            self.geometry.arm1_length_mm(),
            self.geometry.arm2_length_mm(),
            self.geometry.min_radius_mm(),
            self.geometry.max_radius_mm()
        );

        Ok(())
    }

    /// Perform cyclic processing of KinCtrl, the inverse kinematics of one
    /// target.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let act_pos = self.cartesian_to_actuator(input_data)?;

        if self.report.clamp_zone != ClampZone::None {
            debug!(
                "KinCtrl target ({}, {}) clamped, zone {:?}",
                input_data[0], input_data[1], self.report.clamp_zone
            );
        }
        if self.report.arm_mode_changed {
            debug!("KinCtrl arm mode switched to {:?}", self.report.arm_mode);
        }

        Ok((act_pos, self.report))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_proc_reports() {
        let mut kin = KinCtrl::new(&Params::default()).unwrap();

        let (_, report) = kin.proc(&CartesianPos::new(150.0, 150.0, 0.0)).unwrap();
        assert_eq!(
            report,
            StatusReport {
                clamp_zone: ClampZone::None,
                arm_mode: ArmMode::Default,
                arm_mode_changed: false,
            }
        );

        let (_, report) = kin.proc(&CartesianPos::new(200.0, 0.0, 0.0)).unwrap();
        assert_eq!(report.arm_mode, ArmMode::Alternate);
        assert!(report.arm_mode_changed);

        let (_, report) = kin.proc(&CartesianPos::new(400.0, 0.0, 0.0)).unwrap();
        assert_eq!(report.clamp_zone, ClampZone::Outer);
        assert!(!report.arm_mode_changed);
    }

    #[test]
    fn test_proc_error_keeps_mode() {
        let mut kin = KinCtrl::new(&Params::default()).unwrap();
        kin.proc(&CartesianPos::new(200.0, 0.0, 0.0)).unwrap();
        assert_eq!(kin.arm_mode(), ArmMode::Alternate);

        assert!(matches!(
            kin.proc(&CartesianPos::new(f64::NAN, 0.0, 0.0)),
            Err(KinCtrlError::NonFinite)
        ));
        assert_eq!(kin.arm_mode(), ArmMode::Alternate);
    }
}
