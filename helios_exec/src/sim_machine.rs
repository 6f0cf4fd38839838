//! # Simulated machine
//!
//! Stands in for the motion queue, probe and position readback of a real
//! machine. The bed is a tilted plane, the probe triggers when it touches it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    comp_ctrl::{MotionQueue, PositionSource, ProbeDrive, ProbeDriveError},
    kin_ctrl::CartesianPos,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Height of the bed at the origin.
    ///
    /// Units: millimeters
    pub bed_z0_mm: f64,

    /// Bed height change per millimeter of X.
    pub bed_slope_x: f64,

    /// Bed height change per millimeter of Y.
    pub bed_slope_y: f64,

    /// Height of the probe trigger point above the tool tip.
    ///
    /// Units: millimeters
    pub probe_height_mm: f64,

    /// Initial head position in machine coordinates.
    ///
    /// Units: millimeters
    pub start_position_mm: [f64; 3],

    /// If set, every probe after this many successful probes faults.
    pub fail_after_probes: Option<usize>,
}

/// The simulated machine.
#[derive(Debug, Clone)]
pub struct SimMachine {
    params: SimParams,

    position_mm: CartesianPos,

    num_probes: usize,

    /// Number of times the motion queue was waited on.
    pub idle_waits: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimMachine {
    pub fn new(params: &SimParams) -> Self {
        let [x, y, z] = params.start_position_mm;

        Self {
            params: params.clone(),
            position_mm: CartesianPos::new(x, y, z),
            num_probes: 0,
            idle_waits: 0,
        }
    }

    /// Move the head to the given machine position.
    pub fn move_to(&mut self, position_mm: CartesianPos) {
        self.position_mm = position_mm;
    }

    /// Height of the bed at the given position.
    pub fn bed_height_mm(&self, x_mm: f64, y_mm: f64) -> f64 {
        self.params.bed_z0_mm + self.params.bed_slope_x * x_mm + self.params.bed_slope_y * y_mm
    }

    /// Make every probe after `num_probes` more successful ones fault.
    pub fn fail_after(&mut self, num_probes: Option<usize>) {
        self.params.fail_after_probes = num_probes.map(|n| self.num_probes + n);
    }

    pub fn num_probes(&self) -> usize {
        self.num_probes
    }
}

impl MotionQueue for SimMachine {
    fn wait_for_idle(&mut self) {
        // Moves complete instantly
        self.idle_waits += 1;
    }
}

impl PositionSource for SimMachine {
    fn current_machine_position(&self) -> CartesianPos {
        self.position_mm
    }
}

impl ProbeDrive for SimMachine {
    fn run_probe(
        &mut self,
        max_travel_mm: f64,
        feed_rate_mm_min: f64,
        reverse: bool,
    ) -> Result<f64, ProbeDriveError> {
        if let Some(n) = self.params.fail_after_probes {
            if self.num_probes >= n {
                warn!("Simulated probe fault injected after {} probes", n);
                return Err(ProbeDriveError::Fault("injected fault".into()));
            }
        }

        if reverse {
            return Err(ProbeDriveError::Fault(
                "reverse probing is not simulated".into(),
            ));
        }

        let bed_mm = self.bed_height_mm(self.position_mm[0], self.position_mm[1]);
        let deflection_mm = self.position_mm[2] - self.params.probe_height_mm - bed_mm;

        if deflection_mm < 0.0 {
            return Err(ProbeDriveError::Fault(format!(
                "probe already {:.3} mm below the bed",
                -deflection_mm
            )));
        }
        if deflection_mm > max_travel_mm {
            return Err(ProbeDriveError::NotTriggered { max_travel_mm });
        }

        self.num_probes += 1;

        debug!(
            "Simulated probe at {:.3} mm/min triggered after {:.3} mm",
            feed_rate_mm_min, deflection_mm
        );

        Ok(deflection_mm)
    }

    fn probe_height(&self) -> f64 {
        self.params.probe_height_mm
    }
}

impl SimParams {
    /// Check every value is finite and the probe height is not negative.
    pub fn validate(&self) -> Result<(), String> {
        let finite = [self.bed_z0_mm, self.bed_slope_x, self.bed_slope_y, self.probe_height_mm]
            .iter()
            .chain(self.start_position_mm.iter())
            .all(|v| v.is_finite());

        if !finite {
            return Err("all simulation parameters must be finite".into());
        }
        if self.probe_height_mm < 0.0 {
            return Err(format!(
                "probe_height_mm must not be negative, found {}",
                self.probe_height_mm
            ));
        }

        Ok(())
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            bed_z0_mm: 0.0,
            bed_slope_x: 0.0,
            bed_slope_y: 0.0,
            probe_height_mm: 5.0,
            start_position_mm: [150.0, 150.0, 20.0],
            fail_after_probes: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        comp_ctrl::{self, CompCtrl, CompCtrlError, CompState, TransformSink},
        kin_ctrl::{self, KinCtrl},
        motion::SegmentPipeline,
    };

    fn tilted() -> SimParams {
        SimParams {
            bed_z0_mm: 0.2,
            bed_slope_x: 0.002,
            bed_slope_y: -0.001,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(SimParams::default().validate().is_ok());
        assert!(SimParams {
            bed_slope_x: f64::NAN,
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(SimParams {
            probe_height_mm: -1.0,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_probe_measures_bed() {
        let mut sim = SimMachine::new(&tilted());
        sim.move_to(CartesianPos::new(100.0, 50.0, 30.0));

        let d = sim.run_probe(100.0, 6000.0, false).unwrap();
        let bed = sim.bed_height_mm(100.0, 50.0);
        assert!((30.0 - d - sim.probe_height() - bed).abs() < 1e-12);

        assert!(matches!(
            sim.run_probe(10.0, 6000.0, false),
            Err(ProbeDriveError::NotTriggered { .. })
        ));

        sim.move_to(CartesianPos::new(0.0, 0.0, 1.0));
        assert!(matches!(
            sim.run_probe(100.0, 6000.0, false),
            Err(ProbeDriveError::Fault(_))
        ));
    }

    #[test]
    fn test_probe_sequence_on_sim() {
        let mut sim = SimMachine::new(&tilted());
        let mut pipeline = SegmentPipeline::new(KinCtrl::new(&kin_ctrl::Params::default()).unwrap());
        let mut comp = CompCtrl::new(&comp_ctrl::Params::default()).unwrap();

        let points = [(-150.0, 150.0), (150.0, 150.0), (0.0, 250.0), (200.0, -50.0)];
        for &(x, y) in points.iter() {
            sim.move_to(CartesianPos::new(x, y, 20.0));
            comp.probe_sequence(&comp.default_request(), &mut sim, &mut pipeline)
                .unwrap();
        }

        assert_eq!(comp.state(), CompState::Enabled);
        assert!(pipeline.has_transform());
        assert_eq!(sim.num_probes(), points.len());
        assert_eq!(sim.idle_waits, 2 * points.len());

        // At the probed points the compensation follows the bed closely
        for &(x, y) in points.iter() {
            let err = comp.offset_at(x, y) - sim.bed_height_mm(x, y);
            assert!(err.abs() < 0.05, "error {} at ({}, {})", err, x, y);
        }

        // Injected fault disables compensation and keeps the earlier samples
        sim.fail_after(Some(0));
        sim.move_to(CartesianPos::new(-100.0, 100.0, 20.0));
        assert!(matches!(
            comp.probe_sequence(&comp.default_request(), &mut sim, &mut pipeline),
            Err(CompCtrlError::ProbeFailed(ProbeDriveError::Fault(_)))
        ));
        assert_eq!(comp.samples().len(), points.len());
        assert!(!pipeline.has_transform());
    }
}
