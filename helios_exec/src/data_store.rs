//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::Serialize;

// Internal
use crate::{
    comp_ctrl::{CompCtrl, ProbeSample},
    kin_ctrl::{self, ActuatorPos},
    motion::SegmentPipeline,
    sim_machine::SimMachine,
};
use util::{
    archive::{get_elapsed_seconds, Archiver},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    /// Number of telecommands already executed
    pub num_tcs: u64,

    /// Session of this execution, `None` when running without one (tests)
    pub session: Option<Session>,

    // Motion
    pub pipeline: SegmentPipeline,
    pub last_act_pos: Option<ActuatorPos>,
    pub kin_ctrl_status_rpt: kin_ctrl::StatusReport,

    // Compensation, `None` if it could not be initialised
    pub comp_ctrl: Option<CompCtrl>,

    // Machine
    pub sim: SimMachine,

    // Archives
    pub probe_archive: Option<Archiver>,
}

/// One row of the probe sample archive.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProbeRecord {
    pub time_s: f64,
    pub x_mm: f64,
    pub y_mm: f64,
    pub z_offset_mm: f64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    pub fn new(
        pipeline: SegmentPipeline,
        comp_ctrl: Option<CompCtrl>,
        sim: SimMachine,
        session: Option<Session>,
    ) -> Self {
        Self {
            num_tcs: 0,
            session,
            pipeline,
            last_act_pos: None,
            kin_ctrl_status_rpt: kin_ctrl::StatusReport::default(),
            comp_ctrl,
            sim,
            probe_archive: None,
        }
    }

    /// Write probe samples to the probe archive, if there is one.
    ///
    /// Archive errors are logged and the archive is closed.
    pub fn archive_samples(&mut self, samples: &[ProbeSample]) {
        let result = match self.probe_archive {
            Some(ref mut arch) => samples.iter().try_for_each(|s| {
                arch.serialise(ProbeRecord {
                    time_s: get_elapsed_seconds(),
                    x_mm: s.x_mm,
                    y_mm: s.y_mm,
                    z_offset_mm: s.z_offset_mm,
                })
            }),
            None => Ok(()),
        };

        if let Err(e) = result {
            warn!("Probe archive disabled: {}", e);
            self.probe_archive = None;
        }
    }
}
