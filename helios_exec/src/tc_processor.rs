//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from a script or the
//! interactive prompt and produces the text responses shown to the operator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::path::{Path, PathBuf};

// Internal
use crate::{
    comp_ctrl::{CompCtrlError, ProbeRequest},
    data_store::DataStore,
    kin_ctrl::{format_options, ActuatorPos, ArmOptions, CartesianPos, KinCtrlError},
};
use comms_if::tc::{comp_ctrl::CompCmd, kin_ctrl::KinCmd, Tc};
use util::session::Session;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while executing a telecommand.
#[derive(Debug, thiserror::Error)]
pub enum TcExecError {
    #[error("Kinematics error: {0}")]
    Kin(#[from] KinCtrlError),

    #[error("Compensation error: {0}")]
    Comp(#[from] CompCtrlError),

    #[error("Compensation is not available in this session")]
    CompUnavailable,

    #[error("No compensation grid has been built")]
    NoGrid,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules and returns
/// the response lines.
pub fn exec(ds: &mut DataStore, tc: &Tc) -> Result<Vec<String>, TcExecError> {
    ds.num_tcs += 1;
    debug!("Executing TC #{}: {:?}", ds.num_tcs, tc);

    match tc {
        Tc::Kin(cmd) => exec_kin(ds, cmd),
        Tc::Comp(cmd) => exec_comp(ds, cmd),
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn exec_kin(ds: &mut DataStore, cmd: &KinCmd) -> Result<Vec<String>, TcExecError> {
    match cmd {
        KinCmd::Move { x_mm, y_mm, z_mm } => {
            let target = CartesianPos::new(*x_mm, *y_mm, *z_mm);
            let (act_pos, report) = ds.pipeline.prepare_segment(&target)?;

            // The head ends up where the actuators put it, which differs from
            // the demand if the target was clamped
            let reached = ds.pipeline.kin_ctrl().actuator_to_cartesian(&act_pos)?;
            ds.sim.move_to(reached);

            ds.last_act_pos = Some(act_pos);
            ds.kin_ctrl_status_rpt = report;

            Ok(vec![format_act_pos(&act_pos)])
        }
        KinCmd::Fwd {
            alpha_deg,
            beta_deg,
            gamma_deg,
        } => {
            let machine = ds
                .pipeline
                .kin_ctrl()
                .actuator_to_cartesian(&ActuatorPos::new(*alpha_deg, *beta_deg, *gamma_deg))?;
            let logical = ds.pipeline.logical_position(&machine);

            Ok(vec![format!(
                "X{} Y{} Z{}",
                logical[0], logical[1], logical[2]
            )])
        }
        KinCmd::SetOpts { options } => {
            let opts: ArmOptions = options.iter().map(|o| (o.key, o.value)).collect();
            ds.pipeline.kin_ctrl_mut().set_optional(&opts)?;

            Ok(vec![format_options(&ds.pipeline.kin_ctrl().get_optional())])
        }
        KinCmd::GetOpts => Ok(vec![format_options(&ds.pipeline.kin_ctrl().get_optional())]),
    }
}

fn exec_comp(ds: &mut DataStore, cmd: &CompCmd) -> Result<Vec<String>, TcExecError> {
    let comp = ds.comp_ctrl.as_mut().ok_or(TcExecError::CompUnavailable)?;

    match cmd {
        CompCmd::Probe {
            samples,
            max_travel_mm,
            feed_rate_mm_min,
        } => {
            let default = comp.default_request();
            let request = ProbeRequest {
                samples: *samples,
                max_travel_mm: max_travel_mm.unwrap_or(default.max_travel_mm),
                feed_rate_mm_min: feed_rate_mm_min.unwrap_or(default.feed_rate_mm_min),
            };

            let report = comp.probe_sequence(&request, &mut ds.sim, &mut ds.pipeline)?;

            let new_start = report.points.len() - report.new_points;
            ds.archive_samples(&report.points[new_start..]);

            let mut response = Vec::with_capacity(report.points.len() + 2);
            if report.cancelled {
                response.push(format!(
                    "Probe cancelled after {} samples.",
                    report.new_points
                ));
            }
            response.push("Probe completed.".to_string());
            response.extend(report.points.iter().enumerate().map(|(i, p)| {
                format!("Point #{}: {:.6},{:.6},{:.6}", i, p.x_mm, p.y_mm, p.z_offset_mm)
            }));

            Ok(response)
        }
        CompCmd::Clear | CompCmd::Identity => {
            comp.reset(&mut ds.pipeline);

            Ok(vec!["grid cleared and disabled".to_string()])
        }
        CompCmd::Query { x_mm, y_mm } => Ok(vec![format!(
            "Offset at ({}, {}): {:.6} mm",
            x_mm,
            y_mm,
            comp.offset_at(*x_mm, *y_mm)
        )]),
        CompCmd::Save { path } => {
            let grid = comp.grid().ok_or(TcExecError::NoGrid)?;
            let full_path = resolve_path(ds.session.as_ref(), path);
            grid.save(&full_path)?;

            info!("Compensation grid saved to {:?}", full_path);
            Ok(vec![format!("Grid saved to {}", full_path.display())])
        }
        CompCmd::Load { path } => {
            let full_path = resolve_path(ds.session.as_ref(), path);
            comp.load_grid(&full_path, &mut ds.pipeline)?;

            info!("Compensation grid loaded from {:?}", full_path);
            Ok(vec![format!("Grid loaded from {}", full_path.display())])
        }
    }
}

/// Resolve a path relative to the session directory, or leave it unchanged
/// when there is no session.
fn resolve_path(session: Option<&Session>, path: &Path) -> PathBuf {
    match session {
        Some(s) => s.resolve(path),
        None => path.to_path_buf(),
    }
}

fn format_act_pos(act_pos: &ActuatorPos) -> String {
    format!(
        "Alpha {:.4} deg, Beta {:.4} deg, Gamma {:.4} deg",
        act_pos.alpha_deg, act_pos.beta_deg, act_pos.gamma_deg
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        comp_ctrl::{self, CompCtrl, CompState, PositionSource, TransformSink},
        kin_ctrl::{self, KinCtrl},
        motion::SegmentPipeline,
        sim_machine::{SimMachine, SimParams},
    };

    fn data_store(with_comp: bool) -> DataStore {
        let comp = if with_comp {
            Some(CompCtrl::new(&comp_ctrl::Params::default()).unwrap())
        } else {
            None
        };

        DataStore::new(
            SegmentPipeline::new(KinCtrl::new(&kin_ctrl::Params::default()).unwrap()),
            comp,
            SimMachine::new(&SimParams {
                bed_z0_mm: 0.5,
                ..Default::default()
            }),
            None,
        )
    }

    fn run(ds: &mut DataStore, line: &str) -> Result<Vec<String>, TcExecError> {
        exec(ds, &Tc::from_line(line).unwrap())
    }

    #[test]
    fn test_kin_commands() {
        let mut ds = data_store(true);

        let resp = run(&mut ds, "kin move 150 150 0").unwrap();
        assert_eq!(resp.len(), 1);
        assert!(resp[0].ends_with("Beta 90.0000 deg, Gamma -90.0000 deg"), "{}", resp[0]);
        assert_eq!(
            ds.sim.current_machine_position(),
            CartesianPos::new(150.0, 150.0, 0.0)
        );

        let resp = run(&mut ds, "kin fwd 0 90 -90").unwrap();
        assert_eq!(resp, vec!["X150 Y150 Z0"]);

        assert_eq!(run(&mut ds, "kin get-opts").unwrap(), vec!["A1 C128 P150 T150"]);
        assert_eq!(
            run(&mut ds, "kin set-opts A0 C64").unwrap(),
            vec!["A0 C64 P150 T150"]
        );
        assert!(matches!(
            run(&mut ds, "kin set-opts T500"),
            Err(TcExecError::Kin(KinCtrlError::InvalidGeometry(_)))
        ));
        assert_eq!(ds.num_tcs, 5);
    }

    #[test]
    fn test_comp_commands() {
        let mut ds = data_store(true);

        run(&mut ds, "kin move 150 150 11").unwrap();
        let resp = run(&mut ds, "comp probe").unwrap();
        assert_eq!(resp[0], "Probe completed.");
        assert_eq!(resp[1], "Point #0: 150.000000,150.000000,0.500000");
        assert!(ds.pipeline.has_transform());

        let resp = run(&mut ds, "comp query -290 -290").unwrap();
        assert_eq!(resp, vec!["Offset at (-290, -290): 0.500000 mm"]);

        // Moves are now compensated
        run(&mut ds, "kin move 150 150 0").unwrap();
        assert!((ds.sim.current_machine_position()[2] - 0.5).abs() < 1e-6);

        assert_eq!(
            run(&mut ds, "comp identity").unwrap(),
            vec!["grid cleared and disabled"]
        );
        assert!(!ds.pipeline.has_transform());
        assert_eq!(
            ds.comp_ctrl.as_ref().map(|c| c.state()),
            Some(CompState::Disabled)
        );
        assert!(matches!(
            run(&mut ds, "comp save grid.json"),
            Err(TcExecError::NoGrid)
        ));
    }

    #[test]
    fn test_probe_failure() {
        let mut ds = data_store(true);

        // Head below the probe trigger height
        run(&mut ds, "kin move 150 150 2").unwrap();
        assert!(matches!(
            run(&mut ds, "comp probe"),
            Err(TcExecError::Comp(CompCtrlError::ProbeFailed(_)))
        ));
        assert!(!ds.pipeline.has_transform());
    }

    #[test]
    fn test_probe_overrides_checked() {
        let mut ds = data_store(true);

        run(&mut ds, "kin move 150 150 11").unwrap();
        run(&mut ds, "comp probe").unwrap();
        let num_probes = ds.sim.num_probes();

        for line in [
            "comp probe --max-travel-mm=-5",
            "comp probe --max-travel-mm 0",
            "comp probe --feed-rate-mm-min 0",
            "comp probe --feed-rate-mm-min inf",
        ]
        .iter()
        {
            assert!(
                matches!(
                    run(&mut ds, line),
                    Err(TcExecError::Comp(CompCtrlError::InvalidParams(_)))
                ),
                "{}",
                line
            );
        }

        // The earlier grid stays installed and nothing was probed
        assert_eq!(ds.sim.num_probes(), num_probes);
        assert!(ds.pipeline.has_transform());
        assert_eq!(
            ds.comp_ctrl.as_ref().map(|c| c.state()),
            Some(CompState::Enabled)
        );
    }

    #[test]
    fn test_comp_unavailable() {
        let mut ds = data_store(false);

        assert!(matches!(
            run(&mut ds, "comp clear"),
            Err(TcExecError::CompUnavailable)
        ));
    }
}
