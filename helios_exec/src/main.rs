//! Main motion executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session and logging
//!     - Load parameters and initialise all modules
//!     - Main loop, one telecommand per line of the script or stdin:
//!         - Telecommand parsing
//!         - Telecommand processing and handling:
//!             - Segment preparation (compensation then kinematics)
//!             - Probe sequences and grid management
//!
//! # Modules
//!
//! Cyclic modules (e.g. `kin_ctrl`) shall provide a public struct
//! implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info, warn};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};
use structopt::StructOpt;

// Internal
use comms_if::tc::Tc;
use helios_lib::{
    comp_ctrl::{self, CompCtrl},
    data_store::DataStore,
    kin_ctrl::{ArmGeometry, KinCtrl},
    motion::SegmentPipeline,
    sim_machine::{SimMachine, SimParams},
    tc_processor,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line arguments.
#[derive(Debug, StructOpt)]
#[structopt(name = "helios_exec", about = "Helios dual-arm motion executable")]
struct Args {
    /// Script of telecommands, one per line. Telecommands are read from stdin
    /// if no script is given.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Minimum level of messages written to the log.
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,
}

/// The configuration in use, saved into the session directory.
#[derive(Serialize)]
struct ConfigRecord<'a> {
    kin_ctrl: &'a ArmGeometry,
    comp_ctrl: &'a comp_ctrl::Params,
    sim: &'a SimParams,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("helios_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(args.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Helios Motion Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let comp_params: comp_ctrl::Params =
        util::params::load("comp_ctrl.toml").wrap_err("Could not load compensation params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load simulation params")?;
    sim_params
        .validate()
        .map_err(|e| eyre!("Invalid simulation params: {}", e))?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut kin_ctrl = KinCtrl::default();
    kin_ctrl
        .init("kin_ctrl.toml", &session)
        .wrap_err("Failed to initialise KinCtrl")?;
    info!("KinCtrl init complete");

    // Compensation is optional, the machine still moves without it
    let comp_ctrl = match CompCtrl::new(&comp_params) {
        Ok(c) => {
            info!("CompCtrl init complete");
            Some(c)
        }
        Err(e) => {
            warn!("Height compensation unavailable: {}", e);
            None
        }
    };

    session
        .save(
            "config.json",
            &ConfigRecord {
                kin_ctrl: kin_ctrl.geometry(),
                comp_ctrl: &comp_params,
                sim: &sim_params,
            },
        )
        .wrap_err("Failed to save the configuration")?;

    let mut ds = DataStore::new(
        SegmentPipeline::new(kin_ctrl),
        comp_ctrl,
        SimMachine::new(&sim_params),
        Some(session.clone()),
    );

    ds.probe_archive = Some(
        Archiver::from_path(&session, "probe_samples.csv")
            .wrap_err("Failed to create the probe sample archive")?,
    );

    info!("Module initialisation complete\n");

    // ---- INITIALISE TC SOURCE ----

    let reader: Box<dyn BufRead> = match args.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);
            Box::new(BufReader::new(
                File::open(path).wrap_err_with(|| format!("Failed to open script {:?}", path))?,
            ))
        }
        None => {
            info!("No script provided, reading telecommands from stdin\n");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.wrap_err("Failed to read a telecommand")?;
        let line = line.trim();

        // Skip blank lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tc = if line.starts_with('{') {
            Tc::from_json(line)
        } else {
            Tc::from_line(line)
        };

        let tc = match tc {
            Ok(tc) => tc,
            Err(e) => {
                warn!("Invalid TC on line {}: {}", line_idx + 1, e);
                println!("Error: {}", e);
                continue;
            }
        };

        match tc_processor::exec(&mut ds, &tc) {
            Ok(response) => {
                for r in response {
                    println!("{}", r);
                }
            }
            Err(e) => {
                error!("TC on line {} failed: {}", line_idx + 1, e);
                println!("Error: {}", e);
            }
        }
    }

    info!("End of telecommands, {} executed", ds.num_tcs);

    Ok(())
}
