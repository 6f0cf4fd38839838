//! # Height compensation telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use structopt::{clap::AppSettings, StructOpt};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands handled by compensation control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum CompCmd {
    /// Probe the surface at the current head position, then rebuild and
    /// enable the compensation grid.
    #[structopt(name = "probe")]
    Probe {
        /// Number of samples to collect in this sequence.
        #[structopt(short, long, default_value = "1")]
        samples: usize,

        /// Override of the maximum probe travel.
        ///
        /// Units: millimeters
        #[structopt(long)]
        max_travel_mm: Option<f64>,

        /// Override of the probing feed rate.
        ///
        /// Units: millimeters/minute
        #[structopt(long)]
        feed_rate_mm_min: Option<f64>,
    },

    /// Clear all samples and disable compensation.
    #[structopt(name = "clear")]
    Clear,

    /// Set the identity transform, equivalent to `clear`.
    #[structopt(name = "identity")]
    Identity,

    /// Report the active height offset at a position.
    #[structopt(name = "query", setting = AppSettings::AllowNegativeNumbers)]
    Query {
        /// Units: millimeters
        x_mm: f64,

        /// Units: millimeters
        y_mm: f64,
    },

    /// Save the active grid as JSON, relative to the session directory.
    #[structopt(name = "save")]
    Save { path: PathBuf },

    /// Load a grid saved with `save` and enable it.
    #[structopt(name = "load")]
    Load { path: PathBuf },
}
