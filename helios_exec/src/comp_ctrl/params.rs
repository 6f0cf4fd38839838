//! Parameters structure for CompCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::CompCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for height compensation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Half extent of the compensated square, which spans `-size..size` in
    /// both X and Y.
    ///
    /// Units: millimeters
    pub size_mm: f64,

    /// Number of grid nodes along each axis.
    pub grid_size: usize,

    /// Maximum number of probe samples that can be stored.
    pub max_count: usize,

    /// Feed rate of a probe move.
    ///
    /// Units: millimeters/minute
    pub probe_feed_rate_mm_min: f64,

    /// Maximum travel of a probe move before it is considered failed.
    ///
    /// Units: millimeters
    pub probe_max_travel_mm: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters describe a usable grid and probe.
    pub fn validate(&self) -> Result<(), CompCtrlError> {
        if !self.size_mm.is_finite() || self.size_mm <= 0.0 {
            return Err(CompCtrlError::InvalidParams(format!(
                "size_mm must be finite and positive, found {}",
                self.size_mm
            )));
        }

        if self.grid_size < 2 {
            return Err(CompCtrlError::InvalidParams(format!(
                "grid_size must be at least 2, found {}",
                self.grid_size
            )));
        }

        if !self.probe_feed_rate_mm_min.is_finite() || self.probe_feed_rate_mm_min <= 0.0 {
            return Err(CompCtrlError::InvalidParams(format!(
                "probe_feed_rate_mm_min must be finite and positive, found {}",
                self.probe_feed_rate_mm_min
            )));
        }

        if !self.probe_max_travel_mm.is_finite() || self.probe_max_travel_mm <= 0.0 {
            return Err(CompCtrlError::InvalidParams(format!(
                "probe_max_travel_mm must be finite and positive, found {}",
                self.probe_max_travel_mm
            )));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            size_mm: 300.0,
            grid_size: 24,
            max_count: 500,
            probe_feed_rate_mm_min: 6000.0,
            probe_max_travel_mm: 100.0,
        }
    }
}
