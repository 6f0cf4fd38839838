//! Height compensation control module
//!
//! Collects sparse bed height probes, spreads them over a regular grid by
//! inverse distance weighting, and supplies a bilinear Z offset for any XY
//! position through a [`CompensationTransform`] installed in the motion
//! pipeline.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod collab;
mod grid;
mod params;
mod sample_store;
mod state;
mod transform;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use collab::*;
pub use grid::*;
pub use params::*;
pub use sample_store::*;
pub use state::*;
pub use transform::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Regularisation term added to the squared normalised distance in the
/// inverse distance weights, bounds the weight of a sample lying on a node.
pub const IDW_EPSILON: f64 = 1e-4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during CompCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum CompCtrlError {
    #[error("Invalid compensation parameters: {0}")]
    InvalidParams(String),

    #[error("Could not allocate storage for the compensation data")]
    OutOfMemory,

    #[error("The probe sample store is full ({max_count} samples)")]
    CapacityExceeded { max_count: usize },

    #[error("Probe failed: {0}")]
    ProbeFailed(#[from] ProbeDriveError),

    #[error("The grid does not match the configured grid size and extent")]
    IncompatibleGrid,

    #[error("An IO operation failed: {0}")]
    IoError(std::io::Error),

    #[error("Couldn't serialize the compensation grid: {0}")]
    SerializeError(serde_json::Error),

    #[error("Couldn't deserialize the compensation grid: {0}")]
    DeserializeError(serde_json::Error),
}
