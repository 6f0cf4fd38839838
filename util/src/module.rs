//! Module interfaces
//!
//! Cyclic modules in `helios_exec` (those called once per motion segment)
//! implement the `State` trait so the executable can initialise them from
//! their parameter file and drive them uniformly.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Data required during initialisation, usually a parameter file name.
    type InitData;
    /// An error which can occur during initialisation.
    type InitError;

    /// Data consumed by one processing cycle.
    type InputData;
    /// Data produced by one processing cycle.
    type OutputData;
    /// What happened during the cycle, for telemetry and tests.
    type StatusReport;
    /// An error which can occur during cyclic processing.
    type ProcError;

    /// Initialise the module, replacing any previous configuration.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one cycle.
    ///
    /// Implementations called from the segment preparation path must not
    /// allocate or block.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
