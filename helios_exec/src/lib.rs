//! # Helios library.
//!
//! This library allows the executable, the benchmarks and other crates in the
//! workspace to access the motion modules.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Kinematics control module - converts tool tip positions to actuator positions and back
pub mod kin_ctrl;

/// Compensation control module - probes the bed and builds the height compensation grid
pub mod comp_ctrl;

/// Motion pipeline - applies compensation and kinematics to each segment
pub mod motion;

/// Simulated machine - provides the motion queue, probe and position readback
pub mod sim_machine;

/// Global data store for the executable
pub mod data_store;

/// Telecommand processor - executes telecommands against the data store
pub mod tc_processor;
