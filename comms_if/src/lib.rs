//! # Communications interface crate.
//!
//! Provides the command surface of the motion software: the commands an
//! operator (or a script) can send and how they are parsed.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions and parsing
pub mod tc;
