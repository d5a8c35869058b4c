//! Resynth CLI library.
//!
//! Loading of partial set documents and the `render` and `inspect` commands
//! behind the `resynth` binary.

pub mod cli_args;
pub mod commands;
pub mod input;
