//! Command-line front end

pub mod commands;
pub mod completions;
pub mod present;
