//! Terminal front end for the sentiment dashboard.
pub mod cli;
mod commands;
pub mod prefs;
pub mod render;

pub use commands::run;
