//! File input and output.
//!
//! - [`import`]: people, teams and vehicles from delimited text
//! - [`export`]: person table, vehicle summary and per-vehicle manifests

pub mod export;
pub mod import;

pub use export::write_report;
pub use import::load_roster;
