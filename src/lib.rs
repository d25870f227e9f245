//! Team-to-vehicle allocation for group events.
//!
//! Places whole teams into capacity-bounded vehicles while honouring
//! manual seat pins, a per-vehicle faction balance band, a minors cap and
//! a certified-member floor. The placement is a binary linear model
//! solved by a pluggable backend.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Person`, `Team`, `Vehicle`, `Roster`
//! - **`aggregate`**: Derived per-team and per-vehicle counters
//! - **`validation`**: Full diagnostic listing of a roster
//! - **`model`**: Binary assignment model and LP dump
//! - **`solver`**: `AssignmentSolver` backends (MILP, search, fixed plan)
//! - **`resolve`**: Writes a solved plan back into the roster
//! - **`report`**: Export rows, manifests, audit, fleet indicators
//! - **`io`**: Delimited-text import and export
//! - **`pipeline`**: `Planner`, the end-to-end run
//! - **`config`**, **`error`**, **`logging`**: ambient plumbing
//!
//! # Flow
//!
//! ```text
//! import → aggregate → model → solver → resolve → audit → report → export
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod model;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod solver;
pub mod validation;

pub use error::{ConvoyError, Result};
