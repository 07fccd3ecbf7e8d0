//! Shared test fixtures for the repkit workspace.
//!
//! Provides temporary configuration trees (legacy single files and
//! hierarchical tenant layouts) plus canned section fragments, so tests
//! describe intent instead of repeating filesystem setup.
//!
//! Every fixture lives in its own temp directory and is cleaned up when
//! the fixture is dropped.

mod fixtures;

pub use fixtures::*;
