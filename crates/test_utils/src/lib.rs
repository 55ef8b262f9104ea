//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the station
//! ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data with predictable figures
//! - `builders`: Builder patterns for test data construction
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use generators::*;
