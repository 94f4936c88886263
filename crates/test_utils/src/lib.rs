//! Test Utilities Crate
//!
//! Provides shared test infrastructure for the checkout test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built drafts, replies and records
//! - `builders`: Builder for draft applications
//! - `mocks`: In-memory port implementations that count their calls
//! - `assertions`: Assertion helpers for checkout results
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod mocks;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use mocks::*;
pub use assertions::*;
pub use generators::*;
