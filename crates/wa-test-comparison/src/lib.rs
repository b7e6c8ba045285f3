//! Fixture-based API comparison testing
//!
//! Runs analytics API requests, normalizes the output, stores it under
//! `processed/` and compares it with the baseline under `expected/`.
//!
//! ```text
//!  ┌──────────────────┐   raw    ┌──────────────────┐
//!  │ RequestExecutor  ├─────────►│ ProcessedResponse│──► processed/<name>
//!  └──────────────────┘          └────────┬─────────┘
//!                                         │ compare
//!  expected/<name> ──► ProcessedResponse ─┘──► CaseResult
//! ```

pub mod config;
mod error;
pub mod executor;
pub mod fixture;
pub mod harness;
pub mod suite;

pub use error::{
    FixtureError, FixtureResult, HarnessError, HarnessResult, SuiteError, SuiteResult,
};
