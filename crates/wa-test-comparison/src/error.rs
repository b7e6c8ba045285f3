//! Error types for the comparison harness

use std::path::PathBuf;
use thiserror::Error;
use wa_normalize::{CompareError, NormalizeError};

/// Result type for fixture storage operations
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Result type for test-suite loading
pub type SuiteResult<T> = Result<T, SuiteError>;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised by fixture storage
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Expected fixture is absent or empty
    #[error("{} does not exist", path.display())]
    Missing { path: PathBuf },

    /// Failed to read a fixture
    #[error("failed to read fixture {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a fixture
    #[error("failed to write fixture {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading a test suite
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Failed to read the suite file
    #[error("failed to read suite {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse suite YAML
    #[error("failed to parse suite {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Suite is well-formed YAML but unusable
    #[error("invalid suite: {message}")]
    Invalid { message: String },
}

/// Errors that abort a comparison case
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The request has no method to execute
    #[error("request has no 'method' parameter")]
    MissingMethod,

    /// The request executor failed
    #[error("request {method} failed: {source}")]
    Execute {
        method: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error(transparent)]
    Suite(#[from] SuiteError),
}
