//! Error types for normalization and comparison

use thiserror::Error;

/// Result type for normalization operations
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result type for comparison operations
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors that can occur while normalizing a response
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A field removal collapsed a non-trivial payload.
    ///
    /// This means the removal pattern matched far more than the element it
    /// was meant to strip. The case must be aborted, never passed.
    #[error(
        "removing <{field}> shrank the response from {before} to {after} bytes; \
         the removal pattern over-matched"
    )]
    OverRemoval {
        field: String,
        before: usize,
        after: usize,
    },

    /// A field name could not be turned into a removal pattern
    #[error("invalid removal pattern for field '{field}': {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Which side of a comparison an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Expected,
    Actual,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Expected => write!(f, "expected"),
            Side::Actual => write!(f, "actual"),
        }
    }
}

/// Errors that can occur while comparing two normalized responses
#[derive(Debug, Error)]
pub enum CompareError {
    /// XML comparison was requested but a side is not well-formed XML
    #[error("{side} response is not valid XML: {source}")]
    InvalidXml {
        side: Side,
        #[source]
        source: roxmltree::Error,
    },

    /// XML comparison was requested but a side is not valid UTF-8
    #[error("{side} response is not valid UTF-8: {source}")]
    InvalidUtf8 {
        side: Side,
        #[source]
        source: std::str::Utf8Error,
    },
}
