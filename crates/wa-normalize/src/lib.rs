//! Analytics API response normalization and comparison
//!
//! Integration tests compare API output against stored fixtures. Raw output
//! is not reproducible: live feeds embed wall-clock timestamps and visitor
//! ids, relative dates leak into URLs, generated documents carry creation
//! dates and random ids, and database drivers disagree on decimals. This crate
//! reduces a response to a canonical form and compares canonical forms with
//! format-aware rules.
//!
//! ```text
//! raw payload ──► ResponseNormalizer ──► NormalizedResponse
//!                                               │
//!        expected NormalizedResponse ──► compare() ──► ComparisonVerdict
//! ```
//!
//! # Example
//!
//! ```
//! use wa_normalize::{compare, normalize, NormalizeOptions, RequestParams};
//!
//! let params = RequestParams::new()
//!     .with("method", "Goals.get")
//!     .with("format", "xml");
//! let options = NormalizeOptions::new();
//!
//! let expected = normalize(b"<result><revenue>12</revenue></result>", &params, &options)?;
//! let actual = normalize(b"<result><revenue>12.00</revenue></result>", &params, &options)?;
//!
//! let verdict = compare(&expected, &actual, params.format().as_deref(), None)?;
//! assert!(verdict.is_pass());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compare;
mod error;
pub mod normalize;
pub mod request;
pub mod rules;
pub mod xml;

pub use compare::{compare, ComparisonFailure, ComparisonVerdict, DiffCategory, Difference};
pub use error::{CompareError, CompareResult, NormalizeError, NormalizeResult, Side};
pub use normalize::{normalize, remove_field, NormalizedResponse, ResponseNormalizer};
pub use request::{FieldRemovalSet, NormalizeOptions, ParamValue, RequestParams};
