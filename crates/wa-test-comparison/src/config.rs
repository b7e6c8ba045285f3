//! Configuration for comparison tests

use crate::suite::ApiTestCase;
use std::env;
use std::path::PathBuf;

/// Format requested when a case does not name one
pub const DEFAULT_FORMAT: &str = "xml";

/// Directory holding the stored baselines
pub const EXPECTED_DIR: &str = "expected";

/// Directory receiving the output of the current run
pub const PROCESSED_DIR: &str = "processed";

/// Configuration for the comparison test environment
#[derive(Debug, Clone)]
pub struct ComparisonConfig {
    /// Directory containing `expected/` and `processed/`
    pub test_dir: PathBuf,
    /// Format used for cases without a `format` parameter
    pub default_format: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ComparisonConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let test_dir = env::var("WA_TEST_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                manifest_dir
                    .parent() // crates/
                    .and_then(|p| p.parent()) // workspace root
                    .map(|p| p.join("tests").join("api"))
                    .unwrap_or_else(|| manifest_dir.join("tests").join("api"))
            });

        Self {
            test_dir,
            default_format: env::var("WA_DEFAULT_FORMAT")
                .ok()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
        }
    }

    /// Configuration rooted at `test_dir` with the default format
    pub fn with_test_dir(test_dir: impl Into<PathBuf>) -> Self {
        Self {
            test_dir: test_dir.into(),
            default_format: DEFAULT_FORMAT.to_string(),
        }
    }

    pub fn expected_dir(&self) -> PathBuf {
        self.test_dir.join(EXPECTED_DIR)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.test_dir.join(PROCESSED_DIR)
    }

    /// File name shared by a case's expected and processed fixtures:
    /// `{prefix}[_{label}]__{method}[_{period}].{format}`
    pub fn fixture_name(&self, case: &ApiTestCase) -> String {
        let mut name = case.output_prefix.clone();
        if let Some(label) = &case.label {
            name.push('_');
            name.push_str(label);
        }
        name.push_str("__");
        name.push_str(&case.method);
        if let Some(period) = case.params.period() {
            name.push('_');
            name.push_str(&period);
        }
        name.push('.');
        match case.params.format() {
            Some(format) => name.push_str(&format),
            None => name.push_str(&self.default_format),
        }
        name
    }

    pub fn expected_path(&self, case: &ApiTestCase) -> PathBuf {
        self.expected_dir().join(self.fixture_name(case))
    }

    pub fn processed_path(&self, case: &ApiTestCase) -> PathBuf {
        self.processed_dir().join(self.fixture_name(case))
    }
}
