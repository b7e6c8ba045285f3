//! Test harness for running comparison tests

use crate::config::ComparisonConfig;
use crate::error::HarnessResult;
use crate::executor::RequestExecutor;
use crate::fixture::{FileFixtureStore, FixtureStore, ProcessedResponse};
use crate::suite::{ApiTestCase, ApiTestSuite};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wa_normalize::request::keys;
use wa_normalize::ComparisonVerdict;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}

/// Outcome of one case
#[derive(Debug)]
pub struct CaseResult {
    pub name: String,
    pub verdict: ComparisonVerdict,
    pub expected_path: PathBuf,
    pub processed_path: PathBuf,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }

    pub fn print_summary(&self) {
        self.verdict.print_summary(&self.name);
        if !self.passed() {
            println!("   expected: {}", self.expected_path.display());
            println!("   processed: {}", self.processed_path.display());
        }
    }
}

/// Runs API cases against stored expected fixtures
pub struct TestHarness<E, S = FileFixtureStore> {
    pub config: ComparisonConfig,
    executor: E,
    store: S,
    results: Vec<CaseResult>,
}

impl<E: RequestExecutor> TestHarness<E, FileFixtureStore> {
    /// Harness storing fixtures on disk
    pub fn with_files(config: ComparisonConfig, executor: E) -> Self {
        Self::new(config, executor, FileFixtureStore)
    }
}

impl<E: RequestExecutor, S: FixtureStore> TestHarness<E, S> {
    pub fn new(config: ComparisonConfig, executor: E, store: S) -> Self {
        Self {
            config,
            executor,
            store,
            results: Vec::new(),
        }
    }

    /// Run one case.
    ///
    /// The processed output is saved before the expected fixture is read, so
    /// it is available for inspection (or promotion to a baseline) even when
    /// the expected fixture is missing or the comparison fails.
    pub fn run_case(&mut self, case: &ApiTestCase) -> HarnessResult<&CaseResult> {
        let name = case.name();
        info!(case = %name, "Running API comparison");

        let mut params = case.params.clone();
        if params.format().is_none() {
            params.insert(keys::FORMAT, self.config.default_format.as_str());
        }

        let processed =
            ProcessedResponse::load_from_api(&self.executor, params.clone(), case.options.clone())?;
        let processed_path = self.config.processed_path(case);
        processed.save(&self.store, &processed_path)?;

        let expected_path = self.config.expected_path(case);
        let expected = ProcessedResponse::load_from_store(
            &self.store,
            &expected_path,
            params,
            case.options.clone(),
        )?;

        let verdict = ProcessedResponse::compare(&expected, &processed, Some(&name))?;
        if !verdict.is_pass() {
            warn!(case = %name, processed = ?processed_path, "Response differs from expected");
        }

        self.results.push(CaseResult {
            name,
            verdict,
            expected_path,
            processed_path,
        });
        Ok(&self.results[self.results.len() - 1])
    }

    /// Run every case of a suite, stopping at the first error
    pub fn run_suite(&mut self, suite: &ApiTestSuite) -> HarnessResult<()> {
        for case in suite.cases()? {
            self.run_case(&case)?;
        }
        Ok(())
    }

    pub fn results(&self) -> &[CaseResult] {
        &self.results
    }

    /// Print summary of all results
    pub fn print_summary(&self) {
        println!("\n=== API Comparison Summary ===");
        println!("Fixtures: {}", self.config.test_dir.display());
        println!();

        let passed = self.results.iter().filter(|r| r.passed()).count();
        let total = self.results.len();

        for result in &self.results {
            result.print_summary();
        }

        println!();
        println!("Results: {}/{} passed", passed, total);

        if passed == total {
            println!("✅ All tests passed!");
        } else {
            println!("❌ {} tests failed", total - passed);
        }
    }

    /// Check if all cases passed
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed())
    }
}
