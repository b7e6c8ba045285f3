//! Fixture storage and processed responses

use crate::error::{FixtureError, FixtureResult, HarnessError, HarnessResult};
use crate::executor::RequestExecutor;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;
use wa_normalize::{
    compare, CompareResult, ComparisonVerdict, NormalizeOptions, NormalizeResult,
    NormalizedResponse, RequestParams, ResponseNormalizer,
};

/// Storage for expected and processed fixtures
pub trait FixtureStore {
    /// Load a fixture. Absent and empty fixtures are both [`FixtureError::Missing`].
    fn load(&self, path: &Path) -> FixtureResult<Vec<u8>>;

    /// Store a fixture, replacing any previous contents
    fn save(&self, path: &Path, contents: &[u8]) -> FixtureResult<()>;
}

/// Fixtures kept as plain files
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFixtureStore;

impl FixtureStore for FileFixtureStore {
    fn load(&self, path: &Path) -> FixtureResult<Vec<u8>> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FixtureError::Missing {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(FixtureError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        if contents.is_empty() {
            return Err(FixtureError::Missing {
                path: path.to_path_buf(),
            });
        }
        Ok(contents)
    }

    fn save(&self, path: &Path, contents: &[u8]) -> FixtureResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FixtureError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        debug!("Writing fixture: {:?}", path);
        fs::write(path, contents).map_err(|e| FixtureError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// An API response together with the request that produced it, in
/// canonical form
#[derive(Debug, Clone)]
pub struct ProcessedResponse {
    params: RequestParams,
    options: NormalizeOptions,
    normalized: NormalizedResponse,
}

impl ProcessedResponse {
    /// Normalize a raw response
    pub fn new(
        raw: &[u8],
        params: RequestParams,
        options: NormalizeOptions,
    ) -> NormalizeResult<Self> {
        let normalized = ResponseNormalizer::shared().normalize(raw, &params, &options)?;
        Ok(Self {
            params,
            options,
            normalized,
        })
    }

    /// Load a stored fixture and normalize it with the current rules
    pub fn load_from_store(
        store: &impl FixtureStore,
        path: &Path,
        params: RequestParams,
        options: NormalizeOptions,
    ) -> HarnessResult<Self> {
        let raw = store.load(path)?;
        Ok(Self::new(&raw, params, options)?)
    }

    /// Execute the request described by `params` and normalize the result
    pub fn load_from_api(
        executor: &impl RequestExecutor,
        params: RequestParams,
        options: NormalizeOptions,
    ) -> HarnessResult<Self> {
        let method = params
            .method()
            .ok_or(HarnessError::MissingMethod)?
            .into_owned();
        let raw = executor
            .execute(&method, &params)
            .map_err(|source| HarnessError::Execute {
                method: method.clone(),
                source,
            })?;
        Ok(Self::new(&raw, params, options)?)
    }

    pub fn save(&self, store: &impl FixtureStore, path: &Path) -> FixtureResult<()> {
        store.save(path, self.normalized.as_bytes())
    }

    pub fn response(&self) -> &NormalizedResponse {
        &self.normalized
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Compare with the format requested for `expected`
    pub fn compare(
        expected: &ProcessedResponse,
        actual: &ProcessedResponse,
        message: Option<&str>,
    ) -> CompareResult<ComparisonVerdict> {
        let format = expected.params.format();
        compare(
            &expected.normalized,
            &actual.normalized,
            format.as_deref(),
            message,
        )
    }
}
