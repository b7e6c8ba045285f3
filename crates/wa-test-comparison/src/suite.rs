//! YAML test-suite definitions
//!
//! A suite lists the API methods to call with shared parameters. Every
//! method/period pair becomes one [`ApiTestCase`]:
//!
//! ```yaml
//! output_prefix: CustomVariablesIntegrationTest
//! cases:
//!   - methods: [CustomVariables.getCustomVariables, Live.getLastVisitsDetails]
//!     params: { idSite: 1, date: "2010-01-06" }
//!     periods: [day]
//!     xml_fields_to_remove: [idvisit]
//! ```

use crate::error::{SuiteError, SuiteResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;
use wa_normalize::request::keys;
use wa_normalize::{NormalizeOptions, RequestParams};

/// One API call to compare against its expected fixture
#[derive(Debug, Clone, PartialEq)]
pub struct ApiTestCase {
    pub output_prefix: String,
    pub label: Option<String>,
    pub method: String,
    /// Request parameters, `method` included
    pub params: RequestParams,
    pub options: NormalizeOptions,
}

impl ApiTestCase {
    pub fn new(
        output_prefix: impl Into<String>,
        method: impl Into<String>,
        params: RequestParams,
    ) -> Self {
        let method = method.into();
        Self {
            output_prefix: output_prefix.into(),
            label: None,
            params: params.with(keys::METHOD, method.as_str()),
            method,
            options: NormalizeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Human-readable case name used in summaries
    pub fn name(&self) -> String {
        let mut name = format!("{}__{}", self.output_prefix, self.method);
        if let Some(label) = &self.label {
            name = format!("{} [{}]", name, label);
        }
        if let Some(period) = self.params.period() {
            name = format!("{} ({})", name, period);
        }
        name
    }
}

/// A suite file: shared prefix plus case groups
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTestSuite {
    pub output_prefix: String,
    #[serde(default)]
    pub cases: Vec<SuiteEntry>,
}

/// A group of methods sharing parameters and options
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteEntry {
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub params: RequestParams,
    #[serde(default)]
    pub periods: Vec<String>,
    #[serde(default, alias = "xmlFieldsToRemove")]
    pub xml_fields_to_remove: Vec<String>,
    #[serde(default, alias = "keepLiveDates")]
    pub keep_live_dates: bool,
    #[serde(default)]
    pub label: Option<String>,
}

impl ApiTestSuite {
    /// Load a suite from a YAML file
    pub fn load(path: impl AsRef<Path>) -> SuiteResult<Self> {
        let path = path.as_ref();
        debug!("Loading test suite: {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| SuiteError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| SuiteError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Expand into one case per method and period
    pub fn cases(&self) -> SuiteResult<Vec<ApiTestCase>> {
        if self.output_prefix.trim().is_empty() {
            return Err(SuiteError::Invalid {
                message: "output_prefix must not be empty".to_string(),
            });
        }

        let mut cases = Vec::new();
        for (index, entry) in self.cases.iter().enumerate() {
            if entry.methods.is_empty() {
                return Err(SuiteError::Invalid {
                    message: format!("case #{} lists no methods", index + 1),
                });
            }

            let options = NormalizeOptions {
                keep_live_dates: entry.keep_live_dates,
                xml_fields_to_remove: entry.xml_fields_to_remove.clone(),
            };
            let periods: Vec<Option<&str>> = if entry.periods.is_empty() {
                vec![None]
            } else {
                entry.periods.iter().map(|p| Some(p.as_str())).collect()
            };

            for method in &entry.methods {
                for period in &periods {
                    let mut params = entry.params.clone();
                    if let Some(period) = period {
                        params.insert(keys::PERIOD, *period);
                    }
                    let mut case = ApiTestCase::new(&self.output_prefix, method, params)
                        .with_options(options.clone());
                    case.label = entry.label.clone();
                    cases.push(case);
                }
            }
        }
        Ok(cases)
    }
}
