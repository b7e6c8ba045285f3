//! Request metadata attached to a captured API response
//!
//! A response is normalized in the light of the request that produced it:
//! the invoked method, the requested date, output format and sub-table id,
//! plus per-test options listing which fields are inherently volatile.

use crate::rules::ALWAYS_REMOVED_FIELDS;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Request parameter keys recognized by the normalizer
pub mod keys {
    pub const METHOD: &str = "method";
    pub const DATE: &str = "date";
    pub const FORMAT: &str = "format";
    pub const ID_SUBTABLE: &str = "idSubtable";
    pub const PERIOD: &str = "period";
}

/// A scalar request parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ParamValue {
    /// Render the value the way it appears in a query string
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            ParamValue::String(s) => Cow::Borrowed(s),
            ParamValue::Int(i) => Cow::Owned(i.to_string()),
            ParamValue::Float(f) => Cow::Owned(f.to_string()),
            ParamValue::Bool(true) => Cow::Borrowed("1"),
            ParamValue::Bool(false) => Cow::Borrowed("0"),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

/// Parameters of the API request that produced a response
///
/// Unknown keys are carried along untouched; missing keys simply disable the
/// rule that would have consumed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams {
    params: BTreeMap<String, ParamValue>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Text of a parameter, `None` when absent
    pub fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.params.get(key).map(ParamValue::as_text)
    }

    pub fn method(&self) -> Option<Cow<'_, str>> {
        self.text(keys::METHOD)
    }

    pub fn date(&self) -> Option<Cow<'_, str>> {
        self.text(keys::DATE)
    }

    pub fn format(&self) -> Option<Cow<'_, str>> {
        self.text(keys::FORMAT)
    }

    pub fn period(&self) -> Option<Cow<'_, str>> {
        self.text(keys::PERIOD)
    }

    /// The sub-table id, if one was requested and is not empty
    pub fn id_subtable(&self) -> Option<Cow<'_, str>> {
        self.text(keys::ID_SUBTABLE).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Per-test normalization options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Keep timestamps and visitor ids in live method output
    #[serde(default, alias = "keepLiveDates")]
    pub keep_live_dates: bool,
    /// Extra fields known to vary between runs for this test
    #[serde(default, alias = "xmlFieldsToRemove")]
    pub xml_fields_to_remove: Vec<String>,
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_live_dates(mut self) -> Self {
        self.keep_live_dates = true;
        self
    }

    pub fn remove_field(mut self, field: impl Into<String>) -> Self {
        self.xml_fields_to_remove.push(field.into());
        self
    }
}

/// Ordered, duplicate-free set of field names to strip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRemovalSet {
    fields: Vec<String>,
}

impl FieldRemovalSet {
    /// Build from `fields` followed by the always-removed fields
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for field in fields {
            set.push(field.as_ref());
        }
        for field in ALWAYS_REMOVED_FIELDS {
            set.push(field);
        }
        set
    }

    /// The set used by general field removal: caller fields plus fixed ones
    pub fn from_options(options: &NormalizeOptions) -> Self {
        Self::new(&options.xml_fields_to_remove)
    }

    fn push(&mut self, field: &str) {
        if !field.is_empty() && !self.contains(field) {
            self.fields.push(field.to_string());
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
