//! Response normalization
//!
//! Turns raw API output into a canonical form that is stable across test
//! runs. Rules run in a fixed order because later rules assume earlier ones
//! already collapsed date parameters and live fields:
//!
//! 1. live-data suppression, or relative-date handling
//! 2. sub-table id scrubbing
//! 3. document (PDF/XMP) metadata normalization
//! 4. general field removal
//! 5. decimal normalization
//!
//! Payloads are handled as bytes so binary documents survive untouched
//! outside the rewritten spans.

use crate::error::{NormalizeError, NormalizeResult};
use crate::request::{FieldRemovalSet, NormalizeOptions, RequestParams};
use crate::rules::{
    self, DECIMAL_ARTIFACTS, DOCUMENT_EPOCH_MARKER, DOCUMENT_METADATA_FIELDS, LIVE_DATE_FIELDS,
    OVER_REMOVAL_THRESHOLD, PRETTY_DATE_FIELD, PROCESSED_REPORT_METHOD, VISIT_SERVER_HOUR_FIELD,
};
use regex::bytes::{NoExpand, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;
use tracing::{debug, trace};

static SHARED: OnceLock<ResponseNormalizer> = OnceLock::new();

/// Canonical form of a response, safe to compare byte for byte
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedResponse {
    bytes: Vec<u8>,
}

impl NormalizedResponse {
    /// Wrap bytes that are already canonical
    pub fn canonical(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The text, if the payload is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// The text with invalid UTF-8 sequences replaced
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<String> for NormalizedResponse {
    fn from(text: String) -> Self {
        Self::canonical(text)
    }
}

impl From<&str> for NormalizedResponse {
    fn from(text: &str) -> Self {
        Self::canonical(text)
    }
}

/// Normalizes raw API responses using precompiled rule patterns
#[derive(Debug)]
pub struct ResponseNormalizer {
    date_param: Regex,
    id_subtable_param: Regex,
    document_date: Regex,
    document_ids: Vec<Regex>,
    decimal_artifacts: Vec<(Regex, &'static [u8])>,
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self {
            // %2C is an encoded comma
            date_param: builtin_regex(r"date=[-0-9,%Ca-z]+"),
            id_subtable_param: builtin_regex(r"idSubtable=[0-9]+"),
            document_date: builtin_regex(r"\(D:[0-9]{14}"),
            document_ids: vec![
                builtin_regex(r"/ID \[ <(?-u:.)*> \]"),
                builtin_regex(r"/id:\[ <(?-u:.)*> \]"),
            ],
            decimal_artifacts: DECIMAL_ARTIFACTS
                .iter()
                .map(|(from, to)| (builtin_regex(&regex::escape(from)), to.as_bytes()))
                .collect(),
        }
    }

    /// Process-wide normalizer, compiled on first use
    pub fn shared() -> &'static ResponseNormalizer {
        SHARED.get_or_init(ResponseNormalizer::new)
    }

    /// Produce the canonical form of `raw`
    pub fn normalize(
        &self,
        raw: &[u8],
        params: &RequestParams,
        options: &NormalizeOptions,
    ) -> NormalizeResult<NormalizedResponse> {
        debug!(
            method = params.method().as_deref().unwrap_or(""),
            bytes = raw.len(),
            "Normalizing response"
        );

        let payload = raw.to_vec();
        let payload = self.suppress_volatile_dates(payload, params, options)?;
        let payload = self.scrub_id_subtable(payload, params);
        let payload = self.normalize_document(payload)?;
        let payload = remove_fields(payload, &FieldRemovalSet::from_options(options))?;
        let payload = self.normalize_decimals(payload);

        trace!(bytes = payload.len(), "Normalized response");
        Ok(NormalizedResponse::canonical(payload))
    }

    fn suppress_volatile_dates(
        &self,
        payload: Vec<u8>,
        params: &RequestParams,
        options: &NormalizeOptions,
    ) -> NormalizeResult<Vec<u8>> {
        let method = params.method();
        let method = method.as_deref().unwrap_or("");

        if !options.keep_live_dates && rules::is_live_method(method) {
            debug!(method, "Removing live dates and visitor ids");
            return remove_fields(payload, &FieldRemovalSet::new(LIVE_DATE_FIELDS));
        }

        let relative = params
            .date()
            .map_or(false, |date| rules::is_relative_date(&date));
        if !relative {
            return Ok(payload);
        }

        debug!(method, "Request date is relative, removing date markers");
        let mut payload = payload;
        if method == PROCESSED_REPORT_METHOD {
            payload = remove_field(payload, PRETTY_DATE_FIELD)?;
        }
        payload = remove_field(payload, VISIT_SERVER_HOUR_FIELD)?;
        Ok(replace_all(&self.date_param, payload, b"date="))
    }

    fn scrub_id_subtable(&self, payload: Vec<u8>, params: &RequestParams) -> Vec<u8> {
        if params.id_subtable().is_none() {
            return payload;
        }
        replace_all(&self.id_subtable_param, payload, b"idSubtable=")
    }

    fn normalize_document(&self, payload: Vec<u8>) -> NormalizeResult<Vec<u8>> {
        let mut payload = replace_all(
            &self.document_date,
            payload,
            DOCUMENT_EPOCH_MARKER.as_bytes(),
        );
        for ids in &self.document_ids {
            payload = replace_all(ids, payload, b"");
        }
        for field in DOCUMENT_METADATA_FIELDS {
            payload = remove_field(payload, field)?;
        }
        Ok(payload)
    }

    fn normalize_decimals(&self, payload: Vec<u8>) -> Vec<u8> {
        self.decimal_artifacts
            .iter()
            .fold(payload, |payload, (artifact, replacement)| {
                replace_all(artifact, payload, replacement)
            })
    }
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with the shared normalizer
pub fn normalize(
    raw: &[u8],
    params: &RequestParams,
    options: &NormalizeOptions,
) -> NormalizeResult<NormalizedResponse> {
    ResponseNormalizer::shared().normalize(raw, params, options)
}

/// Remove every `<field>...</field>` element from `payload`.
///
/// Element contents are matched lazily across any bytes, newlines included.
/// Fails with [`NormalizeError::OverRemoval`] when a payload longer than
/// [`OVER_REMOVAL_THRESHOLD`] bytes is changed and ends up no longer than it.
pub fn remove_field(payload: Vec<u8>, field: &str) -> NormalizeResult<Vec<u8>> {
    let escaped = regex::escape(field);
    let pattern = Regex::new(&format!("<{escaped}>(?s-u:.)+?</{escaped}>")).map_err(|source| {
        NormalizeError::Pattern {
            field: field.to_string(),
            source,
        }
    })?;

    let before = payload.len();
    let check_size = before > OVER_REMOVAL_THRESHOLD;
    if !pattern.is_match(&payload) {
        return Ok(payload);
    }

    let stripped = pattern.replace_all(&payload, NoExpand(b"")).into_owned();
    let after = stripped.len();
    trace!(field, removed = before - after, "Removed field");

    if check_size && after != before && after <= OVER_REMOVAL_THRESHOLD {
        return Err(NormalizeError::OverRemoval {
            field: field.to_string(),
            before,
            after,
        });
    }
    Ok(stripped)
}

/// Remove every field of `fields`, in order
pub fn remove_fields(payload: Vec<u8>, fields: &FieldRemovalSet) -> NormalizeResult<Vec<u8>> {
    fields.iter().try_fold(payload, remove_field)
}

fn replace_all(pattern: &Regex, payload: Vec<u8>, replacement: &[u8]) -> Vec<u8> {
    if !pattern.is_match(&payload) {
        return payload;
    }
    pattern
        .replace_all(&payload, NoExpand(replacement))
        .into_owned()
}

fn builtin_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("built-in pattern {pattern:?} is invalid: {e}"))
}
