//! Static rule tables driving normalization
//!
//! Everything here is read-only configuration. Extending normalization to a
//! new volatile field or live method means editing a table, not control flow.

/// API methods returning a live visit feed. Their output embeds wall-clock
/// timestamps and per-run visitor identifiers.
pub const LIVE_METHODS: &[&str] = &[
    "Live.getLastVisits",
    "Live.getLastVisitsDetails",
    "Live.getVisitorProfile",
];

/// Fields stripped from live method output unless live dates are kept
pub const LIVE_DATE_FIELDS: &[&str] = &[
    "serverDate",
    "firstActionTimestamp",
    "lastActionTimestamp",
    "lastActionDateTime",
    "serverTimestamp",
    "serverTimePretty",
    "serverDatePretty",
    "serverDatePrettyFirstAction",
    "serverTimePrettyFirstAction",
    "goalTimePretty",
    "visitorId",
    "nextVisitorId",
    "previousVisitorId",
    "visitServerHour",
    "date",
    "prettyDate",
    "serverDateTimePrettyFirstAction",
];

/// Substrings marking a `date` parameter as relative to "now"
pub const RELATIVE_DATE_MARKERS: &[&str] = &["last", "today", "now"];

/// Method whose output carries a `prettyDate` element for relative dates
pub const PROCESSED_REPORT_METHOD: &str = "API.getProcessedReport";

/// Field stripped when the requested date is relative
pub const PRETTY_DATE_FIELD: &str = "prettyDate";

/// Field stripped whenever the requested date is relative
pub const VISIT_SERVER_HOUR_FIELD: &str = "visitServerHour";

/// XMP metadata fields embedded in generated documents
pub const DOCUMENT_METADATA_FIELDS: &[&str] = &[
    "xmp:CreateDate",
    "xmp:ModifyDate",
    "xmp:MetadataDate",
    "xmpMM:DocumentID",
    "xmpMM:InstanceID",
];

/// Replacement for document date markers, `(D:` followed by 14 digits
pub const DOCUMENT_EPOCH_MARKER: &str = "(D:19700101000000";

/// Fields removed from every response
pub const ALWAYS_REMOVED_FIELDS: &[&str] = &["idsubdatatable"];

/// Literal rewrites for driver-dependent decimal rendering, applied in order.
///
/// `TRUNCATE(SUM())` on some MySQL drivers keeps `.00`, others drop it.
pub const DECIMAL_ARTIFACTS: &[(&str, &str)] = &[
    (".000000</l", "</l"),
    (".00</revenue>", "</revenue>"),
    (".1</revenue>", "</revenue>"),
    (".11</revenue>", "</revenue>"),
];

/// A field removal may not shrink a payload above this size to this size or
/// below.
pub const OVER_REMOVAL_THRESHOLD: usize = 100;

/// Whether `method` returns a live visit feed
pub fn is_live_method(method: &str) -> bool {
    LIVE_METHODS.contains(&method)
}

/// Whether a `date` parameter value depends on the current time
pub fn is_relative_date(date: &str) -> bool {
    RELATIVE_DATE_MARKERS
        .iter()
        .any(|marker| date.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_methods() {
        assert!(is_live_method("Live.getLastVisitsDetails"));
        assert!(is_live_method("Live.getVisitorProfile"));
        assert!(!is_live_method("Live.getCounters"));
        assert!(!is_live_method("live.getlastvisits"));
    }

    #[test]
    fn test_relative_dates() {
        assert!(is_relative_date("last30"));
        assert!(is_relative_date("today"));
        assert!(is_relative_date("now"));
        assert!(is_relative_date("previous7,today"));
        assert!(!is_relative_date("2010-01-06"));
        assert!(!is_relative_date("yesterday"));
    }

    #[test]
    fn test_live_fields_have_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for field in LIVE_DATE_FIELDS {
            assert!(seen.insert(field), "duplicate live field {field}");
        }
    }
}
