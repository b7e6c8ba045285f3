//! Response comparison
//!
//! XML responses are compared structurally, everything else literally with
//! the lengths checked first so a size mismatch is reported without scanning
//! a potentially huge payload.

use crate::error::{CompareError, CompareResult, Side};
use crate::normalize::NormalizedResponse;
use crate::xml;
use similar::TextDiff;
use std::fmt;
use tracing::debug;

/// Format compared structurally rather than literally
pub const XML_FORMAT: &str = "xml";

/// Longest excerpt kept in a [`Difference`]
const EXCERPT_LIMIT: usize = 120;

/// Outcome of comparing an expected response with an actual one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonVerdict {
    Pass,
    Fail(ComparisonFailure),
}

/// A failed comparison, carrying both canonical texts unmodified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonFailure {
    pub expected: NormalizedResponse,
    pub actual: NormalizedResponse,
    pub message: Option<String>,
    pub difference: Difference,
}

/// The first place where two responses disagree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub category: DiffCategory,
    pub path: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffCategory {
    Length,
    Content,
    Element,
    Attribute,
    Text,
    Missing,
    Extra,
}

impl fmt::Display for DiffCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffCategory::Length => write!(f, "LENGTH"),
            DiffCategory::Content => write!(f, "CONTENT"),
            DiffCategory::Element => write!(f, "ELEMENT"),
            DiffCategory::Attribute => write!(f, "ATTRIBUTE"),
            DiffCategory::Text => write!(f, "TEXT"),
            DiffCategory::Missing => write!(f, "MISSING"),
            DiffCategory::Extra => write!(f, "EXTRA"),
        }
    }
}

impl Difference {
    pub fn new(
        category: DiffCategory,
        path: &str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            category,
            path: path.to_string(),
            expected: excerpt(expected.into()),
            actual: excerpt(actual.into()),
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} : expected={} actual={}",
            self.category, self.path, self.expected, self.actual
        )
    }
}

impl ComparisonVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, ComparisonVerdict::Pass)
    }

    pub fn failure(&self) -> Option<&ComparisonFailure> {
        match self {
            ComparisonVerdict::Pass => None,
            ComparisonVerdict::Fail(failure) => Some(failure),
        }
    }

    /// Print a one-line outcome, plus the difference on failure
    pub fn print_summary(&self, name: &str) {
        match self {
            ComparisonVerdict::Pass => println!("✅ {} - PASS", name),
            ComparisonVerdict::Fail(failure) => {
                println!("❌ {} - FAIL", name);
                if let Some(message) = &failure.message {
                    println!("   {}", message);
                }
                println!("   {}", failure.difference);
            }
        }
    }
}

impl ComparisonFailure {
    /// Line diff of the two canonical texts, for display
    pub fn unified_diff(&self) -> String {
        let expected = self.expected.to_text_lossy();
        let actual = self.actual.to_text_lossy();
        TextDiff::from_lines(&*expected, &*actual)
            .unified_diff()
            .context_radius(3)
            .header("expected", "actual")
            .to_string()
    }
}

impl fmt::Display for ComparisonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            write!(f, "{}: ", message)?;
        }
        write!(f, "{}", self.difference)
    }
}

/// Compare two canonical responses
///
/// `format` is the requested output format; `"xml"` selects structural
/// comparison. Inputs are never modified.
pub fn compare(
    expected: &NormalizedResponse,
    actual: &NormalizedResponse,
    format: Option<&str>,
    message: Option<&str>,
) -> CompareResult<ComparisonVerdict> {
    let difference = if format == Some(XML_FORMAT) {
        compare_xml(expected, actual)?
    } else {
        compare_literal(expected, actual)
    };

    Ok(match difference {
        None => ComparisonVerdict::Pass,
        Some(difference) => {
            debug!(%difference, "Responses differ");
            ComparisonVerdict::Fail(ComparisonFailure {
                expected: expected.clone(),
                actual: actual.clone(),
                message: message.map(str::to_string),
                difference,
            })
        }
    })
}

fn compare_literal(expected: &NormalizedResponse, actual: &NormalizedResponse) -> Option<Difference> {
    if expected.len() != actual.len() {
        return Some(Difference::new(
            DiffCategory::Length,
            "length",
            format!("{} bytes", expected.len()),
            format!("{} bytes", actual.len()),
        ));
    }

    let offset = expected
        .as_bytes()
        .iter()
        .zip(actual.as_bytes())
        .position(|(e, a)| e != a)?;

    let (line, column) = line_and_column(expected.as_bytes(), offset);
    Some(Difference::new(
        DiffCategory::Content,
        &format!("line {}, column {}", line, column),
        line_at(expected.as_bytes(), offset),
        line_at(actual.as_bytes(), offset),
    ))
}

fn compare_xml(
    expected: &NormalizedResponse,
    actual: &NormalizedResponse,
) -> CompareResult<Option<Difference>> {
    let expected_tree = parse_side(expected, Side::Expected)?;
    let actual_tree = parse_side(actual, Side::Actual)?;
    if expected_tree == actual_tree {
        return Ok(None);
    }
    Ok(xml::first_difference(&expected_tree, &actual_tree))
}

fn parse_side(response: &NormalizedResponse, side: Side) -> CompareResult<xml::XmlElement> {
    let text = std::str::from_utf8(response.as_bytes())
        .map_err(|source| CompareError::InvalidUtf8 { side, source })?;
    xml::canonicalize(text).map_err(|source| CompareError::InvalidXml { side, source })
}

/// 1-based line and column of a byte offset
fn line_and_column(bytes: &[u8], offset: usize) -> (usize, usize) {
    let before = &bytes[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    (line, offset - line_start + 1)
}

fn line_at(bytes: &[u8], offset: usize) -> String {
    let start = bytes[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    let end = bytes[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |i| offset + i);
    String::from_utf8_lossy(&bytes[start..end]).into_owned()
}

fn excerpt(text: String) -> String {
    if text.chars().count() <= EXCERPT_LIMIT {
        return text;
    }
    let mut head: String = text.chars().take(EXCERPT_LIMIT).collect();
    head.push('…');
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(text: &str) -> NormalizedResponse {
        NormalizedResponse::from(text)
    }

    #[test]
    fn test_identical_literal_passes() {
        let text = response("label,nb_visits\nChrome,3\n");
        let verdict = compare(&text, &text.clone(), Some("csv"), None).unwrap();
        assert!(verdict.is_pass());
    }

    #[test]
    fn test_length_checked_first() {
        let expected = response("label,nb_visits\nChrome,3\n");
        let actual = response("label,nb_visits\nChrome,30\n");
        let verdict = compare(&expected, &actual, Some("csv"), Some("Browser report")).unwrap();

        let failure = verdict.failure().unwrap();
        assert_eq!(failure.difference.category, DiffCategory::Length);
        assert_eq!(failure.difference.expected, "25 bytes");
        assert_eq!(failure.difference.actual, "26 bytes");
        assert_eq!(failure.message.as_deref(), Some("Browser report"));
        assert_eq!(failure.expected, expected);
        assert_eq!(failure.actual, actual);
    }

    #[test]
    fn test_content_difference_located() {
        let expected = response("a,b\nChrome,3\n");
        let actual = response("a,b\nChrome,4\n");
        let verdict = compare(&expected, &actual, None, None).unwrap();

        let difference = &verdict.failure().unwrap().difference;
        assert_eq!(difference.category, DiffCategory::Content);
        assert_eq!(difference.path, "line 2, column 8");
        assert_eq!(difference.expected, "Chrome,3");
        assert_eq!(difference.actual, "Chrome,4");
    }

    #[test]
    fn test_xml_attribute_order_ignored() {
        let expected = response(r#"<result><row label="Chrome" nb_visits="3"/></result>"#);
        let actual = response(r#"<result><row nb_visits="3" label="Chrome"/></result>"#);

        assert!(compare(&expected, &actual, Some("xml"), None)
            .unwrap()
            .is_pass());
        assert!(!compare(&expected, &actual, Some("json"), None)
            .unwrap()
            .is_pass());
        assert!(!compare(&expected, &actual, None, None).unwrap().is_pass());
    }

    #[test]
    fn test_xml_whitespace_ignored() {
        let expected = response("<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<result>\n\t<row>\n\t\t<label>Chrome</label>\n\t</row>\n</result>");
        let actual = response("<result><row><label>Chrome</label></row></result>");
        assert!(compare(&expected, &actual, Some("xml"), None)
            .unwrap()
            .is_pass());
    }

    #[test]
    fn test_xml_difference_reported() {
        let expected = response("<result><row><nb_visits>3</nb_visits></row></result>");
        let actual = response("<result><row><nb_visits>4</nb_visits></row></result>");
        let verdict = compare(&expected, &actual, Some("xml"), None).unwrap();

        let difference = &verdict.failure().unwrap().difference;
        assert_eq!(difference.category, DiffCategory::Text);
        assert_eq!(difference.path, "/result/row[1]/nb_visits[1]/text()[1]");
    }

    #[test]
    fn test_invalid_xml_is_an_error() {
        let valid = response("<result/>");
        let broken = response("<result>");
        let err = compare(&valid, &broken, Some("xml"), None).unwrap_err();
        assert!(matches!(
            err,
            CompareError::InvalidXml {
                side: Side::Actual,
                ..
            }
        ));

        let binary = NormalizedResponse::canonical(vec![0xff, 0xfe]);
        let err = compare(&binary, &valid, Some("xml"), None).unwrap_err();
        assert!(matches!(
            err,
            CompareError::InvalidUtf8 {
                side: Side::Expected,
                ..
            }
        ));
    }

    #[test]
    fn test_binary_literal_comparison() {
        let expected = NormalizedResponse::canonical(vec![0x25, 0x50, 0xff, 0x00]);
        let actual = NormalizedResponse::canonical(vec![0x25, 0x50, 0xfe, 0x00]);
        let verdict = compare(&expected, &actual, Some("pdf"), None).unwrap();
        let difference = &verdict.failure().unwrap().difference;
        assert_eq!(difference.category, DiffCategory::Content);
        assert_eq!(difference.path, "line 1, column 3");
    }

    #[test]
    fn test_unified_diff_rendering() {
        let expected = response("one\ntwo\nthree\n");
        let actual = response("one\n2\nthree\n");
        let verdict = compare(&expected, &actual, None, None).unwrap();
        let diff = verdict.failure().unwrap().unified_diff();
        assert!(diff.contains("--- expected"));
        assert!(diff.contains("+++ actual"));
        assert!(diff.contains("-two"));
        assert!(diff.contains("+2"));
    }

    #[test]
    fn test_long_excerpts_truncated() {
        let difference = Difference::new(DiffCategory::Text, "/a", "x".repeat(500), "y");
        assert_eq!(difference.expected.chars().count(), EXCERPT_LIMIT + 1);
        assert!(difference.expected.ends_with('…'));
        assert_eq!(difference.actual, "y");
    }
}
