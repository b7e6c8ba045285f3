//! Structural view of an XML document for attribute-order and
//! whitespace-insensitive comparison.
//!
//! Two documents are equal when their element trees match: names are compared
//! by namespace and local name, attributes as an unordered map, text literally.
//! Whitespace-only text, comments and processing instructions are dropped.
//! Child elements keep their document order.

use crate::compare::{DiffCategory, Difference};
use std::collections::BTreeMap;
use std::fmt;

/// Namespace-qualified name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: QName,
    pub attributes: BTreeMap<QName, String>,
    pub children: Vec<XmlNode>,
}

/// Parse `text` into its canonical element tree
pub fn canonicalize(text: &str) -> Result<XmlElement, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(text, options)?;
    Ok(build_element(document.root_element()))
}

fn build_element(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let tag = node.tag_name();
    let attributes = node
        .attributes()
        .map(|attr| {
            (
                QName::new(attr.namespace(), attr.name()),
                attr.value().to_string(),
            )
        })
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(XmlNode::Element(build_element(child)));
        } else if child.is_text() {
            let text = child.text().unwrap_or("");
            if text.trim().is_empty() {
                continue;
            }
            // Adjacent text can appear once comments between them are dropped
            match children.last_mut() {
                Some(XmlNode::Text(previous)) => previous.push_str(text),
                _ => children.push(XmlNode::Text(text.to_string())),
            }
        }
    }

    XmlElement {
        name: QName::new(tag.namespace(), tag.name()),
        attributes,
        children,
    }
}

/// Locate the first structural difference between two trees
pub fn first_difference(expected: &XmlElement, actual: &XmlElement) -> Option<Difference> {
    let path = format!("/{}", expected.name);
    diff_elements(&path, expected, actual)
}

fn diff_elements(path: &str, expected: &XmlElement, actual: &XmlElement) -> Option<Difference> {
    if expected.name != actual.name {
        return Some(Difference::new(
            DiffCategory::Element,
            path,
            expected.name.to_string(),
            actual.name.to_string(),
        ));
    }

    if let Some(diff) = diff_attributes(path, expected, actual) {
        return Some(diff);
    }

    let mut seen: BTreeMap<&QName, usize> = BTreeMap::new();
    let mut text_index = 0;
    for (exp_child, act_child) in expected.children.iter().zip(&actual.children) {
        let child_path = match exp_child {
            XmlNode::Element(element) => {
                let index = seen.entry(&element.name).or_insert(0);
                *index += 1;
                format!("{}/{}[{}]", path, element.name, index)
            }
            XmlNode::Text(_) => {
                text_index += 1;
                format!("{}/text()[{}]", path, text_index)
            }
        };

        let diff = match (exp_child, act_child) {
            (XmlNode::Element(e), XmlNode::Element(a)) => diff_elements(&child_path, e, a),
            (XmlNode::Text(e), XmlNode::Text(a)) if e != a => Some(Difference::new(
                DiffCategory::Text,
                &child_path,
                e.clone(),
                a.clone(),
            )),
            (XmlNode::Text(_), XmlNode::Text(_)) => None,
            (e, a) => Some(Difference::new(
                DiffCategory::Element,
                &child_path,
                describe(e),
                describe(a),
            )),
        };
        if diff.is_some() {
            return diff;
        }
    }

    let (expected_len, actual_len) = (expected.children.len(), actual.children.len());
    if expected_len > actual_len {
        return Some(Difference::new(
            DiffCategory::Missing,
            path,
            describe(&expected.children[actual_len]),
            "(missing)",
        ));
    }
    if actual_len > expected_len {
        return Some(Difference::new(
            DiffCategory::Extra,
            path,
            "(not present)",
            describe(&actual.children[expected_len]),
        ));
    }
    None
}

fn diff_attributes(path: &str, expected: &XmlElement, actual: &XmlElement) -> Option<Difference> {
    for (name, exp_value) in &expected.attributes {
        let attr_path = format!("{}/@{}", path, name);
        match actual.attributes.get(name) {
            Some(act_value) if act_value != exp_value => {
                return Some(Difference::new(
                    DiffCategory::Attribute,
                    &attr_path,
                    exp_value.clone(),
                    act_value.clone(),
                ));
            }
            Some(_) => {}
            None => {
                return Some(Difference::new(
                    DiffCategory::Missing,
                    &attr_path,
                    exp_value.clone(),
                    "(missing)",
                ));
            }
        }
    }

    actual
        .attributes
        .iter()
        .find(|(name, _)| !expected.attributes.contains_key(*name))
        .map(|(name, value)| {
            Difference::new(
                DiffCategory::Extra,
                &format!("{}/@{}", path, name),
                "(not present)",
                value.clone(),
            )
        })
}

fn describe(node: &XmlNode) -> String {
    match node {
        XmlNode::Element(element) => format!("<{}>", element.name),
        XmlNode::Text(text) => format!("text {:?}", text),
    }
}
