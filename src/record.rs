//! Read-only view over a case record as delivered by the case data store.
//!
//! The record is kept as a JSON object: sections are looked up by key and the
//! static section schema decides what gets rendered, so unknown keys are
//! carried along untouched and simply ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReportError;

/// Key of the container OD-case records nest their summary sections in.
pub const OD_DETAILS_KEY: &str = "odDetails";

/// One insurance investigation case.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseRecord(Map<String, Value>);

impl CaseRecord {
    /// Wraps a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, ReportError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ReportError::InvalidRecord(format!(
                "expected a JSON object at the top level, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parses a record from JSON text.
    pub fn from_json_str(input: &str) -> Result<Self, ReportError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Returns the raw object backing the record.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Looks up a section by key.
    ///
    /// The root object wins; OD records keep some sections under
    /// [`OD_DETAILS_KEY`], which is consulted next. `null` counts as absent.
    pub fn section(&self, key: &str) -> Option<&Value> {
        non_null(self.0.get(key)).or_else(|| {
            self.0
                .get(OD_DETAILS_KEY)
                .and_then(Value::as_object)
                .and_then(|details| non_null(details.get(key)))
        })
    }

    /// Scalar text of a root-level field, if any.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(scalar_text)
    }

    /// Scalar text of `field` inside section `section`.
    pub fn section_text(&self, section: &str, field: &str) -> Option<String> {
        self.section(section)
            .and_then(|value| value.get(field))
            .and_then(scalar_text)
    }

    /// Identifier used in the output file name.
    pub fn case_id(&self) -> Option<String> {
        self.text("caseId")
            .or_else(|| self.text("_id"))
            .or_else(|| self.section_text("claimSummary", "claimNo"))
            .or_else(|| self.section_text("caseSummary", "claimNo"))
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Renders a scalar JSON value as display text.
///
/// Strings are trimmed, booleans become `Yes`/`No`, numbers keep their JSON
/// spelling. Empty strings, `null`, arrays and objects yield `None`.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Bool(true) => Some("Yes".to_owned()),
        Value::Bool(false) => Some("No".to_owned()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether a value carries nothing worth rendering.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.values().all(is_blank),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

const URL_KEYS: &[&str] = &["url", "imageUrl", "image", "src", "path"];
const FRONT_KEYS: &[&str] = &["front", "frontUrl", "frontImage"];
const BACK_KEYS: &[&str] = &["back", "backUrl", "backImage"];
const TITLE_KEYS: &[&str] = &["title", "caption", "name", "label"];

/// A reference to a remote image found inside a case record.
///
/// Either a bare URL string or an object carrying an image URL and/or the
/// front and back of a double-sided document, plus an optional title.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageRef {
    pub url: Option<String>,
    pub front: Option<String>,
    pub back: Option<String>,
    pub title: Option<String>,
}

impl ImageRef {
    /// Parses a single reference. Arrays are handled by [`ImageRef::parse_all`].
    pub fn parse(value: &Value) -> Option<Self> {
        let reference = match value {
            Value::String(_) => Self {
                url: url_text(value),
                ..Self::default()
            },
            Value::Object(map) => Self {
                url: first_url(map, URL_KEYS),
                front: first_url(map, FRONT_KEYS),
                back: first_url(map, BACK_KEYS),
                title: TITLE_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(scalar_text)),
            },
            _ => return None,
        };
        (reference.url.is_some() || reference.front.is_some() || reference.back.is_some())
            .then_some(reference)
    }

    /// Parses a value that may be a single reference or an array of them.
    pub fn parse_all(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items.iter().filter_map(Self::parse).collect(),
            other => Self::parse(other).into_iter().collect(),
        }
    }

    /// Every URL carried by the reference, main image first.
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        [&self.url, &self.front, &self.back]
            .into_iter()
            .filter_map(|url| url.as_deref())
    }
}

fn first_url(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| map.get(*key).and_then(url_text))
}

/// Accepts a URL string, or a nested `{ "url": ... }` object.
fn url_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Value::Object(map) => first_url(map, URL_KEYS),
        _ => None,
    }
}
