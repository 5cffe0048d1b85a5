//! Parsing of card records supplied as JSON, either a file holding an array of
//! records or a single record embedded with an existing deck.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::template::FieldSource;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SampleError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("JSON must be an array of card objects")]
    NotAnArray,

    #[error("JSON must be an array of card objects, but the array is empty")]
    EmptyArray,

    #[error("card #{0} is not a JSON object")]
    ElementNotObject(usize),

    #[error("sample data must be a JSON object")]
    NotAnObject,
}

/// One representative card record used to drive the template preview.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleRecord(BTreeMap<String, String>);

impl SampleRecord {
    #[must_use]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self(
            object
                .iter()
                .map(|(k, v)| (k.clone(), value_text(v)))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FieldSource for SampleRecord {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SampleRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Text form of a JSON field value: strings verbatim, `null` as empty,
/// everything else as compact JSON.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parses file content that must be a non-empty JSON array.
///
/// # Errors
///
/// `InvalidJson` for malformed text, `NotAnArray` for any other JSON shape,
/// `EmptyArray` for `[]`.
pub fn parse_record_array(text: &str) -> Result<Vec<Value>, SampleError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SampleError::InvalidJson(e.to_string()))?;
    match value {
        Value::Array(items) if items.is_empty() => Err(SampleError::EmptyArray),
        Value::Array(items) => Ok(items),
        _ => Err(SampleError::NotAnArray),
    }
}

/// Takes the first record of a JSON array file as the preview sample.
///
/// ```
/// # use deckflow_core::sample::{sample_from_file, SampleError};
/// let sample = sample_from_file(r#"[{"front":"犬","back":"dog"}]"#).unwrap();
/// assert_eq!(sample.get("front"), Some("犬"));
///
/// assert_eq!(sample_from_file("[]").unwrap_err(), SampleError::EmptyArray);
/// ```
///
/// # Errors
///
/// Any error of [`parse_record_array`], or `ElementNotObject(0)` when the
/// first element is not an object.
pub fn sample_from_file(text: &str) -> Result<SampleRecord, SampleError> {
    let items = parse_record_array(text)?;
    match items.first() {
        Some(Value::Object(object)) => Ok(SampleRecord::from_object(object)),
        _ => Err(SampleError::ElementNotObject(0)),
    }
}

/// Parses a single embedded record.
///
/// # Errors
///
/// `InvalidJson` for malformed text, `NotAnObject` for any non-object value.
pub fn sample_from_embedded(text: &str) -> Result<SampleRecord, SampleError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SampleError::InvalidJson(e.to_string()))?;
    match value {
        Value::Object(object) => Ok(SampleRecord::from_object(&object)),
        _ => Err(SampleError::NotAnObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_element_wins() {
        let sample =
            sample_from_file(r#"[{"front":"犬"},{"front":"猫"}]"#).unwrap();
        assert_eq!(sample.get("front"), Some("犬"));
        assert_eq!(sample.len(), 1);
    }

    #[test]
    fn each_shape_failure_has_its_own_error() {
        assert!(matches!(
            sample_from_file("{not json"),
            Err(SampleError::InvalidJson(_))
        ));
        assert_eq!(
            sample_from_file(r#"{"front":"犬"}"#).unwrap_err(),
            SampleError::NotAnArray
        );
        assert_eq!(sample_from_file("[]").unwrap_err(), SampleError::EmptyArray);
        assert_eq!(
            sample_from_file("[1, 2]").unwrap_err(),
            SampleError::ElementNotObject(0)
        );
    }

    #[test]
    fn array_errors_mention_card_objects() {
        assert_eq!(
            SampleError::NotAnArray.to_string(),
            "JSON must be an array of card objects"
        );
        assert!(
            SampleError::EmptyArray
                .to_string()
                .starts_with("JSON must be an array of card objects")
        );
    }

    #[test]
    fn embedded_record_must_be_an_object() {
        let sample = sample_from_embedded(r#"{"front":"犬","strokes":4}"#).unwrap();
        assert_eq!(sample.get("strokes"), Some("4"));

        assert_eq!(
            sample_from_embedded("[]").unwrap_err(),
            SampleError::NotAnObject
        );
        assert!(matches!(
            sample_from_embedded(""),
            Err(SampleError::InvalidJson(_))
        ));
    }

    #[test]
    fn value_text_flattens_nested_values() {
        let value: Value = serde_json::from_str(r#"{"tags":["a","b"]}"#).unwrap();
        assert_eq!(value_text(&value["tags"]), r#"["a","b"]"#);
        assert_eq!(value_text(&Value::Null), "");
    }
}
