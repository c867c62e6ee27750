//! Reply parsing utilities for the Yacode protocol.
//!
//! Replies are JSON. The controller is not consistent about field names
//! across firmware versions, so parsing here is tolerant: elements that do
//! not fit are skipped instead of failing the whole reply.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::Result;

/// Preferred field holding a template name.
const TEMPLATE_NAME_FIELD: &str = "template_name";

/// Extracts a name from one reply element.
///
/// Uses `template_name` when present, otherwise the first string field, in
/// reply order, whose key contains "name" (case-insensitive).
fn element_name(object: &Map<String, Value>) -> Option<&str> {
    if let Some(Value::String(name)) = object.get(TEMPLATE_NAME_FIELD) {
        return Some(name);
    }

    object.iter().find_map(|(key, value)| match value {
        Value::String(name) if key.to_ascii_lowercase().contains("name") => Some(name.as_str()),
        _ => None,
    })
}

/// Parses a JSON array of objects into a list of template names.
///
/// Names are deduplicated, keeping first-seen order. Non-object elements,
/// elements without a name-like string field and blank names are skipped.
///
/// # Errors
///
/// Returns an error only if the payload is not JSON at all. A JSON value
/// that is not an array yields an empty list.
pub fn parse_template_names(payload: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(payload)?;

    let Value::Array(elements) = value else {
        tracing::debug!("template reply is not an array");
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for element in &elements {
        let Some(name) = element.as_object().and_then(element_name) else {
            tracing::trace!("skipping template element without a name: {}", element);
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_owned()) {
            names.push(name.to_owned());
        }
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_and_skip_malformed() {
        let names = parse_template_names(
            r#"[{"template_name":"100.ym"},{"template_name":"100.ym"},{"foo":"bar"}]"#,
        )
        .unwrap();
        assert_eq!(names, vec!["100.ym"]);
    }

    #[test]
    fn test_fallback_name_field() {
        let names = parse_template_names(
            r#"[{"id":1,"fileName":"a.ym"},{"name":"b.ym"},{"template_name":"c.ym","name":"x"}]"#,
        )
        .unwrap();
        assert_eq!(names, vec!["a.ym", "b.ym", "c.ym"]);
    }

    #[test]
    fn test_fallback_follows_field_order() {
        let names =
            parse_template_names(r#"[{"name":"x.ym","fileName":"y.ym"},{"zName":"z.ym","aName":"a.ym"}]"#)
                .unwrap();
        assert_eq!(names, vec!["x.ym", "z.ym"]);
    }

    #[test]
    fn test_skips_non_objects_and_non_strings() {
        let names =
            parse_template_names(r#"[1,"loose",null,{"name":42},{"name":"  "},{"name":"ok.ym"}]"#)
                .unwrap();
        assert_eq!(names, vec!["ok.ym"]);
    }

    #[test]
    fn test_non_array_is_empty() {
        assert!(parse_template_names(r#"{"template_name":"100.ym"}"#)
            .unwrap()
            .is_empty());
        assert!(parse_template_names("[]").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_template_names("not json").is_err());
        assert!(parse_template_names("").is_err());
    }
}
