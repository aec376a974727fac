//! Reads a payload through a descriptor's field explanations.
//!
//! Explanation keys are paths such as `main.temp` or `weather[0].description`.
//! When a key is looked up on an array, the first element is used, so
//! `name.common` also resolves on list payloads like `[{"name": {...}}]`.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\[\]]*)((?:\[\d+\])*)$").expect("valid regex"));
static INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub path: String,
    pub explanation: String,
    pub value: Option<Value>,
}

pub fn annotate(payload: &Value, explanations: &IndexMap<String, String>) -> Vec<Annotation> {
    explanations
        .iter()
        .map(|(path, explanation)| Annotation {
            path: path.clone(),
            explanation: explanation.clone(),
            value: resolve(payload, path).cloned(),
        })
        .collect()
}

pub fn resolve<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        let caps = SEGMENT.captures(segment.trim())?;
        let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

        if !key.is_empty() {
            if let Value::Array(items) = current {
                current = items.first()?;
            }
            current = current.get(key)?;
        }

        let indices = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        for index in INDEX.captures_iter(indices) {
            let position: usize = index[1].parse().ok()?;
            current = current.get(position)?;
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_keys_and_indices() {
        let payload = json!({
            "main": { "temp": 280.32 },
            "weather": [{ "description": "scattered clouds" }]
        });
        assert_eq!(resolve(&payload, "main.temp"), Some(&json!(280.32)));
        assert_eq!(
            resolve(&payload, "weather[0].description"),
            Some(&json!("scattered clouds"))
        );
        assert_eq!(resolve(&payload, "weather[3].description"), None);
        assert_eq!(resolve(&payload, "wind.speed"), None);
    }

    #[test]
    fn reads_list_payloads_through_first_element() {
        let payload = json!([{ "name": { "common": "Brazil" }, "capital": ["Brasília"] }]);
        assert_eq!(resolve(&payload, "name.common"), Some(&json!("Brazil")));
        assert_eq!(resolve(&payload, "capital[0]"), Some(&json!("Brasília")));
    }

    #[test]
    fn rejects_malformed_paths() {
        let payload = json!({ "a": [1] });
        assert_eq!(resolve(&payload, "a[x]"), None);
        assert_eq!(resolve(&payload, "a]"), None);
    }

    #[test]
    fn annotate_keeps_unresolved_entries_in_listed_order() {
        let mut explanations = IndexMap::new();
        explanations.insert("length".to_string(), "Length".to_string());
        explanations.insert("fact".to_string(), "The fact".to_string());

        let annotations = annotate(&json!({ "fact": "x" }), &explanations);
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].path, "length");
        assert_eq!(annotations[0].value, None);
        assert_eq!(annotations[1].path, "fact");
        assert_eq!(annotations[1].value, Some(json!("x")));
    }
}
