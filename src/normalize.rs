// Lenient JSON field access
// Persisted files come in camelCase or legacy snake_case, sometimes with mistyped
// fields. These helpers look up the first usable spelling and coerce where possible;
// callers supply the default when nothing matches.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// First non-null value among the given key spellings
pub fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| obj.get(*k)).find(|v| !v.is_null())
}

/// Coerce a JSON value to a finite number (numbers and numeric strings, `,` accepted as decimal point)
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// String field (only actual strings; no coercion)
pub fn string_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| v.as_str().map(str::to_string))
}

/// String field that is non-empty once trimmed
pub fn non_blank_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn number_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(coerce_number)
}

pub fn bool_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(Value::as_bool)
}

pub fn object_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(Value::as_object)
}

pub fn array_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter().filter_map(|k| obj.get(*k)).find_map(Value::as_array)
}

/// String-to-string map, dropping blank keys and non-string values
pub fn string_map_of(obj: &Map<String, Value>, keys: &[&str]) -> BTreeMap<String, String> {
    object_of(obj, keys)
        .map(|map| {
            map.iter()
                .filter(|(k, _)| !k.trim().is_empty())
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pick_prefers_first_spelling() {
        let value = json!({"judgeName": "A", "judge_name": "B"});
        let obj = value.as_object().unwrap();
        assert_eq!(string_of(obj, &["judgeName", "judge_name"]).as_deref(), Some("A"));
        assert_eq!(string_of(obj, &["judge_name", "judgeName"]).as_deref(), Some("B"));
    }

    #[test]
    fn test_coerce_number_variants() {
        assert_eq!(coerce_number(&json!(7.5)), Some(7.5));
        assert_eq!(coerce_number(&json!("7,5")), Some(7.5));
        assert_eq!(coerce_number(&json!(" 3 ")), Some(3.0));
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn test_snake_case_fallback_and_mistyped_field() {
        let value = json!({"autoSave": "yes", "auto_save": false, "volume": "80"});
        let obj = value.as_object().unwrap();
        assert_eq!(bool_of(obj, &["autoSave", "auto_save"]), Some(false));
        assert_eq!(number_of(obj, &["volume"]), Some(80.0));
    }

    #[test]
    fn test_string_map_filters() {
        let value = json!({"notes": {"a": "x", " ": "blank", "b": 3}});
        let obj = value.as_object().unwrap();
        let map = string_map_of(obj, &["notes"]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("a").map(String::as_str), Some("x"));
    }
}
