// Lenient rubric parsing
// Custom rubrics arrive from user files and older app versions, so every field is
// optional except the rubric id/name and at least one named criterion.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{Bareme, Criterion, CriterionType};
use crate::constants::{DEFAULT_CRITERION_STEP, DEFAULT_CRITERION_WEIGHT};
use crate::error::{NotationError, Result};
use crate::normalize::{bool_of, non_blank_of, number_of, object_of, string_of};

fn parse_criterion(raw: &Value, index: usize) -> Option<Criterion> {
    let row = raw.as_object()?;
    let name = non_blank_of(row, &["name"])?;

    // Unknown or missing types grade as numeric
    let criterion_type = string_of(row, &["type"])
        .and_then(|t| CriterionType::from_name(&t))
        .unwrap_or(CriterionType::Numeric);

    let step = number_of(row, &["step"])
        .filter(|s| *s > 0.0)
        .unwrap_or(DEFAULT_CRITERION_STEP);

    let options: Option<Vec<String>> = row
        .get("options")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty());

    let weight = number_of(row, &["weight"]).unwrap_or(DEFAULT_CRITERION_WEIGHT);

    Some(Criterion {
        id: non_blank_of(row, &["id"]).unwrap_or_else(|| format!("criterion-{}", index + 1)),
        name,
        description: string_of(row, &["description"]),
        criterion_type,
        min: number_of(row, &["min"]),
        max: number_of(row, &["max"]),
        step: Some(step),
        options,
        required: bool_of(row, &["required"]).unwrap_or(true),
        category: non_blank_of(row, &["category"]),
        weight,
    })
}

fn parse_colors(row: &Map<String, Value>) -> BTreeMap<String, String> {
    object_of(row, &["categoryColors", "category_colors"])
        .map(|colors| {
            colors
                .iter()
                .filter(|(k, _)| !k.trim().is_empty())
                .filter_map(|(k, v)| {
                    v.as_str()
                        .filter(|s| !s.trim().is_empty())
                        .map(|s| (k.clone(), s.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Build a rubric from arbitrary JSON.
/// Imported rubrics are never official and always get a recomputed total.
pub fn parse_bareme(raw: &Value) -> Result<Bareme> {
    let row = raw
        .as_object()
        .ok_or_else(|| NotationError::InvalidBareme("expected a JSON object".to_string()))?;

    let id = non_blank_of(row, &["id"])
        .ok_or_else(|| NotationError::InvalidBareme("missing id".to_string()))?;
    let name = non_blank_of(row, &["name"])
        .ok_or_else(|| NotationError::InvalidBareme(format!("bareme '{}' has no name", id)))?;

    let criteria: Vec<Criterion> = row
        .get("criteria")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| parse_criterion(item, index))
                .collect()
        })
        .unwrap_or_default();

    if criteria.is_empty() {
        return Err(NotationError::InvalidBareme(format!("bareme '{}' has no criteria", id)));
    }

    let mut bareme = Bareme::new(id, name, criteria);
    bareme.description = non_blank_of(row, &["description"]);
    bareme.hide_totals_until_all_scored =
        bool_of(row, &["hideTotalsUntilAllScored", "hide_totals_until_all_scored"]).unwrap_or(false);
    bareme.category_colors = parse_colors(row);
    if let Some(created_at) = string_of(row, &["createdAt", "created_at"]) {
        bareme.created_at = created_at;
    }
    if let Some(updated_at) = string_of(row, &["updatedAt", "updated_at"]) {
        bareme.updated_at = updated_at;
    }
    bareme.check()?;
    Ok(bareme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_defaults() {
        let raw = json!({
            "id": " custom ",
            "name": "Custom",
            "isOfficial": true,
            "criteria": [
                {"name": "Rythme", "type": "weird", "max": "8", "step": -1},
                {"id": "", "name": "Sync", "type": "slider", "max": 5, "required": false, "category": "  "},
                {"name": "   "},
                "not an object"
            ]
        });
        let bareme = parse_bareme(&raw).unwrap();
        assert_eq!(bareme.id, "custom");
        assert!(!bareme.is_official);
        assert_eq!(bareme.criteria().len(), 2);

        let first = &bareme.criteria()[0];
        assert_eq!(first.id, "criterion-1");
        assert_eq!(first.criterion_type, CriterionType::Numeric);
        assert_eq!(first.max, Some(8.0));
        assert_eq!(first.step, Some(0.5));
        assert!(first.required);

        let second = &bareme.criteria()[1];
        assert_eq!(second.id, "criterion-2");
        assert_eq!(second.criterion_type, CriterionType::Slider);
        assert!(!second.required);
        assert_eq!(second.category, None);

        assert_eq!(bareme.total_points(), 13.0);
    }

    #[test]
    fn test_parse_rejects_missing_identity_or_criteria() {
        assert!(parse_bareme(&json!({"name": "x", "criteria": [{"name": "a"}]})).is_err());
        assert!(parse_bareme(&json!({"id": "x", "criteria": [{"name": "a"}]})).is_err());
        assert!(parse_bareme(&json!({"id": "x", "name": "X", "criteria": []})).is_err());
        assert!(parse_bareme(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_colors_snake_case() {
        let raw = json!({
            "id": "c", "name": "C",
            "category_colors": {"A": "#112233", "": "#000000", "B": 4},
            "criteria": [{"name": "a", "category": "A"}]
        });
        let bareme = parse_bareme(&raw).unwrap();
        assert_eq!(bareme.category_colors.len(), 1);
        assert_eq!(bareme.category_colors.get("A").map(String::as_str), Some("#112233"));
    }
}
