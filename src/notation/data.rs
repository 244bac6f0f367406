// Persisted note shape
// Validation messages are never persisted; they are re-derived on the next edit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::{ScoreEntry, ScoreSheet, ScoreValue};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScoreData {
    #[serde(default, alias = "criterion_id")]
    pub criterion_id: String,
    pub value: ScoreValue,
    #[serde(default = "default_true", alias = "is_valid")]
    pub is_valid: bool,
}

/// Serializable note, as written into project files and sent to the detached window.
/// Imported judges' notes use the same shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    #[serde(default, alias = "clip_id")]
    pub clip_id: String,
    #[serde(default, alias = "bareme_id")]
    pub bareme_id: String,
    #[serde(default)]
    pub scores: BTreeMap<String, CriterionScoreData>,
    #[serde(default, alias = "text_notes")]
    pub text_notes: String,
    #[serde(default, alias = "criterion_notes")]
    pub criterion_notes: BTreeMap<String, String>,
    #[serde(default, alias = "category_notes")]
    pub category_notes: BTreeMap<String, String>,
    #[serde(default, alias = "final_score")]
    pub final_score: f64,
    #[serde(default, alias = "scored_at", skip_serializing_if = "Option::is_none")]
    pub scored_at: Option<String>,
}

impl ScoreSheet for NoteData {
    fn score_entry(&self, criterion_id: &str) -> Option<ScoreEntry<'_>> {
        self.scores.get(criterion_id).map(|score| ScoreEntry {
            value: &score.value,
            is_valid: score.is_valid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_fields_accepted() {
        let json = r#"{
            "clip_id": "c1", "bareme_id": "b",
            "scores": {"a": {"criterion_id": "a", "value": 7.5}},
            "text_notes": "ok", "final_score": 7.5
        }"#;
        let data: NoteData = serde_json::from_str(json).unwrap();
        assert_eq!(data.clip_id, "c1");
        assert_eq!(data.text_notes, "ok");
        assert!(data.scores["a"].is_valid);
        assert_eq!(data.scores["a"].value, ScoreValue::Number(7.5));

        let out = serde_json::to_value(&data).unwrap();
        assert_eq!(out["clipId"], "c1");
        assert_eq!(out["scores"]["a"]["isValid"], true);
        assert!(out.get("scoredAt").is_none());
    }
}
