// Judge import
// Reads another judge's project file and maps its notes onto this project's clips.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use super::normalize::normalize_note;
use super::{Clip, ImportedJudgeData};
use crate::bareme::Bareme;
use crate::constants::DEFAULT_IMPORTED_JUDGE_NAME;
use crate::error::{NotationError, Result};
use crate::normalize::{array_of, non_blank_of, object_of, string_of};
use crate::scoring::validate_criterion_value;

fn display_author_key(author: Option<&str>, display_name: &str) -> String {
    format!("{}|{}", author.unwrap_or("").to_lowercase(), display_name.to_lowercase())
}

/// Clip lookup for notes whose id is not one of ours
struct ClipMatcher<'a> {
    ids: HashMap<&'a str, &'a str>,
    by_file_name: HashMap<String, &'a str>,
    by_display_author: HashMap<String, &'a str>,
}

impl<'a> ClipMatcher<'a> {
    fn new(clips: &'a [Clip]) -> Self {
        Self {
            ids: clips.iter().map(|c| (c.id.as_str(), c.id.as_str())).collect(),
            by_file_name: clips.iter().map(|c| (c.file_name.to_lowercase(), c.id.as_str())).collect(),
            by_display_author: clips
                .iter()
                .map(|c| (display_author_key(c.author.as_deref(), &c.display_name), c.id.as_str()))
                .collect(),
        }
    }

    /// Same id, else same file name, else same `author|displayName` (all case-insensitive
    /// except the id)
    fn resolve(&self, source_id: &str, imported_clips: &HashMap<String, ImportedClip>) -> Option<&'a str> {
        if let Some(id) = self.ids.get(source_id) {
            return Some(*id);
        }
        let clip = imported_clips.get(source_id)?;
        self.by_file_name
            .get(&clip.file_name.to_lowercase())
            .or_else(|| {
                self.by_display_author
                    .get(&display_author_key(clip.author.as_deref(), &clip.display_name))
            })
            .copied()
    }
}

struct ImportedClip {
    file_name: String,
    display_name: String,
    author: Option<String>,
}

fn imported_clip_index(root: &serde_json::Map<String, Value>) -> HashMap<String, ImportedClip> {
    array_of(root, &["clips"])
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|row| {
                    let id = string_of(row, &["id"])?;
                    Some((
                        id,
                        ImportedClip {
                            file_name: string_of(row, &["fileName", "file_name"]).unwrap_or_default(),
                            display_name: string_of(row, &["displayName", "display_name"]).unwrap_or_default(),
                            author: string_of(row, &["author"]),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Build an imported judge from another judge's project JSON.
///
/// Notes that match none of `current_clips`, or that carry no `scores` object, are
/// dropped; an import left without any note is rejected.
pub fn import_judge(raw: &Value, current_clips: &[Clip]) -> Result<ImportedJudgeData> {
    let root = raw
        .as_object()
        .ok_or_else(|| NotationError::ImportRejected("expected a JSON object".to_string()))?;

    let judge_name = object_of(root, &["project"])
        .and_then(|project| non_blank_of(project, &["judgeName", "judge_name"]))
        .or_else(|| non_blank_of(root, &["judgeName"]))
        .unwrap_or_else(|| DEFAULT_IMPORTED_JUDGE_NAME.to_string());

    let notes_raw = object_of(root, &["notes"])
        .ok_or_else(|| NotationError::ImportRejected("no notes in file".to_string()))?;

    let matcher = ClipMatcher::new(current_clips);
    let imported_clips = imported_clip_index(root);

    let mut notes = BTreeMap::new();
    for (source_id, value) in notes_raw {
        let Some(target_id) = matcher.resolve(source_id, &imported_clips) else {
            log::debug!("Imported note for unknown clip {} skipped", source_id);
            continue;
        };
        let has_scores = value.get("scores").map(Value::is_object).unwrap_or(false);
        if !has_scores {
            continue;
        }
        if let Some(mut note) = normalize_note(target_id, value) {
            note.clip_id = target_id.to_string();
            notes.insert(target_id.to_string(), note);
        }
    }

    if notes.is_empty() {
        return Err(NotationError::ImportRejected(
            "the file has no usable notes for this project".to_string(),
        ));
    }

    log::info!("Imported judge '{}' with {} notes", judge_name, notes.len());
    Ok(ImportedJudgeData { judge_name, notes })
}

/// Validation problem found in an imported score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAuditEntry {
    pub clip_id: String,
    pub criterion_id: String,
    pub errors: Vec<String>,
}

/// Validate imported values as they were written, without clamping.
/// Scores for criteria the rubric does not define are ignored.
pub fn audit_imported_judge(judge: &ImportedJudgeData, bareme: &Bareme) -> Vec<ImportAuditEntry> {
    let mut out = Vec::new();
    for (clip_id, note) in &judge.notes {
        for criterion in bareme.criteria() {
            let Some(score) = note.scores.get(&criterion.id) else {
                continue;
            };
            let result = validate_criterion_value(Some(&score.value), criterion);
            if !result.is_valid {
                out.push(ImportAuditEntry {
                    clip_id: clip_id.clone(),
                    criterion_id: criterion.id.clone(),
                    errors: result.errors,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bareme::Criterion;
    use crate::scoring::ScoreValue;
    use serde_json::json;

    fn clips() -> Vec<Clip> {
        let mut a = Clip::from_file("Kai-Big_Clip.mp4", "/c/Kai-Big_Clip.mp4", 0);
        a.id = "local-a".to_string();
        let mut b = Clip::from_file("Mio-Other.mp4", "/c/Mio-Other.mp4", 1);
        b.id = "local-b".to_string();
        let mut c = Clip::from_file("Zed-Third.mp4", "/c/Zed-Third.mp4", 2);
        c.id = "local-c".to_string();
        vec![a, b, c]
    }

    #[test]
    fn test_clip_matching_strategies() {
        let raw = json!({
            "project": {"judge_name": "Lee"},
            "clips": [
                {"id": "x1", "fileName": "KAI-BIG_CLIP.MP4"},
                {"id": "x2", "fileName": "renamed.mp4", "displayName": "other", "author": "MIO"},
                {"id": "x3", "fileName": "nothing.mp4", "displayName": "Nope"}
            ],
            "notes": {
                "x1": {"scores": {"a": {"value": 4, "isValid": true}}},
                "x2": {"scores": {"a": {"value": [1, 2]}}},
                "x3": {"scores": {"a": {"value": 1}}},
                "local-c": {"textNotes": "no scores"},
                "unknown": {"scores": {}}
            }
        });

        let judge = import_judge(&raw, &clips()).unwrap();
        assert_eq!(judge.judge_name, "Lee");
        let ids: Vec<&str> = judge.notes.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["local-a", "local-b"]);
        assert_eq!(judge.notes["local-a"].clip_id, "local-a");
        assert_eq!(judge.notes["local-b"].scores["a"].value, ScoreValue::Number(0.0));
        assert!(judge.notes["local-b"].scores["a"].is_valid);
    }

    #[test]
    fn test_default_name_and_direct_id() {
        let raw = json!({"notes": {"local-c": {"scores": {"a": {"value": 2, "isValid": false}}}}});
        let judge = import_judge(&raw, &clips()).unwrap();
        assert_eq!(judge.judge_name, DEFAULT_IMPORTED_JUDGE_NAME);
        assert!(!judge.notes["local-c"].scores["a"].is_valid);
    }

    #[test]
    fn test_rejects_unusable_files() {
        assert!(import_judge(&json!("text"), &clips()).is_err());
        assert!(import_judge(&json!({"project": {}}), &clips()).is_err());
        let err = import_judge(&json!({"notes": {"zzz": {"scores": {}}}}), &clips()).unwrap_err();
        assert!(matches!(err, NotationError::ImportRejected(_)));
    }

    #[test]
    fn test_audit_reports_unclamped_values() {
        let bareme = Bareme::new("b", "B", vec![Criterion::numeric("a", "A", 5.0), Criterion::numeric("b", "B", 5.0)]);
        let raw = json!({
            "notes": {
                "local-a": {"scores": {"a": {"value": 7}, "b": {"value": 3}, "extra": {"value": 99}}},
                "local-b": {"scores": {"b": {"value": "abc"}}}
            }
        });
        let judge = import_judge(&raw, &clips()).unwrap();
        let audit = audit_imported_judge(&judge, &bareme);

        assert_eq!(audit.len(), 2);
        assert_eq!(audit[0].clip_id, "local-a");
        assert_eq!(audit[0].criterion_id, "a");
        assert_eq!(audit[0].errors, vec!["maximum: 5".to_string()]);
        assert_eq!(audit[1].clip_id, "local-b");
        assert_eq!(audit[1].errors, vec!["value must be a number".to_string()]);
    }
}
