// Project file normalization
// Old and foreign project files are opened rather than rejected: every field accepts its
// camelCase or snake_case spelling and falls back to a default when missing or mistyped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{
    clamp_thumbnail_time, parse_clip_name, Clip, ImportedJudgeData, Project, ProjectFile, ProjectSettings,
};
use crate::bareme::sanitize_color;
use crate::constants::{DEFAULT_PROJECT_NAME, FALLBACK_COLOR, PROJECT_FORMAT_VERSION};
use crate::error::{NotationError, Result};
use crate::normalize::{
    array_of, bool_of, non_blank_of, number_of, object_of, pick, string_map_of, string_of,
};
use crate::notation::{CriterionScoreData, NoteData};
use crate::scoring::ScoreValue;

fn empty_map() -> Map<String, Value> {
    Map::new()
}

/// Scalar values are kept as-is; anything else reads as 0
pub fn normalize_score_value(raw: Option<&Value>) -> ScoreValue {
    match raw {
        Some(Value::Number(n)) => n.as_f64().map(ScoreValue::Number).unwrap_or(ScoreValue::Number(0.0)),
        Some(Value::String(s)) => ScoreValue::Text(s.clone()),
        Some(Value::Bool(b)) => ScoreValue::Bool(*b),
        _ => ScoreValue::Number(0.0),
    }
}

fn normalize_scores(row: &Map<String, Value>) -> BTreeMap<String, CriterionScoreData> {
    let Some(scores) = object_of(row, &["scores"]) else {
        return BTreeMap::new();
    };
    scores
        .iter()
        .filter(|(id, _)| !id.trim().is_empty())
        .filter_map(|(id, raw)| {
            let score = raw.as_object()?;
            Some((
                id.clone(),
                CriterionScoreData {
                    criterion_id: non_blank_of(score, &["criterionId", "criterion_id"]).unwrap_or_else(|| id.clone()),
                    value: normalize_score_value(score.get("value")),
                    is_valid: bool_of(score, &["isValid", "is_valid"]) != Some(false),
                },
            ))
        })
        .collect()
}

/// One persisted note; `None` when the entry is not an object
pub fn normalize_note(clip_id: &str, raw: &Value) -> Option<NoteData> {
    let row = raw.as_object()?;
    Some(NoteData {
        clip_id: non_blank_of(row, &["clipId", "clip_id"]).unwrap_or_else(|| clip_id.to_string()),
        bareme_id: string_of(row, &["baremeId", "bareme_id"]).unwrap_or_default(),
        scores: normalize_scores(row),
        text_notes: string_of(row, &["textNotes", "text_notes"]).unwrap_or_default(),
        criterion_notes: string_map_of(row, &["criterionNotes", "criterion_notes"]),
        category_notes: string_map_of(row, &["categoryNotes", "category_notes"]),
        final_score: number_of(row, &["finalScore", "final_score"]).unwrap_or(0.0),
        scored_at: non_blank_of(row, &["scoredAt", "scored_at"]),
    })
}

pub fn normalize_notes(raw: Option<&Map<String, Value>>) -> BTreeMap<String, NoteData> {
    raw.map(|notes| {
        notes
            .iter()
            .filter_map(|(clip_id, value)| normalize_note(clip_id, value).map(|n| (clip_id.clone(), n)))
            .collect()
    })
    .unwrap_or_default()
}

/// Imported judges; entries without a judge name are dropped
pub fn normalize_imported_judges(items: &[Value]) -> Vec<ImportedJudgeData> {
    items
        .iter()
        .filter_map(|item| {
            let row = item.as_object()?;
            let judge_name = non_blank_of(row, &["judgeName", "judge_name"])?;
            Some(ImportedJudgeData {
                judge_name,
                notes: normalize_notes(object_of(row, &["notes"])),
            })
        })
        .collect()
}

fn normalize_settings(raw: &Map<String, Value>) -> ProjectSettings {
    let defaults = ProjectSettings::default();
    let judge_colors = string_map_of(raw, &["judgeColors", "judge_colors"])
        .into_iter()
        .map(|(judge, color)| (judge, sanitize_color(Some(color.as_str()), FALLBACK_COLOR)))
        .collect();

    ProjectSettings {
        auto_save: bool_of(raw, &["autoSave", "auto_save"]).unwrap_or(defaults.auto_save),
        auto_save_interval: number_of(raw, &["autoSaveInterval", "auto_save_interval"])
            .unwrap_or(defaults.auto_save_interval),
        default_playback_speed: number_of(raw, &["defaultPlaybackSpeed", "default_playback_speed"])
            .unwrap_or(defaults.default_playback_speed),
        default_volume: number_of(raw, &["defaultVolume", "default_volume"]).unwrap_or(defaults.default_volume),
        judge_colors,
        hide_final_score_until_end: bool_of(raw, &["hideFinalScoreUntilEnd", "hide_final_score_until_end"])
            .unwrap_or(defaults.hide_final_score_until_end),
        hide_totals: bool_of(raw, &["hideTotals", "hide_totals"]).unwrap_or(defaults.hide_totals),
        show_miniatures: bool_of(raw, &["showMiniatures", "show_miniatures"]).unwrap_or(defaults.show_miniatures),
        show_add_row_button: bool_of(raw, &["showAddRowButton", "show_add_row_button"])
            .unwrap_or(defaults.show_add_row_button),
        thumbnail_default_time_sec: clamp_thumbnail_time(
            number_of(raw, &["thumbnailDefaultTimeSec", "thumbnail_default_time_sec"])
                .unwrap_or(defaults.thumbnail_default_time_sec),
        ),
    }
}

fn normalize_project(raw: &Map<String, Value>, root_bareme_id: Option<String>) -> Project {
    let now = chrono::Utc::now().to_rfc3339();
    let empty = empty_map();
    let settings = object_of(raw, &["settings"]).unwrap_or(&empty);

    Project {
        id: non_blank_of(raw, &["id"]).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: non_blank_of(raw, &["name"]).unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
        judge_name: non_blank_of(raw, &["judgeName", "judge_name"]).unwrap_or_default(),
        created_at: non_blank_of(raw, &["createdAt", "created_at"]).unwrap_or_else(|| now.clone()),
        updated_at: non_blank_of(raw, &["updatedAt", "updated_at"]).unwrap_or(now),
        bareme_id: non_blank_of(raw, &["baremeId", "bareme_id"])
            .or(root_bareme_id)
            .unwrap_or_default(),
        clips_folder_path: non_blank_of(raw, &["clipsFolderPath", "clips_folder_path"]).unwrap_or_default(),
        settings: normalize_settings(settings),
        file_path: non_blank_of(raw, &["filePath", "file_path"]),
    }
}

fn normalize_clip(raw: &Value, index: usize) -> Option<Clip> {
    let row = raw.as_object()?;
    let file_name = non_blank_of(row, &["fileName", "file_name"]).unwrap_or_default();
    let parsed = parse_clip_name(&file_name);

    let audio_track_count = number_of(row, &["audioTrackCount", "audio_track_count"])
        .filter(|n| *n >= 1.0)
        .map(|n| n.floor() as u32)
        .unwrap_or(1);

    Some(Clip {
        id: non_blank_of(row, &["id"]).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        file_path: non_blank_of(row, &["filePath", "file_path"]).unwrap_or_default(),
        display_name: non_blank_of(row, &["displayName", "display_name"]).unwrap_or(parsed.display_name),
        author: non_blank_of(row, &["author"]).or(parsed.author),
        duration: number_of(row, &["duration"]).unwrap_or(0.0),
        has_internal_subtitles: bool_of(row, &["hasInternalSubtitles", "has_internal_subtitles"]).unwrap_or(false),
        audio_track_count,
        scored: bool_of(row, &["scored"]).unwrap_or(false),
        order: number_of(row, &["order"]).map(|n| n.round() as i64).unwrap_or(index as i64),
        thumbnail_time: number_of(row, &["thumbnailTime", "thumbnail_time"]).filter(|t| *t >= 0.0),
        file_name,
    })
}

/// Build a `ProjectFile` from any JSON object
pub fn normalize_project_file(raw: &Value) -> Result<ProjectFile> {
    let root = raw
        .as_object()
        .ok_or_else(|| NotationError::InvalidProject("expected a JSON object".to_string()))?;

    let root_bareme_id = non_blank_of(root, &["baremeId", "bareme_id"]);
    let empty = empty_map();
    let project = normalize_project(object_of(root, &["project"]).unwrap_or(&empty), root_bareme_id.clone());

    let clips = array_of(root, &["clips"])
        .map(|items| items.iter().enumerate().filter_map(|(i, c)| normalize_clip(c, i)).collect())
        .unwrap_or_default();

    let imported_judges = array_of(root, &["importedJudges", "imported_judges"])
        .map(|items| normalize_imported_judges(items))
        .unwrap_or_default();

    Ok(ProjectFile {
        version: pick(root, &["version"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| PROJECT_FORMAT_VERSION.to_string()),
        bareme_id: root_bareme_id.unwrap_or_else(|| project.bareme_id.clone()),
        project,
        clips,
        notes: normalize_notes(object_of(root, &["notes"])),
        imported_judges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_snake_case_project() {
        let raw = json!({
            "bareme_id": "official-amv-2026",
            "project": {
                "name": "Convention",
                "judge_name": "Sam",
                "updated_at": "2025-01-02T00:00:00Z",
                "settings": {
                    "hide_totals": true,
                    "thumbnail_default_time_sec": 9999,
                    "judge_colors": {"Sam": "#ABCDEF", "Lee": "blue"}
                }
            },
            "clips": [
                {"id": "c1", "file_name": "Kai-Big_Clip.mp4", "audio_track_count": 0, "order": 3},
                {"file_name": "loose.mp4"},
                "garbage"
            ],
            "notes": {
                "c1": {
                    "clip_id": "c1",
                    "scores": {"rythme-synchro": {"value": "8", "is_valid": false}, "x": {"value": null}},
                    "text_notes": "0:10 nice",
                    "final_score": "8"
                }
            },
            "imported_judges": [
                {"judge_name": "Lee", "notes": {"c1": {"scores": {}}}},
                {"judge_name": "  ", "notes": {}}
            ]
        });

        let file = normalize_project_file(&raw).unwrap();
        assert_eq!(file.bareme_id, "official-amv-2026");
        assert_eq!(file.project.bareme_id, "official-amv-2026");
        assert_eq!(file.project.judge_name, "Sam");
        assert!(file.project.settings.hide_totals);
        assert!(file.project.settings.auto_save);
        assert_eq!(file.project.settings.thumbnail_default_time_sec, 600.0);
        assert_eq!(file.project.settings.judge_colors["Lee"], FALLBACK_COLOR);
        assert_eq!(file.project.settings.judge_colors["Sam"], "#ABCDEF");

        assert_eq!(file.clips.len(), 2);
        assert_eq!(file.clips[0].author.as_deref(), Some("Kai"));
        assert_eq!(file.clips[0].display_name, "Big Clip");
        assert_eq!(file.clips[0].audio_track_count, 1);
        assert_eq!(file.clips[0].order, 3);
        assert_eq!(file.clips[1].order, 1);
        assert!(!file.clips[1].id.is_empty());

        let note = &file.notes["c1"];
        assert_eq!(note.text_notes, "0:10 nice");
        assert_eq!(note.final_score, 8.0);
        assert!(!note.scores["rythme-synchro"].is_valid);
        assert_eq!(note.scores["rythme-synchro"].value, ScoreValue::Text("8".to_string()));
        assert_eq!(note.scores["x"].value, ScoreValue::Number(0.0));
        assert!(note.scores["x"].is_valid);

        assert_eq!(file.imported_judges.len(), 1);
        assert_eq!(file.imported_judges[0].judge_name, "Lee");
    }

    #[test]
    fn test_empty_object_gets_defaults() {
        let file = normalize_project_file(&json!({})).unwrap();
        assert_eq!(file.version, PROJECT_FORMAT_VERSION);
        assert_eq!(file.project.name, DEFAULT_PROJECT_NAME);
        assert!(file.clips.is_empty());
        assert!(file.notes.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(normalize_project_file(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_serialized_file_normalizes_back() {
        let file = normalize_project_file(&json!({"project": {"name": "P"}, "clips": [{"fileName": "A-B.mp4"}]})).unwrap();
        let again = normalize_project_file(&serde_json::to_value(&file).unwrap()).unwrap();
        assert_eq!(again, file);
    }
}
