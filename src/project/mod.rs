// Project Module
// Project metadata, clips and the persisted project file.

pub mod files;
pub mod import;
pub mod normalize;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTO_SAVE_INTERVAL_SECS, DEFAULT_PLAYBACK_SPEED, DEFAULT_PROJECT_NAME,
    DEFAULT_THUMBNAIL_TIME_SECS, DEFAULT_VOLUME, MAX_THUMBNAIL_TIME_SECS, PROJECT_FORMAT_VERSION,
};
use crate::notation::NoteData;

pub use files::{export_json_file, list_projects, load_project_file, save_project_file, ProjectSummary};
pub use import::{audit_imported_judge, import_judge, ImportAuditEntry};
pub use normalize::normalize_project_file;

/// Notes of another judge share the persisted note shape
pub type ImportedJudgeNote = NoteData;

/// Per-project preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub auto_save: bool,
    pub auto_save_interval: f64,
    pub default_playback_speed: f64,
    pub default_volume: f64,
    pub judge_colors: BTreeMap<String, String>,
    pub hide_final_score_until_end: bool,
    pub hide_totals: bool,
    pub show_miniatures: bool,
    pub show_add_row_button: bool,
    pub thumbnail_default_time_sec: f64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            auto_save_interval: DEFAULT_AUTO_SAVE_INTERVAL_SECS,
            default_playback_speed: DEFAULT_PLAYBACK_SPEED,
            default_volume: DEFAULT_VOLUME,
            judge_colors: BTreeMap::new(),
            hide_final_score_until_end: false,
            hide_totals: false,
            show_miniatures: false,
            show_add_row_button: false,
            thumbnail_default_time_sec: DEFAULT_THUMBNAIL_TIME_SECS,
        }
    }
}

/// Keep the default thumbnail time in `[0, 600]` seconds
pub fn clamp_thumbnail_time(seconds: f64) -> f64 {
    seconds.clamp(0.0, MAX_THUMBNAIL_TIME_SECS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub judge_name: String,
    pub created_at: String,
    pub updated_at: String,
    pub bareme_id: String,
    pub clips_folder_path: String,
    pub settings: ProjectSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl Project {
    pub fn new(name: &str, judge_name: &str, bareme_id: &str) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let name = name.trim();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: if name.is_empty() { DEFAULT_PROJECT_NAME.to_string() } else { name.to_string() },
            judge_name: judge_name.trim().to_string(),
            created_at: now.clone(),
            updated_at: now,
            bareme_id: bareme_id.to_string(),
            clips_folder_path: String::new(),
            settings: ProjectSettings::default(),
            file_path: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// A video entry being judged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub duration: f64,
    pub has_internal_subtitles: bool,
    pub audio_track_count: u32,
    pub scored: bool,
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_time: Option<f64>,
}

impl Clip {
    /// New clip from a file, display name and author parsed from `Author-Clip_Name.ext`
    pub fn from_file(file_name: &str, file_path: &str, order: i64) -> Self {
        let parsed = parse_clip_name(file_name);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            display_name: parsed.display_name,
            author: parsed.author,
            duration: 0.0,
            has_internal_subtitles: false,
            audio_track_count: 1,
            scored: false,
            order,
            thumbnail_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClipName {
    pub display_name: String,
    pub author: Option<String>,
}

/// `Author-Clip_Name.mp4` -> author `Author`, display name `Clip Name`.
/// No dash (or a leading one) means no author.
pub fn parse_clip_name(file_name: &str) -> ParsedClipName {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < file_name.len() => &file_name[..dot],
        _ => file_name,
    };

    let (author, raw_name) = match stem.find('-') {
        Some(dash) if dash > 0 => {
            let author = stem[..dash].replace('_', " ").trim().to_string();
            (Some(author).filter(|a| !a.is_empty()), &stem[dash + 1..])
        }
        _ => (None, stem),
    };

    ParsedClipName {
        display_name: raw_name.replace('_', " ").trim().to_string(),
        author,
    }
}

/// Another judge's notes, aggregated but never edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedJudgeData {
    pub judge_name: String,
    pub notes: BTreeMap<String, ImportedJudgeNote>,
}

/// The persisted project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: String,
    pub project: Project,
    pub bareme_id: String,
    pub clips: Vec<Clip>,
    pub notes: BTreeMap<String, NoteData>,
    #[serde(default)]
    pub imported_judges: Vec<ImportedJudgeData>,
}

impl ProjectFile {
    pub fn new(project: Project, clips: Vec<Clip>, notes: BTreeMap<String, NoteData>) -> Self {
        Self {
            version: PROJECT_FORMAT_VERSION.to_string(),
            bareme_id: project.bareme_id.clone(),
            project,
            clips,
            notes,
            imported_judges: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clip_name() {
        let parsed = parse_clip_name("Kaito_San-My_Great_AMV.mp4");
        assert_eq!(parsed.author.as_deref(), Some("Kaito San"));
        assert_eq!(parsed.display_name, "My Great AMV");

        let parsed = parse_clip_name("solo_clip.mkv");
        assert_eq!(parsed.author, None);
        assert_eq!(parsed.display_name, "solo clip");

        let parsed = parse_clip_name("-leading-dash.mp4");
        assert_eq!(parsed.author, None);
        assert_eq!(parsed.display_name, "-leading-dash");

        assert_eq!(parse_clip_name("Author-Name.with.dots.avi").display_name, "Name.with.dots");
    }

    #[test]
    fn test_new_project_defaults() {
        let project = Project::new("  ", " Alex ", "official-amv-2026");
        assert_eq!(project.name, DEFAULT_PROJECT_NAME);
        assert_eq!(project.judge_name, "Alex");
        assert!(project.settings.auto_save);
        assert!(uuid::Uuid::parse_str(&project.id).is_ok());

        let file = ProjectFile::new(project, Vec::new(), BTreeMap::new());
        assert_eq!(file.version, PROJECT_FORMAT_VERSION);
        assert_eq!(file.bareme_id, "official-amv-2026");
    }

    #[test]
    fn test_clamp_thumbnail_time() {
        assert_eq!(clamp_thumbnail_time(-5.0), 0.0);
        assert_eq!(clamp_thumbnail_time(700.0), MAX_THUMBNAIL_TIME_SECS);
        assert_eq!(clamp_thumbnail_time(12.5), 12.5);
    }
}
