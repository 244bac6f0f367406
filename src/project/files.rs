// Project persistence
// Pretty-printed JSON files; listing reads only the summary fields.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use super::{normalize_project_file, ProjectFile};
use crate::constants::JSON_EXTENSION;
use crate::error::{NotationError, Result};
use crate::normalize::{array_of, non_blank_of, object_of};

fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write a project file; `project.updatedAt` is left as the caller set it
pub fn save_project_file(path: &Path, data: &ProjectFile) -> Result<()> {
    write_pretty_json(path, data)?;
    log::info!("Saved project '{}' to {}", data.project.name, path.display());
    Ok(())
}

/// Read and normalize a project file; `project.filePath` points at where it was read from
pub fn load_project_file(path: &Path) -> Result<ProjectFile> {
    if !path.exists() {
        return Err(NotationError::ProjectNotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&content)?;
    let mut file = normalize_project_file(&raw)?;
    file.project.file_path = Some(path.to_string_lossy().to_string());
    log::info!(
        "Loaded project '{}' ({} clips) from {}",
        file.project.name,
        file.clips.len(),
        path.display()
    );
    Ok(file)
}

/// Write any serializable document as pretty JSON
pub fn export_json_file<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    write_pretty_json(path, data)
}

/// Listing entry for the project picker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub name: String,
    pub judge_name: String,
    pub updated_at: String,
    pub file_path: String,
    pub clip_count: usize,
    pub scored_count: usize,
}

const UNNAMED_PROJECT: &str = "Sans nom";

fn parse_project_summary(data: &Value, file_path: &Path) -> Option<ProjectSummary> {
    let root = data.as_object()?;
    let empty = serde_json::Map::new();
    let project = object_of(root, &["project"]).unwrap_or(&empty);
    let clips = array_of(root, &["clips"]).map(Vec::as_slice).unwrap_or(&[]);

    Some(ProjectSummary {
        name: non_blank_of(project, &["name"]).unwrap_or_else(|| UNNAMED_PROJECT.to_string()),
        judge_name: non_blank_of(project, &["judgeName", "judge_name"]).unwrap_or_default(),
        updated_at: non_blank_of(project, &["updatedAt", "updated_at"]).unwrap_or_default(),
        file_path: file_path.to_string_lossy().to_string(),
        clip_count: clips.len(),
        scored_count: clips.iter().filter(|c| c.get("scored").and_then(Value::as_bool) == Some(true)).count(),
    })
}

/// Project files in a folder (non-recursive), most recently updated first.
/// Unreadable or unparsable files are skipped.
pub fn list_projects(folder: &Path) -> Result<Vec<ProjectSummary>> {
    if !folder.exists() {
        return Ok(Vec::new());
    }

    let paths: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(JSON_EXTENSION))
        .collect();

    let mut projects = Vec::new();
    for path in paths {
        let parsed = fs::read_to_string(&path)
            .map_err(NotationError::from)
            .and_then(|content| Ok(serde_json::from_str::<Value>(&content)?));
        match parsed {
            Ok(data) => projects.extend(parse_project_summary(&data, &path)),
            Err(e) => log::warn!("Skipping project file {}: {}", path.display(), e),
        }
    }

    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Clip, Project};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample(name: &str, updated_at: &str) -> ProjectFile {
        let mut project = Project::new(name, "Judge", "official-amv-2026");
        project.updated_at = updated_at.to_string();
        let mut clip = Clip::from_file("A-One.mp4", "/clips/A-One.mp4", 0);
        clip.scored = true;
        ProjectFile::new(project, vec![clip, Clip::from_file("B-Two.mp4", "/clips/B-Two.mp4", 1)], BTreeMap::new())
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("p.json");
        let file = sample("Convention", "2025-03-01T00:00:00Z");

        save_project_file(&path, &file).unwrap();
        let loaded = load_project_file(&path).unwrap();
        assert_eq!(loaded.project.file_path.as_deref(), Some(path.to_string_lossy().as_ref()));
        assert_eq!(loaded.clips, file.clips);
        assert_eq!(loaded.project.name, "Convention");
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load_project_file(&tmp.path().join("none.json")).unwrap_err();
        assert!(matches!(err, NotationError::ProjectNotFound(_)));
    }

    #[test]
    fn test_list_projects_sorted_and_skips_garbage() {
        let tmp = TempDir::new().unwrap();
        save_project_file(&tmp.path().join("old.json"), &sample("Old", "2024-01-01T00:00:00Z")).unwrap();
        save_project_file(&tmp.path().join("new.json"), &sample("New", "2025-06-01T00:00:00Z")).unwrap();
        fs::write(tmp.path().join("broken.json"), "{").unwrap();
        fs::write(tmp.path().join("readme.txt"), "x").unwrap();

        let list = list_projects(tmp.path()).unwrap();
        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Old"]);
        assert_eq!(list[0].clip_count, 2);
        assert_eq!(list[0].scored_count, 1);
        assert!(list_projects(&tmp.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_export_json_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        export_json_file(&path, &serde_json::json!({"ok": true})).unwrap();
        let back: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back["ok"], true);
    }
}
