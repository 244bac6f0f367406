// AMV Notation - Project Commands
// Project lifecycle, clip navigation and imported judges

use std::fs;
use std::path::{Path, PathBuf};

use super::SessionState;
use crate::project::{self, clamp_thumbnail_time, Clip, ImportAuditEntry, Project, ProjectFile, ProjectSettings, ProjectSummary};
use crate::session::Direction;

fn clip_from_path(path: &str, order: usize) -> Clip {
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    Clip::from_file(&file_name, path, order as i64)
}

/// Start a new project from a list of video paths (clip order follows the list)
pub fn create_project(
    state: &SessionState,
    name: String,
    judge_name: String,
    clip_paths: Vec<String>,
) -> Result<Project, String> {
    let clips = clip_paths
        .iter()
        .enumerate()
        .map(|(i, path)| clip_from_path(path, i))
        .collect();
    let mut session = state.lock()?;
    session.new_project(&name, &judge_name, clips);
    session.project().cloned().ok_or_else(|| "Project creation failed".to_string())
}

pub fn open_project(state: &SessionState, path: String) -> Result<ProjectFile, String> {
    let mut session = state.lock()?;
    session.load_project_file(Path::new(&path)).map_err(|e| e.to_string())?;
    session.to_project_file().map_err(|e| e.to_string())
}

/// Save to `path`, or to the project's current file, or to `<projects>/<name>.json`
pub fn save_project(state: &SessionState, path: Option<String>) -> Result<String, String> {
    let mut session = state.lock()?;
    let target = match path {
        Some(p) => Some(PathBuf::from(p)),
        None if session.project().and_then(|p| p.file_path.as_ref()).is_none() => {
            let name = session.project().map(|p| p.name.clone()).unwrap_or_default();
            let folder = state.paths.projects_folder().map_err(|e| e.to_string())?;
            Some(folder.join(format!("{}.json", crate::bareme::storage::sanitize_file_name(&name))))
        }
        None => None,
    };
    let saved = session.save(target.as_deref()).map_err(|e| e.to_string())?;
    Ok(saved.to_string_lossy().to_string())
}

pub fn get_project(state: &SessionState) -> Result<Option<Project>, String> {
    Ok(state.lock()?.project().cloned())
}

pub fn is_project_dirty(state: &SessionState) -> Result<bool, String> {
    Ok(state.lock()?.is_dirty())
}

/// Project files in `folder`, defaulting to the application projects folder
pub fn list_projects(state: &SessionState, folder: Option<String>) -> Result<Vec<ProjectSummary>, String> {
    let folder = match folder {
        Some(f) => PathBuf::from(f),
        None => state.paths.projects_folder().map_err(|e| e.to_string())?,
    };
    project::list_projects(&folder).map_err(|e| e.to_string())
}

pub fn update_project_settings(state: &SessionState, settings: ProjectSettings) -> Result<ProjectSettings, String> {
    let mut session = state.lock()?;
    let project = session.project_mut().ok_or("No project open")?;
    project.settings = ProjectSettings {
        thumbnail_default_time_sec: clamp_thumbnail_time(settings.thumbnail_default_time_sec),
        ..settings
    };
    let updated = project.settings.clone();
    session.mark_dirty();
    Ok(updated)
}

pub fn get_clips(state: &SessionState) -> Result<Vec<Clip>, String> {
    Ok(state.lock()?.clips().to_vec())
}

pub fn mark_clip_scored(state: &SessionState, clip_id: String) -> Result<bool, String> {
    Ok(state.lock()?.mark_scored(&clip_id))
}

pub fn set_current_clip(state: &SessionState, index: usize) -> Result<Option<Clip>, String> {
    let mut session = state.lock()?;
    session.set_current_clip(index);
    Ok(session.current_clip().cloned())
}

pub fn navigate_clip(state: &SessionState, direction: Direction) -> Result<Option<Clip>, String> {
    let mut session = state.lock()?;
    session.navigate(direction);
    Ok(session.current_clip().cloned())
}

pub fn hide_totals(state: &SessionState) -> Result<bool, String> {
    Ok(state.lock()?.hide_totals())
}

/// Attach another judge's project file; returns the scores that fail validation
pub fn import_judge_file(state: &SessionState, path: String) -> Result<Vec<ImportAuditEntry>, String> {
    let content = fs::read_to_string(&path).map_err(|e| e.to_string())?;
    let raw: serde_json::Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    state.lock()?.import_judge(&raw).map_err(|e| e.to_string())
}

pub fn rename_imported_judge(state: &SessionState, index: usize, name: String) -> Result<bool, String> {
    Ok(state.lock()?.rename_imported_judge(index, &name))
}

pub fn remove_imported_judge(state: &SessionState, index: usize) -> Result<bool, String> {
    Ok(state.lock()?.remove_imported_judge(index))
}
