// AMV Notation - Library Entry Point
// Scoring engine for AMV competition judging: rubrics, notes, undo, multi-judge results.

pub mod constants;
pub mod error;
pub mod normalize;
pub mod config;
pub mod bareme;
pub mod scoring;
pub mod notation;
pub mod project;
pub mod results;
pub mod session;
pub mod sync;
pub mod commands;

#[cfg(feature = "desktop")]
pub mod plugin;

pub use bareme::{Bareme, BaremeRegistry, Criterion, CriterionType};
pub use commands::SessionState;
pub use error::{NotationError, Result};
pub use notation::{NotationStore, Note, NoteData};
pub use project::{Clip, ImportedJudgeData, Project, ProjectFile};
pub use results::{build_results, AveragePolicy, ResultsOptions, ResultsTable, SortMode};
pub use scoring::{calculate_score, validate_criterion_value, ScoreValue, ValidationResult};
pub use session::NotationSession;

use config::AppPaths;

/// Session state for a desktop shell: default app folders, custom rubrics loaded.
/// Unreadable rubric files are logged and skipped.
pub fn open_default_state() -> Result<SessionState> {
    let paths = AppPaths::default_location()?;
    open_state(paths)
}

pub fn open_state(paths: AppPaths) -> Result<SessionState> {
    let mut registry = BaremeRegistry::new();
    let items = bareme::storage::load_bareme_files(&paths.baremes_folder()?)?;
    let custom = registry.load_custom(&items);

    let settings = config::load_user_settings(&paths).unwrap_or_else(|e| {
        log::warn!("Ignoring unreadable settings: {}", e);
        config::UserSettings::default()
    });
    if let Some(bareme_id) = settings.last_bareme_id.as_deref() {
        registry.select(bareme_id);
    }

    log::info!("Loaded {} custom baremes from {}", custom, paths.root().display());
    let session = NotationSession::with_store(NotationStore::with_registry(registry));
    Ok(SessionState::new(session, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_state_loads_custom_baremes() {
        let tmp = TempDir::new().unwrap();
        let paths = AppPaths::at(tmp.path());
        let folder = paths.baremes_folder().unwrap();
        std::fs::write(
            folder.join("club.json"),
            r#"{"id": "club", "name": "Club", "criteria": [{"name": "Story"}]}"#,
        )
        .unwrap();
        std::fs::write(paths.settings_file(), r#"{"lastBaremeId": "club"}"#).unwrap();

        let state = open_state(paths).unwrap();
        let session = state.lock().unwrap();
        assert_eq!(session.store().baremes().available().len(), 2);
        assert_eq!(session.current_bareme().unwrap().id, "club");
    }
}
