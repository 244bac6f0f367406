// AMV Notation - Tauri Plugin
// Registers the command layer and bridges the detached notes window over Tauri events.

use serde_json::Value;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Listener, Manager, Runtime, State};

use std::collections::BTreeMap;

use crate::bareme::Bareme;
use crate::commands::{self, BaremeDeletion, SessionState};
use crate::config::UserSettings;
use crate::notation::{NoteData, NoteTimecodeMarker};
use crate::project::{Clip, ImportAuditEntry, Project, ProjectFile, ProjectSettings, ProjectSummary};
use crate::results::{AveragePolicy, ResultsExport, ResultsTable, SortMode};
use crate::scoring::{ProgressStats, ScoreValue, ValidationResult};
use crate::session::Direction;
use crate::sync::transport::TauriTransport;
use crate::sync::{main_window_event_names, ClipSnapshot, SyncMessage, SyncTransport};

// ----- Notation -----

#[tauri::command]
fn update_criterion(state: State<'_, SessionState>, clip_id: String, criterion_id: String, value: ScoreValue) -> Result<Option<NoteData>, String> {
    commands::update_criterion(&state, clip_id, criterion_id, value)
}

#[tauri::command]
fn clear_criterion(state: State<'_, SessionState>, clip_id: String, criterion_id: String) -> Result<bool, String> {
    commands::clear_criterion(&state, clip_id, criterion_id)
}

#[tauri::command]
fn set_text_notes(state: State<'_, SessionState>, clip_id: String, text: String) -> Result<bool, String> {
    commands::set_text_notes(&state, clip_id, text)
}

#[tauri::command]
fn set_criterion_note(state: State<'_, SessionState>, clip_id: String, criterion_id: String, text: String) -> Result<bool, String> {
    commands::set_criterion_note(&state, clip_id, criterion_id, text)
}

#[tauri::command]
fn set_category_note(state: State<'_, SessionState>, clip_id: String, category: String, text: String) -> Result<bool, String> {
    commands::set_category_note(&state, clip_id, category, text)
}

#[tauri::command]
fn set_category_score(state: State<'_, SessionState>, clip_id: String, category: String, value: f64) -> Result<bool, String> {
    commands::set_category_score(&state, clip_id, category, value)
}

#[tauri::command]
fn undo_last_change(state: State<'_, SessionState>) -> Result<bool, String> {
    commands::undo_last_change(&state)
}

#[tauri::command]
fn get_note(state: State<'_, SessionState>, clip_id: String) -> Result<Option<NoteData>, String> {
    commands::get_note(&state, clip_id)
}

#[tauri::command]
fn get_all_notes(state: State<'_, SessionState>) -> Result<BTreeMap<String, NoteData>, String> {
    commands::get_all_notes(&state)
}

#[tauri::command]
fn get_score_for_clip(state: State<'_, SessionState>, clip_id: String) -> Result<f64, String> {
    commands::get_score_for_clip(&state, clip_id)
}

#[tauri::command]
fn is_clip_complete(state: State<'_, SessionState>, clip_id: String) -> Result<bool, String> {
    commands::is_clip_complete(&state, clip_id)
}

#[tauri::command]
fn get_progress(state: State<'_, SessionState>) -> Result<ProgressStats, String> {
    commands::get_progress(&state)
}

#[tauri::command]
fn get_timecode_markers(state: State<'_, SessionState>, clip_id: String, fps: Option<f64>) -> Result<Vec<NoteTimecodeMarker>, String> {
    commands::get_timecode_markers(&state, clip_id, fps)
}

#[tauri::command]
fn validate_value(state: State<'_, SessionState>, criterion_id: String, value: Option<ScoreValue>) -> Result<ValidationResult, String> {
    commands::validate_value(&state, criterion_id, value)
}

// ----- Project -----

#[tauri::command]
fn create_project(state: State<'_, SessionState>, name: String, judge_name: String, clip_paths: Vec<String>) -> Result<Project, String> {
    commands::create_project(&state, name, judge_name, clip_paths)
}

#[tauri::command]
fn open_project(state: State<'_, SessionState>, path: String) -> Result<ProjectFile, String> {
    commands::open_project(&state, path)
}

#[tauri::command]
fn save_project(state: State<'_, SessionState>, path: Option<String>) -> Result<String, String> {
    commands::save_project(&state, path)
}

#[tauri::command]
fn get_project(state: State<'_, SessionState>) -> Result<Option<Project>, String> {
    commands::get_project(&state)
}

#[tauri::command]
fn is_project_dirty(state: State<'_, SessionState>) -> Result<bool, String> {
    commands::is_project_dirty(&state)
}

#[tauri::command]
fn list_projects(state: State<'_, SessionState>, folder: Option<String>) -> Result<Vec<ProjectSummary>, String> {
    commands::list_projects(&state, folder)
}

#[tauri::command]
fn update_project_settings(state: State<'_, SessionState>, settings: ProjectSettings) -> Result<ProjectSettings, String> {
    commands::update_project_settings(&state, settings)
}

#[tauri::command]
fn get_clips(state: State<'_, SessionState>) -> Result<Vec<Clip>, String> {
    commands::get_clips(&state)
}

#[tauri::command]
fn mark_clip_scored(state: State<'_, SessionState>, clip_id: String) -> Result<bool, String> {
    commands::mark_clip_scored(&state, clip_id)
}

#[tauri::command]
fn set_current_clip<R: Runtime>(app: AppHandle<R>, state: State<'_, SessionState>, index: usize) -> Result<Option<Clip>, String> {
    let clip = commands::set_current_clip(&state, index)?;
    push_snapshot(&app, &state);
    Ok(clip)
}

#[tauri::command]
fn navigate_clip<R: Runtime>(app: AppHandle<R>, state: State<'_, SessionState>, direction: Direction) -> Result<Option<Clip>, String> {
    let clip = commands::navigate_clip(&state, direction)?;
    push_snapshot(&app, &state);
    Ok(clip)
}

#[tauri::command]
fn hide_totals(state: State<'_, SessionState>) -> Result<bool, String> {
    commands::hide_totals(&state)
}

#[tauri::command]
fn import_judge_file(state: State<'_, SessionState>, path: String) -> Result<Vec<ImportAuditEntry>, String> {
    commands::import_judge_file(&state, path)
}

#[tauri::command]
fn rename_imported_judge(state: State<'_, SessionState>, index: usize, name: String) -> Result<bool, String> {
    commands::rename_imported_judge(&state, index, name)
}

#[tauri::command]
fn remove_imported_judge(state: State<'_, SessionState>, index: usize) -> Result<bool, String> {
    commands::remove_imported_judge(&state, index)
}

// ----- Baremes -----

#[tauri::command]
fn list_baremes(state: State<'_, SessionState>) -> Result<Vec<Bareme>, String> {
    commands::list_baremes(&state)
}

#[tauri::command]
fn get_current_bareme(state: State<'_, SessionState>) -> Result<Option<Bareme>, String> {
    commands::get_current_bareme(&state)
}

#[tauri::command]
fn select_bareme(state: State<'_, SessionState>, bareme_id: String) -> Result<Bareme, String> {
    commands::select_bareme(&state, bareme_id)
}

#[tauri::command]
fn reload_custom_baremes(state: State<'_, SessionState>) -> Result<usize, String> {
    commands::reload_custom_baremes(&state)
}

#[tauri::command]
fn save_custom_bareme(state: State<'_, SessionState>, raw: Value) -> Result<Bareme, String> {
    commands::save_custom_bareme(&state, raw)
}

#[tauri::command]
fn delete_custom_bareme(state: State<'_, SessionState>, bareme_id: String) -> Result<BaremeDeletion, String> {
    commands::delete_custom_bareme(&state, bareme_id)
}

// ----- Results -----

#[tauri::command]
fn get_results(state: State<'_, SessionState>, sort: Option<SortMode>, policy: Option<AveragePolicy>) -> Result<ResultsTable, String> {
    commands::get_results(&state, sort, policy)
}

#[tauri::command]
fn export_results(state: State<'_, SessionState>, path: String, policy: Option<AveragePolicy>, judge_index: Option<usize>) -> Result<ResultsExport, String> {
    commands::export_results(&state, path, policy, judge_index)
}

// ----- Settings -----

#[tauri::command]
fn get_user_settings(state: State<'_, SessionState>) -> Result<UserSettings, String> {
    commands::get_user_settings(&state)
}

#[tauri::command]
fn set_user_settings(state: State<'_, SessionState>, settings: UserSettings) -> Result<(), String> {
    commands::set_user_settings(&state, settings)
}

#[tauri::command]
fn remember_current_project(state: State<'_, SessionState>) -> Result<UserSettings, String> {
    commands::remember_current_project(&state)
}

// ----- Detached notes -----

#[tauri::command]
fn get_clip_snapshot(state: State<'_, SessionState>) -> Result<ClipSnapshot, String> {
    commands::get_clip_snapshot(&state)
}

#[tauri::command]
fn sync_message(state: State<'_, SessionState>, message: SyncMessage) -> Result<Option<SyncMessage>, String> {
    commands::sync_message(&state, message)
}

/// Send the current clip to the detached window after a main-side navigation
fn push_snapshot<R: Runtime>(app: &AppHandle<R>, state: &SessionState) {
    if let Ok(snapshot) = commands::get_clip_snapshot(state) {
        if let Err(e) = TauriTransport::new(app.clone()).send(&SyncMessage::Snapshot(snapshot)) {
            log::warn!("Failed to push clip snapshot: {}", e);
        }
    }
}

/// Route every detached-window event through the session and emit the reply
fn listen_detached_window<R: Runtime>(app: &AppHandle<R>) {
    for event_name in main_window_event_names() {
        let handle = app.clone();
        app.listen_any(event_name, move |event| {
            let payload: Value = serde_json::from_str(event.payload()).unwrap_or(Value::Null);
            let message = match SyncMessage::from_event(event_name, payload) {
                Ok(message) => message,
                Err(e) => {
                    log::warn!("Ignoring malformed {} event: {}", event_name, e);
                    return;
                }
            };
            let state = handle.state::<SessionState>();
            match commands::sync_message(&state, message) {
                Ok(Some(reply)) => {
                    if let Err(e) = TauriTransport::new(handle.clone()).send(&reply) {
                        log::warn!("Failed to emit {}: {}", reply.event_name(), e);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Sync event {} failed: {}", event_name, e),
            }
        });
    }
}

/// Plugin exposing the notation commands; `state` is managed by the app for its lifetime
pub fn init<R: Runtime>(state: SessionState) -> TauriPlugin<R> {
    Builder::new("amv-notation")
        .invoke_handler(tauri::generate_handler![
            update_criterion,
            clear_criterion,
            set_text_notes,
            set_criterion_note,
            set_category_note,
            set_category_score,
            undo_last_change,
            get_note,
            get_all_notes,
            get_score_for_clip,
            is_clip_complete,
            get_progress,
            get_timecode_markers,
            validate_value,
            create_project,
            open_project,
            save_project,
            get_project,
            is_project_dirty,
            list_projects,
            update_project_settings,
            get_clips,
            mark_clip_scored,
            set_current_clip,
            navigate_clip,
            hide_totals,
            import_judge_file,
            rename_imported_judge,
            remove_imported_judge,
            list_baremes,
            get_current_bareme,
            select_bareme,
            reload_custom_baremes,
            save_custom_bareme,
            delete_custom_bareme,
            get_results,
            export_results,
            get_user_settings,
            set_user_settings,
            remember_current_project,
            get_clip_snapshot,
            sync_message,
        ])
        .setup(move |app, _api| {
            app.manage(state);
            listen_detached_window(app);
            log::info!("AMV notation plugin ready");
            Ok(())
        })
        .build()
}
