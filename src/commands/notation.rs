// AMV Notation - Notation Commands
// Scoring and note edits for the local judge

use super::SessionState;
use crate::notation::{NoteData, NoteTimecodeMarker};
use crate::scoring::{validate_criterion_value, ProgressStats, ScoreValue, ValidationResult};

/// Record a criterion value and return the clip's updated note
pub fn update_criterion(
    state: &SessionState,
    clip_id: String,
    criterion_id: String,
    value: ScoreValue,
) -> Result<Option<NoteData>, String> {
    let mut session = state.lock()?;
    session.update_criterion(&clip_id, &criterion_id, value);
    Ok(session.note(&clip_id).map(|n| n.to_data()))
}

pub fn clear_criterion(state: &SessionState, clip_id: String, criterion_id: String) -> Result<bool, String> {
    let mut session = state.lock()?;
    let changed = session.store_mut().clear_criterion(&clip_id, &criterion_id);
    if changed {
        session.mark_dirty();
    }
    Ok(changed)
}

pub fn set_text_notes(state: &SessionState, clip_id: String, text: String) -> Result<bool, String> {
    Ok(state.lock()?.set_text_notes(&clip_id, &text))
}

pub fn set_criterion_note(
    state: &SessionState,
    clip_id: String,
    criterion_id: String,
    text: String,
) -> Result<bool, String> {
    Ok(state.lock()?.set_criterion_note(&clip_id, &criterion_id, &text))
}

pub fn set_category_note(state: &SessionState, clip_id: String, category: String, text: String) -> Result<bool, String> {
    Ok(state.lock()?.set_category_note(&clip_id, &category, &text))
}

/// Spread a category total over its criteria
pub fn set_category_score(state: &SessionState, clip_id: String, category: String, value: f64) -> Result<bool, String> {
    Ok(state.lock()?.set_category_score(&clip_id, &category, value))
}

pub fn undo_last_change(state: &SessionState) -> Result<bool, String> {
    Ok(state.lock()?.undo())
}

pub fn get_note(state: &SessionState, clip_id: String) -> Result<Option<NoteData>, String> {
    Ok(state.lock()?.note(&clip_id).map(|n| n.to_data()))
}

pub fn get_all_notes(state: &SessionState) -> Result<std::collections::BTreeMap<String, NoteData>, String> {
    Ok(state.lock()?.store().get_notes_data())
}

pub fn get_score_for_clip(state: &SessionState, clip_id: String) -> Result<f64, String> {
    Ok(state.lock()?.store().get_score_for_clip(&clip_id))
}

pub fn is_clip_complete(state: &SessionState, clip_id: String) -> Result<bool, String> {
    Ok(state.lock()?.store().is_clip_complete(&clip_id))
}

pub fn get_progress(state: &SessionState) -> Result<ProgressStats, String> {
    Ok(state.lock()?.progress())
}

pub fn get_timecode_markers(
    state: &SessionState,
    clip_id: String,
    fps: Option<f64>,
) -> Result<Vec<NoteTimecodeMarker>, String> {
    Ok(state.lock()?.timecode_markers(&clip_id, fps))
}

/// Check a value against a criterion of the current rubric without recording it
pub fn validate_value(state: &SessionState, criterion_id: String, value: Option<ScoreValue>) -> Result<ValidationResult, String> {
    let session = state.lock()?;
    let bareme = session.current_bareme().ok_or("No bareme selected")?;
    let criterion = bareme
        .criterion(&criterion_id)
        .ok_or_else(|| format!("Unknown criterion: {}", criterion_id))?;
    Ok(validate_criterion_value(value.as_ref(), criterion))
}
