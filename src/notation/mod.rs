// Notation Module
// Mutable per-clip scoring state for the local judge, with full-state undo.

pub mod data;
pub mod history;
pub mod timecodes;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bareme::{Bareme, BaremeRegistry};
use crate::scoring::{
    calculate_score, is_note_complete, CriterionScore, ScoreEntry, ScoreSheet, ScoreValue,
};

pub use data::{CriterionScoreData, NoteData};
pub use history::History;
pub use timecodes::{extract_timecodes, note_timecode_markers, NoteTimecodeMarker, ParsedTimecode};

/// One judge's scoring record for one clip
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    clip_id: String,
    bareme_id: String,
    scores: BTreeMap<String, CriterionScore>,
    text_notes: String,
    criterion_notes: BTreeMap<String, String>,
    category_notes: BTreeMap<String, String>,
    final_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scored_at: Option<String>,
}

impl Note {
    fn empty(clip_id: &str, bareme_id: &str) -> Self {
        Self {
            clip_id: clip_id.to_string(),
            bareme_id: bareme_id.to_string(),
            scores: BTreeMap::new(),
            text_notes: String::new(),
            criterion_notes: BTreeMap::new(),
            category_notes: BTreeMap::new(),
            final_score: 0.0,
            scored_at: None,
        }
    }

    pub fn clip_id(&self) -> &str {
        &self.clip_id
    }

    pub fn bareme_id(&self) -> &str {
        &self.bareme_id
    }

    pub fn scores(&self) -> &BTreeMap<String, CriterionScore> {
        &self.scores
    }

    pub fn score(&self, criterion_id: &str) -> Option<&CriterionScore> {
        self.scores.get(criterion_id)
    }

    pub fn text_notes(&self) -> &str {
        &self.text_notes
    }

    pub fn criterion_notes(&self) -> &BTreeMap<String, String> {
        &self.criterion_notes
    }

    pub fn category_notes(&self) -> &BTreeMap<String, String> {
        &self.category_notes
    }

    /// Total cached at the last mutation
    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn scored_at(&self) -> Option<&str> {
        self.scored_at.as_deref()
    }

    fn refresh(&mut self, bareme: &Bareme) {
        self.bareme_id = bareme.id.clone();
        self.final_score = calculate_score(&*self, bareme);
    }

    /// Persisted shape (validation messages dropped)
    pub fn to_data(&self) -> NoteData {
        NoteData {
            clip_id: self.clip_id.clone(),
            bareme_id: self.bareme_id.clone(),
            scores: self
                .scores
                .iter()
                .map(|(id, score)| {
                    let data = CriterionScoreData {
                        criterion_id: score.criterion_id().to_string(),
                        value: score.value().clone(),
                        is_valid: score.is_valid(),
                    };
                    (id.clone(), data)
                })
                .collect(),
            text_notes: self.text_notes.clone(),
            criterion_notes: self.criterion_notes.clone(),
            category_notes: self.category_notes.clone(),
            final_score: self.final_score,
            scored_at: self.scored_at.clone(),
        }
    }

    /// Rebuild from the persisted shape; validation messages come back empty
    pub fn from_data(clip_id: &str, data: &NoteData) -> Self {
        let clip_id = if data.clip_id.trim().is_empty() { clip_id } else { data.clip_id.as_str() };
        Self {
            clip_id: clip_id.to_string(),
            bareme_id: data.bareme_id.clone(),
            scores: data
                .scores
                .iter()
                .map(|(id, score)| {
                    let criterion_id = if score.criterion_id.is_empty() { id } else { &score.criterion_id };
                    (id.clone(), CriterionScore::restored(criterion_id.as_str(), score.value.clone(), score.is_valid))
                })
                .collect(),
            text_notes: data.text_notes.clone(),
            criterion_notes: data.criterion_notes.clone(),
            category_notes: data.category_notes.clone(),
            final_score: data.final_score,
            scored_at: data.scored_at.clone(),
        }
    }
}

impl ScoreSheet for Note {
    fn score_entry(&self, criterion_id: &str) -> Option<ScoreEntry<'_>> {
        self.scores.get(criterion_id).map(|score| ScoreEntry {
            value: score.value(),
            is_valid: score.is_valid(),
        })
    }
}

type NoteMap = BTreeMap<String, Note>;

/// The local judge's notes keyed by clip id, plus the rubric registry.
///
/// Mutations never fail: unknown criteria or a missing current rubric turn them into
/// no-ops. Each method reports whether anything changed.
#[derive(Debug, Clone, Default)]
pub struct NotationStore {
    baremes: BaremeRegistry,
    notes: NoteMap,
    history: History<NoteMap>,
}

impl NotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(baremes: BaremeRegistry) -> Self {
        Self { baremes, notes: NoteMap::new(), history: History::default() }
    }

    pub fn baremes(&self) -> &BaremeRegistry {
        &self.baremes
    }

    pub fn baremes_mut(&mut self) -> &mut BaremeRegistry {
        &mut self.baremes
    }

    pub fn current_bareme(&self) -> Option<&Bareme> {
        self.baremes.current()
    }

    pub fn notes(&self) -> &BTreeMap<String, Note> {
        &self.notes
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Record a criterion value: clamp numbers into range, validate, merge, recompute
    pub fn update_criterion(&mut self, clip_id: &str, criterion_id: &str, raw: impl Into<ScoreValue>) -> bool {
        let Some(bareme) = self.baremes.current() else {
            log::debug!("update_criterion ignored: no current bareme");
            return false;
        };
        let Some(criterion) = bareme.criterion(criterion_id) else {
            log::debug!("update_criterion ignored: unknown criterion {}", criterion_id);
            return false;
        };

        let mut value = raw.into().coerce_for(criterion);
        if criterion.criterion_type.is_numeric() {
            if let Some(n) = value.as_number() {
                value = ScoreValue::Number(criterion.clamp(n));
            }
        }
        let score = CriterionScore::evaluate(criterion, value);

        self.history.push(self.notes.clone());
        let note = self
            .notes
            .entry(clip_id.to_string())
            .or_insert_with(|| Note::empty(clip_id, &bareme.id));
        note.scores.insert(criterion.id.clone(), score);
        note.scored_at = Some(chrono::Utc::now().to_rfc3339());
        note.refresh(bareme);
        true
    }

    /// Drop a criterion score; the note stays even when it ends up empty
    pub fn clear_criterion(&mut self, clip_id: &str, criterion_id: &str) -> bool {
        let Some(bareme) = self.baremes.current() else {
            return false;
        };
        let present = self
            .notes
            .get(clip_id)
            .map(|n| n.scores.contains_key(criterion_id))
            .unwrap_or(false);
        if !present {
            return false;
        }

        self.history.push(self.notes.clone());
        if let Some(note) = self.notes.get_mut(clip_id) {
            note.scores.remove(criterion_id);
            note.refresh(bareme);
        }
        true
    }

    pub fn set_text_notes(&mut self, clip_id: &str, text: &str) -> bool {
        let unchanged = self.notes.get(clip_id).map(|n| n.text_notes.as_str()).unwrap_or("") == text;
        self.edit_note(clip_id, unchanged, |note| note.text_notes = text.to_string())
    }

    /// Note on one criterion of the current rubric; an empty text removes it
    pub fn set_criterion_note(&mut self, clip_id: &str, criterion_id: &str, text: &str) -> bool {
        let known = self
            .baremes
            .current()
            .map(|b| b.criterion(criterion_id).is_some())
            .unwrap_or(false);
        if !known {
            log::debug!("set_criterion_note ignored: unknown criterion {}", criterion_id);
            return false;
        }
        let unchanged = current_text(self.notes.get(clip_id).map(|n| &n.criterion_notes), criterion_id) == text;
        self.edit_note(clip_id, unchanged, |note| set_or_remove(&mut note.criterion_notes, criterion_id, text))
    }

    /// Note on a category; an empty text removes it
    pub fn set_category_note(&mut self, clip_id: &str, category: &str, text: &str) -> bool {
        let unchanged = current_text(self.notes.get(clip_id).map(|n| &n.category_notes), category) == text;
        self.edit_note(clip_id, unchanged, |note| set_or_remove(&mut note.category_notes, category, text))
    }

    fn edit_note<F>(&mut self, clip_id: &str, unchanged: bool, apply: F) -> bool
    where
        F: FnOnce(&mut Note),
    {
        if unchanged {
            return false;
        }
        let Some(bareme) = self.baremes.current() else {
            log::debug!("note edit ignored: no current bareme");
            return false;
        };

        self.history.push(self.notes.clone());
        let note = self
            .notes
            .entry(clip_id.to_string())
            .or_insert_with(|| Note::empty(clip_id, &bareme.id));
        apply(note);
        note.refresh(bareme);
        true
    }

    /// Restore every clip's notes to the state before the last mutation
    pub fn undo_last_change(&mut self) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                self.notes = snapshot;
                true
            }
            None => false,
        }
    }

    /// Cached total for a clip, 0 when it has no note
    pub fn get_score_for_clip(&self, clip_id: &str) -> f64 {
        self.notes.get(clip_id).map(Note::final_score).unwrap_or(0.0)
    }

    pub fn get_note_for_clip(&self, clip_id: &str) -> Option<&Note> {
        self.notes.get(clip_id)
    }

    /// Derived on demand; false without a note or a current rubric
    pub fn is_clip_complete(&self, clip_id: &str) -> bool {
        match (self.notes.get(clip_id), self.baremes.current()) {
            (Some(note), Some(bareme)) => is_note_complete(note, bareme),
            _ => false,
        }
    }

    /// Replace every note with persisted data and forget the undo history.
    /// Notes scored against the current rubric get their total recomputed.
    pub fn load_notes(&mut self, data: &BTreeMap<String, NoteData>) {
        let current = self.baremes.current();
        self.notes = data
            .iter()
            .map(|(clip_id, item)| {
                let mut note = Note::from_data(clip_id, item);
                if let Some(bareme) = current.filter(|b| b.id == note.bareme_id) {
                    note.final_score = calculate_score(&note, bareme);
                }
                (clip_id.clone(), note)
            })
            .collect();
        self.history.clear();
    }

    pub fn get_notes_data(&self) -> BTreeMap<String, NoteData> {
        self.notes.iter().map(|(id, note)| (id.clone(), note.to_data())).collect()
    }

    /// Drop every note and the undo history (rubrics stay)
    pub fn reset(&mut self) {
        self.notes.clear();
        self.history.clear();
    }
}

fn current_text<'a>(map: Option<&'a BTreeMap<String, String>>, key: &str) -> &'a str {
    map.and_then(|m| m.get(key)).map(String::as_str).unwrap_or("")
}

fn set_or_remove(map: &mut BTreeMap<String, String>, key: &str, text: &str) {
    if text.is_empty() {
        map.remove(key);
    } else {
        map.insert(key.to_string(), text.to_string());
    }
}
