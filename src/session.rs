// Session Module
// One judge's open project: metadata, clips, the note store and imported judges.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bareme::Bareme;
use crate::error::{NotationError, Result};
use crate::notation::{note_timecode_markers, NotationStore, Note, NoteTimecodeMarker};
use crate::project::{self, audit_imported_judge, Clip, ImportAuditEntry, ImportedJudgeData, Project, ProjectFile};
use crate::results::{build_results, build_results_export, judge_sources, ResultsExport, ResultsOptions, ResultsTable};
use crate::scoring::{distribute_category_score, progress_stats, ProgressStats, ScoreValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Next,
    Prev,
}

/// Explicit replacement for the app-wide project and notation stores.
/// Every mutation that changes persisted data marks the session dirty.
#[derive(Debug, Clone, Default)]
pub struct NotationSession {
    project: Option<Project>,
    clips: Vec<Clip>,
    current_clip_index: usize,
    store: NotationStore,
    imported_judges: Vec<ImportedJudgeData>,
    dirty: bool,
}

impl NotationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session over an existing store (custom rubrics already registered)
    pub fn with_store(store: NotationStore) -> Self {
        Self { store, ..Self::default() }
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn project_mut(&mut self) -> Option<&mut Project> {
        self.project.as_mut()
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn store(&self) -> &NotationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NotationStore {
        &mut self.store
    }

    pub fn current_bareme(&self) -> Option<&Bareme> {
        self.store.current_bareme()
    }

    pub fn imported_judges(&self) -> &[ImportedJudgeData] {
        &self.imported_judges
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn current_clip_index(&self) -> usize {
        self.current_clip_index
    }

    pub fn current_clip(&self) -> Option<&Clip> {
        self.clips.get(self.current_clip_index)
    }

    /// Start a fresh project on the current rubric (the official one when none is selected)
    pub fn new_project(&mut self, name: &str, judge_name: &str, clips: Vec<Clip>) {
        let bareme_id = match self.store.current_bareme() {
            Some(bareme) => bareme.id.clone(),
            None => {
                let official = self.store.baremes().official().id.clone();
                self.store.baremes_mut().select(&official);
                official
            }
        };
        let project = Project::new(name, judge_name, &bareme_id);
        log::info!("New project '{}' with {} clips", project.name, clips.len());

        self.project = Some(project);
        self.clips = clips;
        self.current_clip_index = 0;
        self.imported_judges.clear();
        self.store.reset();
        self.dirty = true;
    }

    /// Replace the session content with a project file.
    /// The project's rubric becomes current when it is registered; otherwise the current one stays.
    pub fn open(&mut self, file: ProjectFile) {
        if !self.store.baremes_mut().select(&file.bareme_id) {
            log::warn!(
                "Bareme {} of project '{}' is not available, keeping the current one",
                file.bareme_id,
                file.project.name
            );
        }
        self.store.load_notes(&file.notes);
        self.project = Some(file.project);
        self.clips = file.clips;
        self.imported_judges = file.imported_judges;
        self.current_clip_index = 0;
        self.dirty = false;
    }

    pub fn load_project_file(&mut self, path: &Path) -> Result<()> {
        let file = project::load_project_file(path)?;
        self.open(file);
        Ok(())
    }

    /// Snapshot of the session in the persisted shape
    pub fn to_project_file(&self) -> Result<ProjectFile> {
        let project = self
            .project
            .clone()
            .ok_or_else(|| NotationError::InvalidProject("no project open".to_string()))?;
        let mut file = ProjectFile::new(project, self.clips.clone(), self.store.get_notes_data());
        if let Some(bareme) = self.store.current_bareme() {
            file.bareme_id = bareme.id.clone();
            file.project.bareme_id = bareme.id.clone();
        }
        file.imported_judges = self.imported_judges.clone();
        Ok(file)
    }

    /// Write the project to `path`, or to where it was last loaded or saved
    pub fn save(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => self
                .project
                .as_ref()
                .and_then(|p| p.file_path.as_deref())
                .map(PathBuf::from)
                .ok_or_else(|| NotationError::InvalidPath("project has no file path".to_string()))?,
        };

        if let Some(project) = self.project.as_mut() {
            project.touch();
            project.file_path = Some(target.to_string_lossy().to_string());
        }
        let file = self.to_project_file()?;
        project::save_project_file(&target, &file)?;
        self.dirty = false;
        Ok(target)
    }

    pub fn all_clips_scored(&self) -> bool {
        !self.clips.is_empty() && self.clips.iter().all(|c| c.scored)
    }

    /// Totals stay hidden when the project says so, or until every clip is scored
    pub fn hide_totals(&self) -> bool {
        let Some(project) = &self.project else {
            return false;
        };
        project.settings.hide_totals || (project.settings.hide_final_score_until_end && !self.all_clips_scored())
    }

    /// Returns false for an unknown clip or one already scored
    pub fn mark_scored(&mut self, clip_id: &str) -> bool {
        match self.clips.iter_mut().find(|c| c.id == clip_id) {
            Some(clip) if !clip.scored => {
                clip.scored = true;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    fn mark_scored_if_complete(&mut self, clip_id: &str) {
        if self.store.is_clip_complete(clip_id) {
            self.mark_scored(clip_id);
        }
    }

    /// Record a criterion value for the local judge; a clip becomes scored once complete
    pub fn update_criterion(&mut self, clip_id: &str, criterion_id: &str, value: impl Into<ScoreValue>) -> bool {
        let changed = self.store.update_criterion(clip_id, criterion_id, value);
        if changed {
            self.dirty = true;
            self.mark_scored_if_complete(clip_id);
        }
        changed
    }

    pub fn set_text_notes(&mut self, clip_id: &str, text: &str) -> bool {
        let changed = self.store.set_text_notes(clip_id, text);
        self.dirty |= changed;
        changed
    }

    pub fn set_criterion_note(&mut self, clip_id: &str, criterion_id: &str, text: &str) -> bool {
        let changed = self.store.set_criterion_note(clip_id, criterion_id, text);
        self.dirty |= changed;
        changed
    }

    pub fn set_category_note(&mut self, clip_id: &str, category: &str, text: &str) -> bool {
        let changed = self.store.set_category_note(clip_id, category, text);
        self.dirty |= changed;
        changed
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.store.undo_last_change();
        self.dirty |= changed;
        changed
    }

    /// Spread a category-level score over the category's criteria for the local judge
    pub fn set_category_score(&mut self, clip_id: &str, category: &str, target: f64) -> bool {
        let Some(bareme) = self.store.current_bareme() else {
            return false;
        };
        let criteria: Vec<_> = bareme.criteria_in_category(category).cloned().collect();
        if criteria.is_empty() {
            log::debug!("set_category_score ignored: unknown category {}", category);
            return false;
        }

        let values = distribute_category_score(&criteria, self.store.get_note_for_clip(clip_id), target);
        let mut changed = false;
        for criterion in &criteria {
            let value = values.get(&criterion.id).copied().unwrap_or(0.0);
            changed |= self.store.update_criterion(clip_id, &criterion.id, value);
        }
        if changed {
            self.dirty = true;
            self.mark_scored_if_complete(clip_id);
        }
        changed
    }

    /// Out-of-range indices are ignored
    pub fn set_current_clip(&mut self, index: usize) -> bool {
        if index < self.clips.len() {
            self.current_clip_index = index;
            true
        } else {
            false
        }
    }

    /// Move to the neighbouring clip; stays put at either end
    pub fn navigate(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Next if self.current_clip_index + 1 < self.clips.len() => {
                self.current_clip_index += 1;
                true
            }
            Direction::Prev if self.current_clip_index > 0 => {
                self.current_clip_index -= 1;
                true
            }
            _ => false,
        }
    }

    /// Position of the current clip when clips are listed by author (else display name)
    pub fn sorted_clip_position(&self) -> Option<usize> {
        if self.current_clip_index >= self.clips.len() {
            return None;
        }
        let mut indices: Vec<usize> = (0..self.clips.len()).collect();
        indices.sort_by_cached_key(|i| primary_label(&self.clips[*i]).to_lowercase());
        indices.iter().position(|i| *i == self.current_clip_index)
    }

    pub fn progress(&self) -> ProgressStats {
        progress_stats(self.clips.iter().map(|c| c.scored))
    }

    /// Add another judge's notes; a judge with the same name (case-insensitive) is replaced
    pub fn add_imported_judge(&mut self, judge: ImportedJudgeData) {
        let key = judge.judge_name.trim().to_lowercase();
        match self
            .imported_judges
            .iter_mut()
            .find(|j| j.judge_name.trim().to_lowercase() == key)
        {
            Some(existing) => *existing = judge,
            None => self.imported_judges.push(judge),
        }
        self.dirty = true;
    }

    /// Parse, attach and audit another judge's project JSON
    pub fn import_judge(&mut self, raw: &serde_json::Value) -> Result<Vec<ImportAuditEntry>> {
        let judge = project::import_judge(raw, &self.clips)?;
        let audit = match self.store.current_bareme() {
            Some(bareme) => audit_imported_judge(&judge, bareme),
            None => Vec::new(),
        };
        if !audit.is_empty() {
            log::warn!("Imported judge '{}' has {} invalid scores", judge.judge_name, audit.len());
        }
        self.add_imported_judge(judge);
        Ok(audit)
    }

    /// Blank names are refused
    pub fn rename_imported_judge(&mut self, index: usize, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.imported_judges.get_mut(index) {
            Some(judge) => {
                judge.judge_name = name.to_string();
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn remove_imported_judge(&mut self, index: usize) -> bool {
        if index < self.imported_judges.len() {
            self.imported_judges.remove(index);
            self.dirty = true;
            true
        } else {
            false
        }
    }

    fn judge_name(&self) -> &str {
        self.project.as_ref().map(|p| p.judge_name.as_str()).unwrap_or("")
    }

    /// Results over every judge; `hide_totals` is taken from the session
    pub fn results(&self, options: ResultsOptions) -> Result<ResultsTable> {
        let bareme = self
            .store
            .current_bareme()
            .ok_or_else(|| NotationError::BaremeNotFound("no current bareme".to_string()))?;
        let judges = judge_sources(self.judge_name(), self.store.notes(), &self.imported_judges);
        let options = ResultsOptions { hide_totals: self.hide_totals(), ..options };
        Ok(build_results(bareme, &self.clips, &judges, options))
    }

    pub fn export_results(&self, options: ResultsOptions, judge_index: Option<usize>) -> Result<ResultsExport> {
        let table = self.results(options)?;
        let bareme = self
            .store
            .current_bareme()
            .ok_or_else(|| NotationError::BaremeNotFound("no current bareme".to_string()))?;
        let project_name = self.project.as_ref().map(|p| p.name.as_str()).unwrap_or("");
        Ok(build_results_export(&table, project_name, &bareme.id, &bareme.name, bareme.total_points(), judge_index))
    }

    pub fn note(&self, clip_id: &str) -> Option<&Note> {
        self.store.get_note_for_clip(clip_id)
    }

    /// Timecode markers of a clip's notes, bounded by the clip duration when known
    pub fn timecode_markers(&self, clip_id: &str, fps: Option<f64>) -> Vec<NoteTimecodeMarker> {
        let Some(note) = self.store.get_note_for_clip(clip_id) else {
            return Vec::new();
        };
        let max_seconds = self
            .clips
            .iter()
            .find(|c| c.id == clip_id)
            .map(|c| c.duration)
            .filter(|d| *d > 0.0);
        note_timecode_markers(note, self.store.current_bareme(), max_seconds, fps)
    }
}

fn primary_label(clip: &Clip) -> &str {
    clip.author
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(&clip.display_name)
}
