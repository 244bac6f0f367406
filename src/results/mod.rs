// Results Module
// Multi-judge aggregation: per-judge totals, category subtotals and averages per clip.

pub mod export;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bareme::{Bareme, CategoryGroup};
use crate::constants::{CURRENT_JUDGE_KEY, DEFAULT_CURRENT_JUDGE_NAME};
use crate::notation::{Note, NoteData};
use crate::project::{Clip, ImportedJudgeData};
use crate::scoring::{
    calculate_score, category_score, criterion_numeric_score, has_any_criterion_score, round_score,
    ScoreEntry, ScoreSheet,
};

pub use export::{build_results_export, ResultsExport};

/// Borrowed note of either the local judge or an imported one
#[derive(Debug, Clone, Copy)]
pub enum NoteRef<'a> {
    Local(&'a Note),
    Imported(&'a NoteData),
}

impl ScoreSheet for NoteRef<'_> {
    fn score_entry(&self, criterion_id: &str) -> Option<ScoreEntry<'_>> {
        match self {
            NoteRef::Local(note) => note.score_entry(criterion_id),
            NoteRef::Imported(note) => note.score_entry(criterion_id),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum JudgeNotes<'a> {
    Local(&'a BTreeMap<String, Note>),
    Imported(&'a BTreeMap<String, NoteData>),
}

/// One column of the results table
#[derive(Debug, Clone)]
pub struct JudgeSource<'a> {
    pub key: String,
    pub judge_name: String,
    pub is_current_judge: bool,
    notes: JudgeNotes<'a>,
}

impl<'a> JudgeSource<'a> {
    pub fn note(&self, clip_id: &str) -> Option<NoteRef<'a>> {
        match self.notes {
            JudgeNotes::Local(notes) => notes.get(clip_id).map(NoteRef::Local),
            JudgeNotes::Imported(notes) => notes.get(clip_id).map(NoteRef::Imported),
        }
    }

    pub fn info(&self) -> JudgeInfo {
        JudgeInfo {
            key: self.key.clone(),
            judge_name: self.judge_name.clone(),
            is_current_judge: self.is_current_judge,
        }
    }
}

/// Judge column header
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeInfo {
    pub key: String,
    pub judge_name: String,
    pub is_current_judge: bool,
}

/// The current judge first, then imported judges in import order
pub fn judge_sources<'a>(
    current_judge_name: &str,
    current_notes: &'a BTreeMap<String, Note>,
    imported: &'a [ImportedJudgeData],
) -> Vec<JudgeSource<'a>> {
    let name = current_judge_name.trim();
    let current = JudgeSource {
        key: CURRENT_JUDGE_KEY.to_string(),
        judge_name: if name.is_empty() { DEFAULT_CURRENT_JUDGE_NAME.to_string() } else { name.to_string() },
        is_current_judge: true,
        notes: JudgeNotes::Local(current_notes),
    };

    std::iter::once(current)
        .chain(imported.iter().enumerate().map(|(index, judge)| JudgeSource {
            key: format!("imported-{}", index),
            judge_name: judge.judge_name.clone(),
            is_current_judge: false,
            notes: JudgeNotes::Imported(&judge.notes),
        }))
        .collect()
}

/// Which judges count in a clip's averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AveragePolicy {
    /// Divide by every judge; a judge who never scored the clip counts as 0
    #[default]
    AllJudges,
    /// Divide by the judges with at least one numeric score on the clip
    ScoringJudgesOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortMode {
    /// Clip `order`, then original position
    #[default]
    Folder,
    /// Average total descending, ties keep their original position
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultsOptions {
    pub sort: SortMode,
    pub policy: AveragePolicy,
    /// Score sorting is refused while totals are hidden
    pub hide_totals: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub category: String,
    pub judge_scores: Vec<f64>,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionResult {
    pub criterion_id: String,
    pub judge_scores: Vec<f64>,
    pub average: f64,
}

/// One clip of the results table; judge vectors follow the judge column order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsRow {
    pub clip: Clip,
    pub judge_totals: Vec<f64>,
    pub average_total: f64,
    pub categories: Vec<CategoryResult>,
    pub criteria: Vec<CriterionResult>,
}

impl ResultsRow {
    pub fn category(&self, category: &str) -> Option<&CategoryResult> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn criterion(&self, criterion_id: &str) -> Option<&CriterionResult> {
        self.criteria.iter().find(|c| c.criterion_id == criterion_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsTable {
    pub judges: Vec<JudgeInfo>,
    pub category_groups: Vec<CategoryGroup>,
    pub sort_mode: SortMode,
    pub policy: AveragePolicy,
    pub rows: Vec<ResultsRow>,
}

/// Mean of the counted judges' values, rounded; 0 when nobody counts
fn average(values: &[f64], counted: &[bool]) -> f64 {
    let (sum, count) = values
        .iter()
        .zip(counted)
        .filter(|(_, counted)| **counted)
        .fold((0.0, 0usize), |(sum, count), (value, _)| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        round_score(sum / count as f64)
    }
}

fn build_row(clip: &Clip, bareme: &Bareme, groups: &[CategoryGroup], judges: &[JudgeSource<'_>], policy: AveragePolicy) -> ResultsRow {
    let notes: Vec<Option<NoteRef<'_>>> = judges.iter().map(|j| j.note(&clip.id)).collect();

    let counted: Vec<bool> = match policy {
        AveragePolicy::AllJudges => vec![true; notes.len()],
        AveragePolicy::ScoringJudgesOnly => notes
            .iter()
            .map(|n| n.map(|note| has_any_criterion_score(&note, bareme)).unwrap_or(false))
            .collect(),
    };

    let judge_totals: Vec<f64> = notes
        .iter()
        .map(|n| n.map(|note| calculate_score(&note, bareme)).unwrap_or(0.0))
        .collect();

    let categories = groups
        .iter()
        .map(|group| {
            let judge_scores: Vec<f64> = notes
                .iter()
                .map(|n| n.map(|note| category_score(&note, bareme, &group.category)).unwrap_or(0.0))
                .collect();
            CategoryResult {
                category: group.category.clone(),
                average: average(&judge_scores, &counted),
                judge_scores,
            }
        })
        .collect();

    let criteria = groups
        .iter()
        .flat_map(|group| group.criteria.iter())
        .map(|criterion| {
            let judge_scores: Vec<f64> = notes
                .iter()
                .map(|n| criterion_numeric_score(n.as_ref(), criterion))
                .collect();
            CriterionResult {
                criterion_id: criterion.id.clone(),
                average: average(&judge_scores, &counted),
                judge_scores,
            }
        })
        .collect();

    ResultsRow {
        clip: clip.clone(),
        average_total: average(&judge_totals, &counted),
        judge_totals,
        categories,
        criteria,
    }
}

/// Score sorting falls back to folder order while totals are hidden
pub fn effective_sort_mode(requested: SortMode, hide_totals: bool) -> SortMode {
    if requested == SortMode::Score && hide_totals {
        SortMode::Folder
    } else {
        requested
    }
}

/// Aggregate every judge over every clip
pub fn build_results(
    bareme: &Bareme,
    clips: &[Clip],
    judges: &[JudgeSource<'_>],
    options: ResultsOptions,
) -> ResultsTable {
    let groups = bareme.category_groups();
    let sort_mode = effective_sort_mode(options.sort, options.hide_totals);

    let mut rows: Vec<ResultsRow> = clips
        .iter()
        .map(|clip| build_row(clip, bareme, &groups, judges, options.policy))
        .collect();

    // Stable sorts keep the original clip position as the tie-breaker
    match sort_mode {
        SortMode::Folder => rows.sort_by_key(|row| row.clip.order),
        SortMode::Score => rows.sort_by(|a, b| b.average_total.total_cmp(&a.average_total)),
    }

    ResultsTable {
        judges: judges.iter().map(JudgeSource::info).collect(),
        category_groups: groups,
        sort_mode,
        policy: options.policy,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bareme::{BaremeRegistry, Criterion};
    use crate::notation::{CriterionScoreData, NotationStore};
    use crate::scoring::ScoreValue;

    /// Two criteria in two categories, total 20
    fn bareme() -> Bareme {
        Bareme::new(
            "b20",
            "B20",
            vec![
                Criterion::numeric("image", "Image", 10.0).with_category("Visuel"),
                Criterion::numeric("son", "Son", 10.0).with_category("Audio"),
            ],
        )
    }

    fn store() -> NotationStore {
        let mut registry = BaremeRegistry::new();
        registry.set_current(bareme());
        NotationStore::with_registry(registry)
    }

    fn clip(id: &str, order: i64) -> Clip {
        let mut clip = Clip::from_file(&format!("{}.mp4", id), "", order);
        clip.id = id.to_string();
        clip
    }

    fn imported(name: &str, scores: &[(&str, &str, f64)]) -> ImportedJudgeData {
        let mut notes: BTreeMap<String, NoteData> = BTreeMap::new();
        for (clip_id, criterion_id, value) in scores {
            let note = notes.entry(clip_id.to_string()).or_default();
            note.clip_id = clip_id.to_string();
            note.scores.insert(
                criterion_id.to_string(),
                CriterionScoreData {
                    criterion_id: criterion_id.to_string(),
                    value: ScoreValue::Number(*value),
                    is_valid: true,
                },
            );
        }
        ImportedJudgeData { judge_name: name.to_string(), notes }
    }

    #[test]
    fn test_average_divides_by_all_judges() {
        let mut store = store();
        store.update_criterion("x", "image", 10.0);
        store.update_criterion("x", "son", 5.0);
        let others = vec![imported("B", &[])];
        let judges = judge_sources("A", store.notes(), &others);

        let table = build_results(&bareme(), &[clip("x", 0)], &judges, ResultsOptions::default());
        let row = &table.rows[0];
        assert_eq!(row.judge_totals, vec![15.0, 0.0]);
        assert_eq!(row.average_total, 7.5);
        assert_eq!(row.category("Visuel").unwrap().average, 5.0);
        assert_eq!(row.criterion("son").unwrap().judge_scores, vec![5.0, 0.0]);

        let options = ResultsOptions { policy: AveragePolicy::ScoringJudgesOnly, ..Default::default() };
        let table = build_results(&bareme(), &[clip("x", 0)], &judges, options);
        assert_eq!(table.rows[0].average_total, 15.0);
        assert_eq!(table.rows[0].category("Audio").unwrap().average, 5.0);
    }

    #[test]
    fn test_judge_sources_order_and_default_name() {
        let store = store();
        let others = vec![imported("B", &[]), imported("C", &[])];
        let judges = judge_sources("  ", store.notes(), &others);
        let names: Vec<&str> = judges.iter().map(|j| j.judge_name.as_str()).collect();
        assert_eq!(names, vec![DEFAULT_CURRENT_JUDGE_NAME, "B", "C"]);
        assert!(judges[0].is_current_judge);
        assert_eq!(judges[2].key, "imported-1");
    }

    #[test]
    fn test_sort_by_score_is_stable() {
        let mut store = store();
        store.update_criterion("a", "image", 4.0);
        store.update_criterion("b", "image", 9.0);
        store.update_criterion("c", "image", 4.0);
        let judges = judge_sources("A", store.notes(), &[]);
        let clips = vec![clip("a", 2), clip("b", 1), clip("c", 0)];

        let by_score = ResultsOptions { sort: SortMode::Score, ..Default::default() };
        let table = build_results(&bareme(), &clips, &judges, by_score);
        let ids: Vec<&str> = table.rows.iter().map(|r| r.clip.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let table = build_results(&bareme(), &clips, &judges, ResultsOptions::default());
        let ids: Vec<&str> = table.rows.iter().map(|r| r.clip.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let hidden = ResultsOptions { sort: SortMode::Score, hide_totals: true, ..Default::default() };
        let table = build_results(&bareme(), &clips, &judges, hidden);
        assert_eq!(table.sort_mode, SortMode::Folder);
    }

    #[test]
    fn test_imported_invalid_scores_do_not_count() {
        let store = store();
        let mut judge = imported("B", &[("x", "image", 8.0), ("x", "son", 6.0)]);
        judge.notes.get_mut("x").unwrap().scores.get_mut("son").unwrap().is_valid = false;
        let others = vec![judge];
        let judges = judge_sources("A", store.notes(), &others);

        let table = build_results(&bareme(), &[clip("x", 0)], &judges, ResultsOptions::default());
        assert_eq!(table.rows[0].judge_totals, vec![0.0, 8.0]);
        assert_eq!(table.rows[0].criterion("son").unwrap().judge_scores, vec![0.0, 0.0]);
    }
}
