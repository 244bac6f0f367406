// Score aggregation
// Pure functions turning recorded criterion scores into category and clip totals.

use serde::Serialize;

use super::ScoreSheet;
use crate::bareme::{Bareme, Criterion, CriterionType};
use crate::constants::SCORE_ROUNDING_FACTOR;

/// `round(value * 100) / 100`
pub fn round_score(value: f64) -> f64 {
    (value * SCORE_ROUNDING_FACTOR).round() / SCORE_ROUNDING_FACTOR
}

/// Contribution of one criterion: valid numeric/slider value times weight, else 0
fn contribution<S: ScoreSheet>(note: &S, criterion: &Criterion) -> f64 {
    if !criterion.criterion_type.is_numeric() {
        return 0.0;
    }
    match note.score_entry(&criterion.id) {
        Some(entry) if entry.is_valid => entry
            .value
            .as_number()
            .map(|n| n * criterion.weight)
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Clip total over every criterion of the rubric
pub fn calculate_score<S: ScoreSheet>(note: &S, bareme: &Bareme) -> f64 {
    round_score(bareme.criteria().iter().map(|c| contribution(note, c)).sum())
}

/// Subtotal over the criteria of one category (`"General"` selects uncategorized criteria)
pub fn category_score<S: ScoreSheet>(note: &S, bareme: &Bareme, category: &str) -> f64 {
    round_score(bareme.criteria_in_category(category).map(|c| contribution(note, c)).sum())
}

/// Every required criterion has a present and valid score
pub fn is_note_complete<S: ScoreSheet>(note: &S, bareme: &Bareme) -> bool {
    bareme
        .criteria()
        .iter()
        .filter(|c| c.required)
        .all(|c| matches!(note.score_entry(&c.id), Some(entry) if entry.is_valid && !entry.value.is_empty()))
}

/// Numeric value shown in detailed per-criterion tables.
///
/// Booleans read as 0 or the criterion max, numbers are clamped to the defined bounds
/// and never read below 0 when no minimum is set.
/// Anything absent, invalid or non-numeric reads as 0.
pub fn criterion_numeric_score<S: ScoreSheet>(note: Option<&S>, criterion: &Criterion) -> f64 {
    let Some(entry) = note.and_then(|n| n.score_entry(&criterion.id)) else {
        return 0.0;
    };
    if !entry.is_valid {
        return 0.0;
    }
    if criterion.criterion_type == CriterionType::Boolean {
        return match entry.value.as_bool() {
            Some(true) => criterion.max_value(),
            _ => 0.0,
        };
    }
    entry
        .value
        .as_number()
        .map(|n| criterion.clamp(n).max(criterion.min.filter(|v| v.is_finite()).unwrap_or(0.0)))
        .unwrap_or(0.0)
}

/// At least one criterion of the rubric has a recorded number
pub fn has_any_criterion_score<S: ScoreSheet>(note: &S, bareme: &Bareme) -> bool {
    bareme.criteria().iter().any(|c| {
        note.score_entry(&c.id)
            .map(|entry| entry.value.as_number().is_some())
            .unwrap_or(false)
    })
}

/// Clip completion counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub scored: usize,
    pub total: usize,
    pub remaining: usize,
    /// Rounded to the nearest integer percent
    pub percentage: u32,
}

/// Count scored clips from their `scored` flags
pub fn progress_stats<I>(scored_flags: I) -> ProgressStats
where
    I: IntoIterator<Item = bool>,
{
    let (mut scored, mut total) = (0usize, 0usize);
    for flag in scored_flags {
        total += 1;
        if flag {
            scored += 1;
        }
    }
    let percentage = if total == 0 {
        0
    } else {
        ((scored as f64 / total as f64) * 100.0).round() as u32
    };
    ProgressStats { scored, total, remaining: total - scored, percentage }
}
