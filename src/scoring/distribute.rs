// Category score distribution
// Spreads a category-level target over the category's criteria.

use std::collections::BTreeMap;

use super::{criterion_numeric_score, ScoreSheet};
use crate::bareme::Criterion;
use crate::constants::{DEFAULT_CRITERION_STEP, DISTRIBUTE_MAX_PASSES};

/// Smallest positive step among the criteria, 0.5 when none is set
pub fn group_step(criteria: &[Criterion]) -> f64 {
    criteria
        .iter()
        .filter_map(|c| c.step.filter(|s| s.is_finite() && *s > 0.0))
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))))
        .unwrap_or(DEFAULT_CRITERION_STEP)
}

fn round_to_step(value: f64, step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Split `target` over `criteria`.
///
/// The target is in category points, so each criterion counts `value * weight`.
/// Shares follow the judge's current points, or each criterion's `max * weight` when
/// nothing is scored yet. Values are rounded to the group step and kept within `[0, max]`,
/// then nudged one step at a time while that brings the weighted sum closer to the target
/// clamped to `[0, sum of max * weight]`.
pub fn distribute_category_score<S: ScoreSheet>(
    criteria: &[Criterion],
    note: Option<&S>,
    target: f64,
) -> BTreeMap<String, f64> {
    // Criteria with no positive weight or max take no share
    let weights: Vec<f64> = criteria
        .iter()
        .map(|c| if c.weight.is_finite() && c.weight > 0.0 && c.max_value() > 0.0 { c.weight } else { 0.0 })
        .collect();
    let maxima: Vec<f64> = criteria.iter().map(Criterion::max_value).collect();
    let total_max: f64 = maxima.iter().zip(&weights).map(|(max, w)| max * w).sum();
    if total_max <= 0.0 {
        return criteria.iter().map(|c| (c.id.clone(), 0.0)).collect();
    }

    let target = if target.is_finite() { target.clamp(0.0, total_max) } else { 0.0 };
    let step = group_step(criteria);

    let current: Vec<f64> = criteria
        .iter()
        .zip(&weights)
        .map(|(c, w)| criterion_numeric_score(note, c) * w)
        .collect();
    let current_total: f64 = current.iter().sum();

    let mut rounded: Vec<f64> = (0..criteria.len())
        .map(|i| {
            let (max, weight) = (maxima[i], weights[i]);
            if weight <= 0.0 {
                return 0.0;
            }
            let share = if current_total > 0.0 {
                current[i] / current_total * target
            } else {
                max * weight / total_max * target
            };
            round_to_step((share / weight).min(max), step).clamp(0.0, max)
        })
        .collect();

    let points = |values: &[f64]| -> f64 { values.iter().zip(&weights).map(|(v, w)| v * w).sum() };
    let smallest_weight = weights.iter().copied().filter(|w| *w > 0.0).fold(f64::INFINITY, f64::min);
    let tolerance = step * smallest_weight / 2.0;

    let mut delta = target - points(&rounded);
    let mut passes = 0;
    while delta.abs() >= tolerance && passes < DISTRIBUTE_MAX_PASSES {
        let direction = if delta > 0.0 { 1.0 } else { -1.0 };
        let mut adjusted = false;

        for i in 0..rounded.len() {
            let (max, weight) = (maxima[i], weights[i]);
            let next = rounded[i] + direction * step;
            let change = direction * step * weight;
            if weight <= 0.0 || next < 0.0 || next > max || (delta - change).abs() >= delta.abs() {
                continue;
            }
            rounded[i] = round_to_step(next, step);
            delta -= change;
            adjusted = true;
            if delta.abs() < tolerance {
                break;
            }
        }

        if !adjusted {
            break;
        }
        passes += 1;
    }

    criteria
        .iter()
        .zip(rounded)
        .map(|(c, value)| (c.id.clone(), (value * 1000.0).round() / 1000.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ScoreEntry, ScoreValue};
    use std::collections::HashMap;

    struct Sheet(HashMap<String, ScoreValue>);

    impl ScoreSheet for Sheet {
        fn score_entry(&self, criterion_id: &str) -> Option<ScoreEntry<'_>> {
            self.0.get(criterion_id).map(|value| ScoreEntry { value, is_valid: true })
        }
    }

    fn criteria() -> Vec<Criterion> {
        vec![
            Criterion::numeric("a", "A", 4.0),
            Criterion::numeric("b", "B", 6.0),
        ]
    }

    #[test]
    fn test_unscored_split_follows_max() {
        let out = distribute_category_score::<Sheet>(&criteria(), None, 5.0);
        assert_eq!(out["a"], 2.0);
        assert_eq!(out["b"], 3.0);
    }

    #[test]
    fn test_split_follows_current_values() {
        let sheet = Sheet(HashMap::from([
            ("a".to_string(), ScoreValue::Number(3.0)),
            ("b".to_string(), ScoreValue::Number(1.0)),
        ]));
        let out = distribute_category_score(&criteria(), Some(&sheet), 8.0);
        assert_eq!(out["a"], 4.0);
        assert_eq!(out["a"] + out["b"], 8.0);
    }

    #[test]
    fn test_target_clamped_to_group_max() {
        let out = distribute_category_score::<Sheet>(&criteria(), None, 50.0);
        assert_eq!(out["a"], 4.0);
        assert_eq!(out["b"], 6.0);
        let out = distribute_category_score::<Sheet>(&criteria(), None, -3.0);
        assert_eq!(out["a"] + out["b"], 0.0);
    }

    #[test]
    fn test_weighted_split_hits_category_points() {
        let list = vec![
            Criterion::numeric("a", "A", 10.0),
            Criterion::numeric("b", "B", 5.0).with_weight(2.0),
        ];
        let out = distribute_category_score::<Sheet>(&list, None, 10.0);
        assert_eq!(out["a"], 5.0);
        assert_eq!(out["b"], 2.5);

        let out = distribute_category_score::<Sheet>(&list, None, 7.0);
        assert_eq!(out["a"] + out["b"] * 2.0, 7.0);
        assert!(out["b"] <= 5.0);

        let out = distribute_category_score::<Sheet>(&list, None, 40.0);
        assert_eq!(out["a"], 10.0);
        assert_eq!(out["b"], 5.0);
    }

    #[test]
    fn test_group_step_uses_smallest() {
        let list = vec![
            Criterion::numeric("a", "A", 4.0).with_step(1.0),
            Criterion::numeric("b", "B", 4.0).with_step(0.25),
        ];
        assert_eq!(group_step(&list), 0.25);
        assert_eq!(group_step(&[]), DEFAULT_CRITERION_STEP);
    }
}
