// Results export document
// Ranked rows with judge totals and category breakdowns keyed by judge name.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ResultsRow, ResultsTable};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub clip_id: String,
    pub rank: usize,
    pub pseudo: String,
    pub clip_name: String,
    pub average_total: f64,
    /// Ranking score: the selected judge's total, else the average
    pub displayed_total: f64,
    pub category_averages: BTreeMap<String, f64>,
    pub criterion_averages: BTreeMap<String, f64>,
    pub category_by_judge: BTreeMap<String, BTreeMap<String, f64>>,
    pub judge_totals: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsExport {
    pub exported_at: String,
    pub project_name: String,
    pub bareme_id: String,
    pub bareme_name: String,
    pub total_points: f64,
    pub judge_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_judge: Option<String>,
    pub rows: Vec<ExportRow>,
}

fn primary_label(row: &ResultsRow) -> String {
    row.clip
        .author
        .clone()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| row.clip.display_name.clone())
}

fn displayed_total(row: &ResultsRow, judge_index: Option<usize>) -> f64 {
    match judge_index {
        Some(index) => row.judge_totals.get(index).copied().unwrap_or(0.0),
        None => row.average_total,
    }
}

/// Rank the table (best first, ties keep table order) and flatten it for export.
/// With `judge_index`, rows are ranked on that judge's totals instead of the average.
pub fn build_results_export(
    table: &ResultsTable,
    project_name: &str,
    bareme_id: &str,
    bareme_name: &str,
    total_points: f64,
    judge_index: Option<usize>,
) -> ResultsExport {
    let judge_index = judge_index.filter(|i| *i < table.judges.len());

    let mut ranked: Vec<&ResultsRow> = table.rows.iter().collect();
    ranked.sort_by(|a, b| displayed_total(b, judge_index).total_cmp(&displayed_total(a, judge_index)));

    let rows = ranked
        .into_iter()
        .enumerate()
        .map(|(position, row)| {
            let by_judge = |scores: &[f64]| -> BTreeMap<String, f64> {
                table
                    .judges
                    .iter()
                    .zip(scores)
                    .map(|(judge, score)| (judge.judge_name.clone(), *score))
                    .collect()
            };

            ExportRow {
                clip_id: row.clip.id.clone(),
                rank: position + 1,
                pseudo: primary_label(row),
                clip_name: row.clip.display_name.clone(),
                average_total: row.average_total,
                displayed_total: displayed_total(row, judge_index),
                category_averages: row.categories.iter().map(|c| (c.category.clone(), c.average)).collect(),
                criterion_averages: row.criteria.iter().map(|c| (c.criterion_id.clone(), c.average)).collect(),
                category_by_judge: row
                    .categories
                    .iter()
                    .map(|c| (c.category.clone(), by_judge(&c.judge_scores)))
                    .collect(),
                judge_totals: by_judge(&row.judge_totals),
            }
        })
        .collect();

    ResultsExport {
        exported_at: chrono::Utc::now().to_rfc3339(),
        project_name: project_name.to_string(),
        bareme_id: bareme_id.to_string(),
        bareme_name: bareme_name.to_string(),
        total_points,
        judge_count: table.judges.len(),
        selected_judge: judge_index.map(|i| table.judges[i].judge_name.clone()),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bareme::{Bareme, BaremeRegistry, Criterion};
    use crate::notation::NotationStore;
    use crate::project::{Clip, ImportedJudgeData};
    use crate::results::{build_results, judge_sources, ResultsOptions};
    use crate::scoring::ScoreValue;

    #[test]
    fn test_export_ranks_and_keys_by_judge() {
        let bareme = Bareme::new("b", "B", vec![Criterion::numeric("a", "A", 10.0).with_category("Cat")]);
        let mut registry = BaremeRegistry::new();
        registry.set_current(bareme.clone());
        let mut store = NotationStore::with_registry(registry);
        store.update_criterion("one", "a", 3.0);
        store.update_criterion("two", "a", 8.0);

        let mut one = Clip::from_file("Ann-First.mp4", "", 0);
        one.id = "one".to_string();
        let mut two = Clip::from_file("Second.mp4", "", 1);
        two.id = "two".to_string();

        let mut other = store.get_notes_data();
        other.get_mut("one").unwrap().scores.get_mut("a").unwrap().value = ScoreValue::Number(10.0);
        let imported = vec![ImportedJudgeData { judge_name: "Lee".to_string(), notes: other }];
        let judges = judge_sources("Sam", store.notes(), &imported);
        let table = build_results(&bareme, &[one, two], &judges, ResultsOptions::default());

        let export = build_results_export(&table, "Proj", &bareme.id, &bareme.name, bareme.total_points(), None);
        assert_eq!(export.judge_count, 2);
        assert_eq!(export.rows[0].clip_id, "two");
        assert_eq!(export.rows[0].rank, 1);
        assert_eq!(export.rows[0].pseudo, "Second");
        assert_eq!(export.rows[1].pseudo, "Ann");
        assert_eq!(export.rows[1].judge_totals["Lee"], 10.0);
        assert_eq!(export.rows[1].category_by_judge["Cat"]["Sam"], 3.0);
        assert_eq!(export.rows[1].category_averages["Cat"], 6.5);

        // Ranked on Lee's totals: 10 beats 8
        let export = build_results_export(&table, "Proj", &bareme.id, &bareme.name, bareme.total_points(), Some(1));
        assert_eq!(export.rows[0].clip_id, "one");
        assert_eq!(export.selected_judge.as_deref(), Some("Lee"));
    }
}
