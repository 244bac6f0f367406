// AMV Notation - Results Commands
// Multi-judge results table and its JSON export

use std::path::Path;

use super::SessionState;
use crate::project::export_json_file;
use crate::results::{AveragePolicy, ResultsExport, ResultsOptions, ResultsTable, SortMode};

pub fn get_results(
    state: &SessionState,
    sort: Option<SortMode>,
    policy: Option<AveragePolicy>,
) -> Result<ResultsTable, String> {
    let options = ResultsOptions {
        sort: sort.unwrap_or_default(),
        policy: policy.unwrap_or_default(),
        ..Default::default()
    };
    state.lock()?.results(options).map_err(|e| e.to_string())
}

/// Write the ranked export document; `judge_index` ranks on one judge's totals
pub fn export_results(
    state: &SessionState,
    path: String,
    policy: Option<AveragePolicy>,
    judge_index: Option<usize>,
) -> Result<ResultsExport, String> {
    let options = ResultsOptions { policy: policy.unwrap_or_default(), ..Default::default() };
    let export = state.lock()?.export_results(options, judge_index).map_err(|e| e.to_string())?;
    export_json_file(Path::new(&path), &export).map_err(|e| e.to_string())?;
    log::info!("Exported results for {} clips to {}", export.rows.len(), path);
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::state;
    use crate::commands::update_criterion;
    use crate::scoring::ScoreValue;
    use tempfile::TempDir;

    #[test]
    fn test_results_and_export_file() {
        let tmp = TempDir::new().unwrap();
        let state = state(&tmp);
        update_criterion(&state, "c1".into(), "rythme".into(), ScoreValue::Number(9.0)).unwrap();
        update_criterion(&state, "c0".into(), "son".into(), ScoreValue::Number(3.0)).unwrap();

        let table = get_results(&state, Some(SortMode::Score), None).unwrap();
        assert_eq!(table.rows[0].clip.id, "c1");
        assert_eq!(table.judges.len(), 1);

        let out = tmp.path().join("exports").join("results.json");
        let export = export_results(&state, out.to_string_lossy().to_string(), None, None).unwrap();
        assert_eq!(export.rows[0].displayed_total, 9.0);
        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["projectName"], "Convention");
        assert_eq!(written["rows"][1]["pseudo"], "Abe");
    }
}
