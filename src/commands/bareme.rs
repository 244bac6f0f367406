// AMV Notation - Bareme Commands
// Rubric selection and custom rubric files

use serde::Serialize;
use serde_json::Value;

use super::SessionState;
use crate::bareme::storage::{delete_bareme, load_bareme_files, save_bareme};
use crate::bareme::{parse_bareme, Bareme};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaremeDeletion {
    pub deleted_file: bool,
    pub current_bareme_id: Option<String>,
}

pub fn list_baremes(state: &SessionState) -> Result<Vec<Bareme>, String> {
    Ok(state.lock()?.store().baremes().available().to_vec())
}

pub fn get_current_bareme(state: &SessionState) -> Result<Option<Bareme>, String> {
    Ok(state.lock()?.current_bareme().cloned())
}

/// Make a registered rubric current; notes are kept as they are
pub fn select_bareme(state: &SessionState, bareme_id: String) -> Result<Bareme, String> {
    let mut session = state.lock()?;
    if !session.store_mut().baremes_mut().select(&bareme_id) {
        return Err(format!("Bareme not found: {}", bareme_id));
    }
    if let Some(project) = session.project_mut() {
        project.bareme_id = bareme_id;
    }
    session.mark_dirty();
    session.current_bareme().cloned().ok_or_else(|| "No bareme selected".to_string())
}

/// Reload custom rubrics from the rubrics folder; returns how many were kept
pub fn reload_custom_baremes(state: &SessionState) -> Result<usize, String> {
    let folder = state.paths.baremes_folder().map_err(|e| e.to_string())?;
    let items = load_bareme_files(&folder).map_err(|e| e.to_string())?;
    Ok(state.lock()?.store_mut().baremes_mut().load_custom(&items))
}

/// Parse, store and register a custom rubric
pub fn save_custom_bareme(state: &SessionState, raw: Value) -> Result<Bareme, String> {
    let bareme = parse_bareme(&raw).map_err(|e| e.to_string())?;
    let folder = state.paths.baremes_folder().map_err(|e| e.to_string())?;
    save_bareme(&folder, &bareme).map_err(|e| e.to_string())?;
    state.lock()?.store_mut().baremes_mut().upsert(bareme.clone());
    log::info!("Saved custom bareme {}", bareme.id);
    Ok(bareme)
}

pub fn delete_custom_bareme(state: &SessionState, bareme_id: String) -> Result<BaremeDeletion, String> {
    let mut session = state.lock()?;
    let removal = session.store_mut().baremes_mut().remove(&bareme_id);
    if removal.should_delete_file {
        let folder = state.paths.baremes_folder().map_err(|e| e.to_string())?;
        delete_bareme(&folder, &bareme_id).map_err(|e| e.to_string())?;
    }
    Ok(BaremeDeletion {
        deleted_file: removal.should_delete_file,
        current_bareme_id: session.current_bareme().map(|b| b.id.clone()),
    })
}
