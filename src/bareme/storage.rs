// Custom rubric files
// One pretty-printed JSON file per rubric inside the rubrics folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use super::Bareme;
use crate::constants::{BAREME_FALLBACK_FILENAME, JSON_EXTENSION};
use crate::error::{NotationError, Result};

/// Map a rubric id to a safe file stem (`[A-Za-z0-9_-]`, others become `_`)
pub fn sanitize_file_name(id: &str) -> String {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return BAREME_FALLBACK_FILENAME.to_string();
    }
    trimmed
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}

pub fn bareme_file_path(folder: &Path, bareme_id: &str) -> PathBuf {
    folder.join(format!("{}.{}", sanitize_file_name(bareme_id), JSON_EXTENSION))
}

/// Write a custom rubric; official rubrics are built in and never written
pub fn save_bareme(folder: &Path, bareme: &Bareme) -> Result<PathBuf> {
    if bareme.is_official {
        return Err(NotationError::InvalidBareme(format!(
            "official bareme '{}' cannot be saved",
            bareme.id
        )));
    }
    bareme.check()?;
    fs::create_dir_all(folder)?;
    let path = bareme_file_path(folder, &bareme.id);
    let json = serde_json::to_string_pretty(bareme)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Delete a rubric file; deleting a missing file is not an error
pub fn delete_bareme(folder: &Path, bareme_id: &str) -> Result<()> {
    let path = bareme_file_path(folder, bareme_id);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Raw JSON of every readable `*.json` file in the folder (non-recursive).
/// Unreadable or unparsable files are skipped.
pub fn load_bareme_files(folder: &Path) -> Result<Vec<Value>> {
    if !folder.exists() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(JSON_EXTENSION))
        .collect();
    entries.sort();

    let mut out = Vec::new();
    for path in entries {
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to read bareme file {}: {}", path.display(), e);
                continue;
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(value) => out.push(value),
            Err(e) => log::warn!("Failed to parse bareme file {}: {}", path.display(), e),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bareme::{parse_bareme, Criterion};
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("  "), "bareme");
        assert_eq!(sanitize_file_name("mon barème/2"), "mon_bar_me_2");
        assert_eq!(sanitize_file_name("ok-id_1"), "ok-id_1");
    }

    #[test]
    fn test_save_load_delete() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path().join("Baremes");
        let bareme = Bareme::new("club 2026", "Club", vec![Criterion::numeric("a", "A", 5.0).with_weight(2.0)]);

        let path = save_bareme(&folder, &bareme).unwrap();
        assert!(path.ends_with("club_2026.json"));
        std::fs::write(folder.join("broken.json"), "{ not json").unwrap();
        std::fs::write(folder.join("notes.txt"), "ignored").unwrap();

        let raw = load_bareme_files(&folder).unwrap();
        assert_eq!(raw.len(), 1);
        let reloaded = parse_bareme(&raw[0]).unwrap();
        assert_eq!(reloaded.id, "club 2026");
        assert_eq!(reloaded.total_points(), 10.0);

        delete_bareme(&folder, "club 2026").unwrap();
        assert!(!path.exists());
        delete_bareme(&folder, "club 2026").unwrap();
    }

    #[test]
    fn test_official_is_not_saved() {
        let tmp = TempDir::new().unwrap();
        assert!(save_bareme(tmp.path(), &Bareme::official()).is_err());
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(load_bareme_files(&tmp.path().join("nope")).unwrap().is_empty());
    }
}
