// AMV Notation - Application paths and user settings
// Everything lives under <Documents>/AMV Notation unless AMV_NOTATION_HOME overrides it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::constants::{
    APP_FOLDER, BAREMES_FOLDER, HOME_ENV_VAR, MAX_RECENT_PROJECTS, PROJECTS_FOLDER, SETTINGS_FILENAME,
};
use crate::error::{NotationError, Result};

/// Folder layout of the application data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Use an explicit root folder
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the default root: env override, then Documents, then home directory
    pub fn default_location() -> Result<Self> {
        if let Ok(home) = std::env::var(HOME_ENV_VAR) {
            if !home.trim().is_empty() {
                return Ok(Self::at(home));
            }
        }

        let documents = UserDirs::new().and_then(|dirs| dirs.document_dir().map(Path::to_path_buf));
        let base = match documents {
            Some(dir) => dir,
            None => BaseDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .ok_or_else(|| NotationError::InvalidPath("Cannot find Documents folder".to_string()))?,
        };
        Ok(Self::at(base.join(APP_FOLDER)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root folder, created on demand
    pub fn app_root_folder(&self) -> Result<PathBuf> {
        ensure_directory_exists(&self.root)?;
        Ok(self.root.clone())
    }

    pub fn projects_folder(&self) -> Result<PathBuf> {
        let folder = self.root.join(PROJECTS_FOLDER);
        ensure_directory_exists(&folder)?;
        Ok(folder)
    }

    /// Custom rubrics are kept next to the projects
    pub fn baremes_folder(&self) -> Result<PathBuf> {
        let folder = self.projects_folder()?.join(BAREMES_FOLDER);
        ensure_directory_exists(&folder)?;
        Ok(folder)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILENAME)
    }
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Recently opened project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProject {
    pub path: String,
    pub name: String,
    pub last_opened: String,
}

/// Persistent user-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default, alias = "default_judge_name")]
    pub default_judge_name: String,
    #[serde(default, alias = "last_bareme_id", skip_serializing_if = "Option::is_none")]
    pub last_bareme_id: Option<String>,
    #[serde(default, alias = "interface_mode")]
    pub interface_mode: InterfaceMode,
    #[serde(default, alias = "recent_projects")]
    pub recent_projects: Vec<RecentProject>,
    /// Keys written by other app versions, preserved on save
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            default_judge_name: String::new(),
            last_bareme_id: None,
            interface_mode: InterfaceMode::default(),
            recent_projects: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Notation interface layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceMode {
    #[default]
    Spreadsheet,
    Modern,
    Notation,
}

impl UserSettings {
    /// Move a project to the front of the recent list (deduped by path, capped)
    pub fn remember_project(&mut self, path: &str, name: &str) {
        self.recent_projects.retain(|p| p.path != path);
        self.recent_projects.insert(
            0,
            RecentProject {
                path: path.to_string(),
                name: name.to_string(),
                last_opened: chrono::Utc::now().to_rfc3339(),
            },
        );
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);
    }
}

/// Load settings; a missing file yields defaults
pub fn load_user_settings(paths: &AppPaths) -> Result<UserSettings> {
    let path = paths.settings_file();
    if !path.exists() {
        return Ok(UserSettings::default());
    }
    let json = fs::read_to_string(&path)?;
    if json.trim().is_empty() || json.trim() == "null" {
        return Ok(UserSettings::default());
    }
    Ok(serde_json::from_str(&json)?)
}

pub fn save_user_settings(paths: &AppPaths, settings: &UserSettings) -> Result<()> {
    paths.app_root_folder()?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(paths.settings_file(), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_folders_created_on_demand() {
        let tmp = TempDir::new().unwrap();
        let paths = AppPaths::at(tmp.path().join("app"));
        let baremes = paths.baremes_folder().unwrap();
        assert!(baremes.exists());
        assert!(baremes.starts_with(paths.projects_folder().unwrap()));
    }

    #[test]
    fn test_settings_roundtrip_preserves_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let paths = AppPaths::at(tmp.path());

        assert_eq!(load_user_settings(&paths).unwrap(), UserSettings::default());

        std::fs::write(
            paths.settings_file(),
            r#"{"default_judge_name": "Alex", "theme": "dark", "interfaceMode": "modern"}"#,
        )
        .unwrap();
        let mut settings = load_user_settings(&paths).unwrap();
        assert_eq!(settings.default_judge_name, "Alex");
        assert_eq!(settings.interface_mode, InterfaceMode::Modern);

        settings.remember_project("/tmp/a.json", "A");
        save_user_settings(&paths, &settings).unwrap();

        let reloaded = load_user_settings(&paths).unwrap();
        assert_eq!(reloaded.extra.get("theme"), Some(&serde_json::json!("dark")));
        assert_eq!(reloaded.recent_projects.len(), 1);
    }

    #[test]
    fn test_recent_projects_capped_and_deduped() {
        let mut settings = UserSettings::default();
        for i in 0..15 {
            settings.remember_project(&format!("/p/{}.json", i), "P");
        }
        settings.remember_project("/p/3.json", "P");
        assert_eq!(settings.recent_projects.len(), MAX_RECENT_PROJECTS);
        assert_eq!(settings.recent_projects[0].path, "/p/3.json");
        assert_eq!(settings.recent_projects.iter().filter(|p| p.path == "/p/3.json").count(), 1);
    }
}
