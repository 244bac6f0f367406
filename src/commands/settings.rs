// AMV Notation - User Settings Commands
// Persistent user-level settings in <app folder>/settings.json

use super::SessionState;
use crate::config::{load_user_settings, save_user_settings, UserSettings};

pub fn get_user_settings(state: &SessionState) -> Result<UserSettings, String> {
    load_user_settings(&state.paths).map_err(|e| e.to_string())
}

pub fn set_user_settings(state: &SessionState, settings: UserSettings) -> Result<(), String> {
    save_user_settings(&state.paths, &settings).map_err(|e| e.to_string())
}

/// Put the open project at the front of the recent list
pub fn remember_current_project(state: &SessionState) -> Result<UserSettings, String> {
    let (path, name) = {
        let session = state.lock()?;
        let project = session.project().ok_or("No project open")?;
        let path = project.file_path.clone().ok_or("Project has not been saved")?;
        (path, project.name.clone())
    };
    let mut settings = load_user_settings(&state.paths).map_err(|e| e.to_string())?;
    settings.remember_project(&path, &name);
    save_user_settings(&state.paths, &settings).map_err(|e| e.to_string())?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::save_project;
    use crate::commands::test_support::state;
    use tempfile::TempDir;

    #[test]
    fn test_recent_projects_follow_saves() {
        let tmp = TempDir::new().unwrap();
        let state = state(&tmp);
        assert!(remember_current_project(&state).is_err());

        let path = save_project(&state, None).unwrap();
        let settings = remember_current_project(&state).unwrap();
        assert_eq!(settings.recent_projects[0].path, path);
        assert_eq!(get_user_settings(&state).unwrap().recent_projects.len(), 1);

        let mut settings = get_user_settings(&state).unwrap();
        settings.default_judge_name = "Sam".into();
        set_user_settings(&state, settings).unwrap();
        assert_eq!(get_user_settings(&state).unwrap().default_judge_name, "Sam");
    }
}
