// AMV Notation - Commands Module
// Command surface for a desktop shell, organized by domain.
// Every command takes the shared session state and returns `Result<T, String>`.

pub mod bareme;
pub mod notation;
pub mod project;
pub mod results;
pub mod settings;
pub mod sync;

pub use bareme::*;
pub use notation::*;
pub use project::*;
pub use results::*;
pub use settings::*;
pub use sync::*;

use std::sync::{Mutex, MutexGuard};

use crate::config::AppPaths;
use crate::session::NotationSession;

/// Session state managed by the shell, built once at startup
pub struct SessionState {
    pub session: Mutex<NotationSession>,
    pub paths: AppPaths,
}

impl SessionState {
    pub fn new(session: NotationSession, paths: AppPaths) -> Self {
        Self { session: Mutex::new(session), paths }
    }

    /// Lock the session for the duration of one command
    pub fn lock(&self) -> Result<MutexGuard<'_, NotationSession>, String> {
        self.session.lock().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::bareme::{Bareme, BaremeRegistry, Criterion};
    use crate::notation::NotationStore;
    use crate::project::Clip;
    use tempfile::TempDir;

    /// State over a temp folder with a two-criterion rubric and two clips (`c0`, `c1`)
    pub fn state(tmp: &TempDir) -> SessionState {
        let mut registry = BaremeRegistry::new();
        registry.set_current(Bareme::new(
            "duo",
            "Duo",
            vec![
                Criterion::numeric("rythme", "Rythme", 10.0).with_category("Montage"),
                Criterion::numeric("son", "Son", 10.0).with_category("Audio"),
            ],
        ));
        let mut session = NotationSession::with_store(NotationStore::with_registry(registry));
        let clips = ["Abe-One.mp4", "Bea-Two.mp4"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut clip = Clip::from_file(name, &format!("/clips/{}", name), i as i64);
                clip.id = format!("c{}", i);
                clip
            })
            .collect();
        session.new_project("Convention", "Sam", clips);
        SessionState::new(session, AppPaths::at(tmp.path()))
    }
}
