// Rubric registry
// Available rubrics (official first) and the single "current" rubric.

use serde_json::Value;

use super::{parse_bareme, Bareme};

/// Outcome of removing a rubric from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// A custom rubric was removed and its file should be deleted
    pub should_delete_file: bool,
    /// The removed rubric was current and the official one took over
    pub current_reset: bool,
}

#[derive(Debug, Clone)]
pub struct BaremeRegistry {
    official: Bareme,
    available: Vec<Bareme>,
    current: Option<Bareme>,
}

impl Default for BaremeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BaremeRegistry {
    /// Registry holding only the official rubric, which is also current
    pub fn new() -> Self {
        Self::with_official(Bareme::official())
    }

    pub fn with_official(official: Bareme) -> Self {
        Self {
            available: vec![official.clone()],
            current: Some(official.clone()),
            official,
        }
    }

    pub fn official(&self) -> &Bareme {
        &self.official
    }

    pub fn available(&self) -> &[Bareme] {
        &self.available
    }

    pub fn current(&self) -> Option<&Bareme> {
        self.current.as_ref()
    }

    pub fn get(&self, bareme_id: &str) -> Option<&Bareme> {
        self.available.iter().find(|b| b.id == bareme_id)
    }

    /// Make a rubric current (it does not need to be registered)
    pub fn set_current(&mut self, bareme: Bareme) {
        self.current = Some(bareme);
    }

    /// Select a registered rubric by id; returns false when unknown
    pub fn select(&mut self, bareme_id: &str) -> bool {
        match self.get(bareme_id).cloned() {
            Some(bareme) => {
                self.current = Some(bareme);
                true
            }
            None => false,
        }
    }

    /// Leave the registry without a current rubric
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Insert or replace a rubric by id, keeping list order
    pub fn upsert(&mut self, bareme: Bareme) {
        if let Some(current) = self.current.as_mut() {
            if current.id == bareme.id {
                *current = bareme.clone();
            }
        }
        match self.available.iter_mut().find(|b| b.id == bareme.id) {
            Some(existing) => *existing = bareme,
            None => self.available.push(bareme),
        }
    }

    /// Remove a custom rubric; official rubrics stay
    pub fn remove(&mut self, bareme_id: &str) -> Removal {
        let should_delete_file = self.available.iter().any(|b| b.id == bareme_id && !b.is_official);
        self.available.retain(|b| b.id != bareme_id || b.is_official);

        let current_reset = should_delete_file
            && self.current.as_ref().map(|c| c.id == bareme_id).unwrap_or(false);
        if current_reset {
            self.current = Some(self.official.clone());
        }

        Removal { should_delete_file, current_reset }
    }

    /// Replace the custom rubrics with a freshly loaded set.
    /// Unparsable items and items shadowing the official id are skipped; later duplicates win.
    /// Returns the number of custom rubrics kept.
    pub fn load_custom(&mut self, items: &[Value]) -> usize {
        let mut custom: Vec<Bareme> = Vec::new();
        for item in items {
            let bareme = match parse_bareme(item) {
                Ok(b) => b,
                Err(e) => {
                    log::warn!("Skipping custom bareme: {}", e);
                    continue;
                }
            };
            if bareme.id == self.official.id {
                continue;
            }
            match custom.iter_mut().find(|b| b.id == bareme.id) {
                Some(existing) => *existing = bareme,
                None => custom.push(bareme),
            }
        }

        let kept = custom.len();
        self.available = std::iter::once(self.official.clone()).chain(custom).collect();

        let current_id = self.current.as_ref().map(|c| c.id.clone());
        self.current = current_id
            .and_then(|id| self.get(&id).cloned())
            .or_else(|| Some(self.official.clone()));
        kept
    }
}
