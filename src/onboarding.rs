//! Onboarding: pick life values from the preset catalog (or add your own),
//! score their importance, then hand the set to the journal.

use crate::defaults::{find_preset, CUSTOM_VALUE_DESCRIPTION, DEFAULT_IMPORTANCE, VALUE_CATALOG};
use crate::journal::JournalError;
use crate::models::LifeValue;

#[derive(Debug, Clone, Default)]
pub struct OnboardingDraft {
    selected: Vec<LifeValue>, // selection order
}

impl OnboardingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset catalog as offered on the first screen
    pub fn catalog() -> Vec<LifeValue> {
        VALUE_CATALOG
            .iter()
            .map(|p| LifeValue {
                id: p.id.to_string(),
                name: p.name.to_string(),
                description: p.description.to_string(),
                importance: DEFAULT_IMPORTANCE,
            })
            .collect()
    }

    pub fn selected(&self) -> &[LifeValue] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|v| v.id == id)
    }

    /// Select or deselect a preset. Returns false for ids not in the catalog.
    pub fn toggle_preset(&mut self, id: &str) -> bool {
        let Some(preset) = find_preset(id) else {
            return false;
        };

        if self.is_selected(id) {
            self.selected.retain(|v| v.id != id);
        } else {
            self.selected.push(LifeValue {
                id: preset.id.to_string(),
                name: preset.name.to_string(),
                description: preset.description.to_string(),
                importance: DEFAULT_IMPORTANCE,
            });
        }
        true
    }

    /// Add a custom value; its id is derived from the creation time
    pub fn add_custom(&mut self, name: &str, description: &str, now_ms: i64) -> Result<String, JournalError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::BlankName);
        }

        let description = match description.trim() {
            "" => CUSTOM_VALUE_DESCRIPTION,
            d => d,
        };

        let id = format!("custom-{}", now_ms);
        self.selected.push(LifeValue {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            importance: DEFAULT_IMPORTANCE,
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) {
        self.selected.retain(|v| v.id != id);
    }

    /// Set importance (clamped to 1-10). Returns false if the value isn't selected.
    pub fn set_score(&mut self, id: &str, importance: u8) -> bool {
        match self.selected.iter_mut().find(|v| v.id == id) {
            Some(value) => {
                value.importance = importance.clamp(1, 10);
                true
            }
            None => false,
        }
    }

    pub fn finish(self) -> Result<Vec<LifeValue>, JournalError> {
        if self.selected.is_empty() {
            return Err(JournalError::NoValues);
        }
        Ok(self.selected)
    }
}
