//! The journal: single owner of the application state.
//!
//! Operations build an `AppEvent`, fold it through `reduce`, persist the
//! result and only then swap it in. Transient UI state (undo window,
//! selection, search, sort, mood, view) lives here too and is never persisted.

use chrono::{Local, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::aggregation::{self, RadarPoint, TimeFrame, TrendBucket, TrendMode, ValueDetail};
use crate::db::{Store, StoreError};
use crate::defaults::UNDO_WINDOW_MS;
use crate::history::{self, HistorySort, SortField};
use crate::logging;
use crate::mentor::{IdeaOfDay, SmartLogAction};
use crate::models::{
    ActionTemplate, AppState, ChatMessage, DailyAction, DailyMission, LifeValue, Mood, ReminderFrequency,
    ValueImpact,
};
use crate::reducer::{reduce, AppEvent};
use crate::templates;

pub type SharedJournal = Arc<tokio::sync::Mutex<Journal>>;

/// Epoch-millis source; swapped out in tests
pub type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Select at least one value")]
    NoValues,

    #[error("Values are already set; reset the journal to choose again")]
    AlreadyInitialized,

    #[error("Name must not be blank")]
    BlankName,

    #[error("Description must not be blank")]
    BlankDescription,

    #[error("At least one value impact is required")]
    NoImpacts,

    #[error("Template not found: {0}")]
    UnknownTemplate(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    History,
    Chat,
}

#[derive(Debug, Clone)]
struct UndoBatch {
    ids: Vec<String>,
    created_at: i64,
}

pub struct Journal {
    state: AppState,
    store: Store,
    clock: Clock,
    pending_undo: Option<UndoBatch>,
    selection: HashSet<String>,
    search: String,
    sort: HistorySort,
    mood: Mood,
    view: View,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn validate_entry(description: &str, impacts: &[ValueImpact]) -> Result<(), JournalError> {
    if description.trim().is_empty() {
        return Err(JournalError::BlankDescription);
    }
    if impacts.is_empty() {
        return Err(JournalError::NoImpacts);
    }
    Ok(())
}

impl Journal {
    /// Load the saved state (or a fresh one) from `store`
    pub fn open(store: Store) -> Self {
        let state = store.load_state();
        logging::log_journal(None, &format!(
            "Journal opened: {} values, {} actions, initialized={}",
            state.values.len(),
            state.actions.len(),
            state.is_initialized
        ));

        Self {
            state,
            store,
            clock: Box::new(|| Utc::now().timestamp_millis()),
            pending_undo: None,
            selection: HashSet::new(),
            search: String::new(),
            sort: HistorySort::default(),
            mood: Mood::default(),
            view: View::default(),
        }
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn into_shared(self) -> SharedJournal {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Fold one event in. Persists before committing; `false` means nothing changed.
    fn apply(&mut self, event: AppEvent) -> Result<bool, JournalError> {
        let name = event.name();
        match reduce(&self.state, event) {
            Some(next) => {
                self.store.save_state(&next)?;
                self.state = next;
                logging::log_journal(None, &format!("{} applied", name));
                Ok(true)
            }
            None => {
                logging::log_journal(None, &format!("{} ignored", name));
                Ok(false)
            }
        }
    }

    fn new_action(&self, description: &str, impacts: Vec<ValueImpact>, timestamp: i64, mood: Mood) -> DailyAction {
        DailyAction {
            id: new_id(),
            timestamp,
            description: description.to_string(),
            impacts,
            mood: Some(mood),
        }
    }

    // ============ Onboarding ============

    pub fn complete_onboarding(&mut self, values: Vec<LifeValue>) -> Result<(), JournalError> {
        if self.state.is_initialized {
            return Err(JournalError::AlreadyInitialized);
        }
        if values.is_empty() {
            return Err(JournalError::NoValues);
        }
        self.apply(AppEvent::CompleteOnboarding { values })?;
        Ok(())
    }

    // ============ Logging Actions ============

    /// Single tap on a template. Credits the template and closes any undo window.
    pub fn log_template(&mut self, template_id: &str) -> Result<DailyAction, JournalError> {
        let template = self
            .state
            .find_template(template_id)
            .ok_or_else(|| JournalError::UnknownTemplate(template_id.to_string()))?;
        let action = self.new_action(&template.description, template.impacts.clone(), self.now(), self.mood);

        self.pending_undo = None;
        self.apply(AppEvent::AddAction {
            action: action.clone(),
            template_id: Some(template_id.to_string()),
        })?;
        Ok(action)
    }

    /// Free-form entry; `mood` falls back to the currently selected one
    pub fn log_manual(
        &mut self,
        description: &str,
        impacts: Vec<ValueImpact>,
        mood: Option<Mood>,
    ) -> Result<DailyAction, JournalError> {
        validate_entry(description, &impacts)?;
        let action = self.new_action(description.trim(), impacts, self.now(), mood.unwrap_or(self.mood));

        self.pending_undo = None;
        self.apply(AppEvent::AddAction {
            action: action.clone(),
            template_id: None,
        })?;
        Ok(action)
    }

    /// One action per distinct known template id, all sharing one timestamp.
    /// Opens an undo window.
    pub fn log_batch(&mut self, template_ids: &[String]) -> Result<Vec<DailyAction>, JournalError> {
        let mut seen = HashSet::new();
        let drafts: Vec<(String, Vec<ValueImpact>)> = template_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.state.find_template(id))
            .map(|t| (t.description.clone(), t.impacts.clone()))
            .collect();
        self.commit_batch(drafts)
    }

    /// Commit mentor-parsed actions through the batch path
    pub fn commit_parsed(&mut self, parsed: &[SmartLogAction]) -> Result<Vec<DailyAction>, JournalError> {
        let drafts = parsed
            .iter()
            .map(|a| (a.description.clone(), a.impacts.clone()))
            .collect();
        self.commit_batch(drafts)
    }

    fn commit_batch(&mut self, drafts: Vec<(String, Vec<ValueImpact>)>) -> Result<Vec<DailyAction>, JournalError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.now();
        let actions: Vec<DailyAction> = drafts
            .into_iter()
            .map(|(description, impacts)| self.new_action(&description, impacts, now, self.mood))
            .collect();

        self.apply(AppEvent::AddActions { actions: actions.clone() })?;
        self.pending_undo = Some(UndoBatch {
            ids: actions.iter().map(|a| a.id.clone()).collect(),
            created_at: now,
        });
        logging::log_journal(actions.first().map(|a| a.id.as_str()), &format!(
            "Batch of {} logged, undo open for {}s",
            actions.len(),
            UNDO_WINDOW_MS / 1000
        ));
        Ok(actions)
    }

    // ============ Undo ============

    fn expire_undo(&mut self) {
        let now = self.now();
        if let Some(batch) = &self.pending_undo {
            if now - batch.created_at >= UNDO_WINDOW_MS {
                self.pending_undo = None;
            }
        }
    }

    /// Ids of the batch that can still be undone
    pub fn pending_undo(&mut self) -> Option<&[String]> {
        self.expire_undo();
        self.pending_undo.as_ref().map(|b| b.ids.as_slice())
    }

    /// Remove the pending batch. Returns how many actions were removed.
    pub fn undo_batch(&mut self) -> Result<usize, JournalError> {
        self.expire_undo();
        let Some(batch) = self.pending_undo.take() else {
            return Ok(0);
        };

        let before = self.state.actions.len();
        if let Err(e) = self.apply(AppEvent::RemoveActions { ids: batch.ids.clone() }) {
            self.pending_undo = Some(batch);
            return Err(e);
        }
        let removed = before - self.state.actions.len();
        logging::log_journal(None, &format!("Undo removed {} actions", removed));
        Ok(removed)
    }

    // ============ Deletion & Selection ============

    pub fn delete_action(&mut self, id: &str) -> Result<bool, JournalError> {
        self.selection.remove(id);
        self.apply(AppEvent::RemoveActions { ids: vec![id.to_string()] })
    }

    pub fn selection(&self) -> &HashSet<String> {
        &self.selection
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    /// Select everything visible in history, or clear if it already is
    pub fn toggle_select_all(&mut self) {
        let visible: HashSet<String> = self.history().iter().map(|a| a.id.clone()).collect();
        if !visible.is_empty() && visible.iter().all(|id| self.selection.contains(id)) {
            self.selection.clear();
        } else {
            self.selection = visible;
        }
    }

    /// Bulk delete; does nothing unless `confirmed`
    pub fn delete_selected(&mut self, confirmed: bool) -> Result<usize, JournalError> {
        if !confirmed || self.selection.is_empty() {
            return Ok(0);
        }

        let before = self.state.actions.len();
        let ids: Vec<String> = self.selection.iter().cloned().collect();
        self.apply(AppEvent::RemoveActions { ids })?;
        self.selection.clear();
        Ok(before - self.state.actions.len())
    }

    /// Log the selected actions again as of now, with a neutral mood
    pub fn repeat_selected(&mut self) -> Result<Vec<DailyAction>, JournalError> {
        let now = self.now();
        let copies: Vec<DailyAction> = self
            .state
            .actions
            .iter()
            .filter(|a| self.selection.contains(&a.id))
            .map(|a| self.new_action(&a.description, a.impacts.clone(), now, Mood::Neutral))
            .collect();

        if copies.is_empty() {
            return Ok(copies);
        }

        self.apply(AppEvent::AddActions { actions: copies.clone() })?;
        self.selection.clear();
        self.view = View::Dashboard;
        Ok(copies)
    }

    // ============ History View ============

    pub fn history(&self) -> Vec<&DailyAction> {
        history::filter_and_sort(&self.state.actions, &self.state.values, &self.search, self.sort)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    pub fn sort(&self) -> HistorySort {
        self.sort
    }

    pub fn select_sort(&mut self, field: SortField) {
        self.sort.select(field);
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn set_mood(&mut self, mood: Mood) {
        self.mood = mood;
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    // ============ Missions ============

    pub fn accept_mission(&mut self, idea: &IdeaOfDay) -> Result<DailyMission, JournalError> {
        let mission = DailyMission {
            id: new_id(),
            title: idea.title.clone(),
            description: idea.description.clone(),
            value_id: idea.value_id.clone(),
            accepted_at: self.now(),
            completed: false,
        };
        self.apply(AppEvent::AcceptMission { mission: mission.clone() })?;
        Ok(mission)
    }

    /// Complete the active mission. `false` when there is none or it is already done.
    pub fn complete_mission(&mut self) -> Result<bool, JournalError> {
        let Some(mission_id) = self.state.active_mission.as_ref().map(|m| m.id.clone()) else {
            return Ok(false);
        };
        self.apply(AppEvent::CompleteMission {
            mission_id,
            action_id: new_id(),
            now: self.now(),
        })
    }

    // ============ Chat & Reminders ============

    pub fn append_chat(&mut self, message: ChatMessage) -> Result<(), JournalError> {
        self.apply(AppEvent::AppendChat { message })?;
        Ok(())
    }

    pub fn update_reminders(
        &mut self,
        enabled: bool,
        frequency: ReminderFrequency,
        time: &str,
    ) -> Result<(), JournalError> {
        self.apply(AppEvent::UpdateReminders {
            enabled,
            frequency,
            time: time.trim().to_string(),
        })?;
        Ok(())
    }

    pub fn mark_notified(&mut self, at: i64) -> Result<(), JournalError> {
        self.apply(AppEvent::MarkNotified { at })?;
        Ok(())
    }

    // ============ Templates ============

    pub fn create_template(
        &mut self,
        description: &str,
        impacts: Vec<ValueImpact>,
    ) -> Result<ActionTemplate, JournalError> {
        validate_entry(description, &impacts)?;
        let template = ActionTemplate {
            id: format!("custom-{}", new_id()),
            description: description.trim().to_string(),
            impacts,
            is_custom: Some(true),
            usage_count: 0,
        };
        self.apply(AppEvent::CreateTemplate { template: template.clone() })?;
        Ok(template)
    }

    pub fn update_template(
        &mut self,
        id: &str,
        description: &str,
        impacts: Vec<ValueImpact>,
    ) -> Result<(), JournalError> {
        validate_entry(description, &impacts)?;
        let changed = self.apply(AppEvent::UpdateTemplate {
            id: id.to_string(),
            description: description.trim().to_string(),
            impacts,
        })?;
        if !changed {
            return Err(JournalError::UnknownTemplate(id.to_string()));
        }
        Ok(())
    }

    pub fn delete_template(&mut self, id: &str) -> Result<bool, JournalError> {
        self.apply(AppEvent::DeleteTemplate { id: id.to_string() })
    }

    pub fn quick_templates(&self, value_filter: Option<&str>, query: &str) -> Vec<&ActionTemplate> {
        templates::quick_log_templates(&self.state.templates, value_filter, query)
    }

    pub fn search_templates(&self, query: &str) -> Vec<&ActionTemplate> {
        templates::search_templates(&self.state.templates, &self.state.values, query)
    }

    // ============ Aggregation ============

    pub fn radar(&self) -> Vec<RadarPoint> {
        aggregation::radar(&self.state.values, &self.state.actions)
    }

    /// Day buckets in local time, ending today
    pub fn trend(&self, frame: TimeFrame, mode: TrendMode) -> Vec<TrendBucket> {
        let now = Local
            .timestamp_millis_opt(self.now())
            .single()
            .unwrap_or_else(Local::now);
        aggregation::time_series(&self.state.values, &self.state.actions, frame, mode, &now)
    }

    pub fn value_detail(&self, value_id: &str) -> Option<ValueDetail> {
        self.state
            .find_value(value_id)
            .map(|v| aggregation::value_detail(v, &self.state.actions))
    }

    pub fn recent_actions(&self, frame: TimeFrame) -> Vec<DailyAction> {
        aggregation::actions_in_time_frame(&self.state.actions, frame, self.now())
    }

    // ============ Reset ============

    /// Wipe everything, including the stored blob. Does nothing unless `confirmed`.
    pub fn reset(&mut self, confirmed: bool) -> Result<bool, JournalError> {
        if !confirmed {
            return Ok(false);
        }
        self.store.clear_state()?;
        if let Some(next) = reduce(&self.state, AppEvent::Reset) {
            self.state = next;
        }
        self.pending_undo = None;
        self.selection.clear();
        self.search.clear();
        self.sort = HistorySort::default();
        self.mood = Mood::default();
        self.view = View::default();
        logging::log_journal(None, "Journal reset");
        Ok(true)
    }
}
