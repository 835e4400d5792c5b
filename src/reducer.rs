//! State transitions
//!
//! Every mutation of the journal is an `AppEvent` folded into the current
//! `AppState` by `reduce`. Events carry their own ids and timestamps so the
//! fold stays pure. `None` means the event was rejected or changed nothing,
//! and nothing should be persisted.

use std::collections::HashSet;

use crate::defaults::MISSION_IMPACT;
use crate::models::{
    ActionTemplate, AppState, ChatMessage, DailyAction, DailyMission, LifeValue, Mood,
    ReminderFrequency, ValueImpact,
};

#[derive(Debug, Clone)]
pub enum AppEvent {
    CompleteOnboarding {
        values: Vec<LifeValue>,
    },
    /// Single addition, optionally crediting the template it came from
    AddAction {
        action: DailyAction,
        template_id: Option<String>,
    },
    /// Batch addition; template counters are left untouched
    AddActions {
        actions: Vec<DailyAction>,
    },
    RemoveActions {
        ids: Vec<String>,
    },
    CreateTemplate {
        template: ActionTemplate,
    },
    UpdateTemplate {
        id: String,
        description: String,
        impacts: Vec<ValueImpact>,
    },
    DeleteTemplate {
        id: String,
    },
    AcceptMission {
        mission: DailyMission,
    },
    CompleteMission {
        mission_id: String,
        action_id: String,
        now: i64,
    },
    AppendChat {
        message: ChatMessage,
    },
    UpdateReminders {
        enabled: bool,
        frequency: ReminderFrequency,
        time: String,
    },
    MarkNotified {
        at: i64,
    },
    Reset,
}

impl AppEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::CompleteOnboarding { .. } => "complete_onboarding",
            AppEvent::AddAction { .. } => "add_action",
            AppEvent::AddActions { .. } => "add_actions",
            AppEvent::RemoveActions { .. } => "remove_actions",
            AppEvent::CreateTemplate { .. } => "create_template",
            AppEvent::UpdateTemplate { .. } => "update_template",
            AppEvent::DeleteTemplate { .. } => "delete_template",
            AppEvent::AcceptMission { .. } => "accept_mission",
            AppEvent::CompleteMission { .. } => "complete_mission",
            AppEvent::AppendChat { .. } => "append_chat",
            AppEvent::UpdateReminders { .. } => "update_reminders",
            AppEvent::MarkNotified { .. } => "mark_notified",
            AppEvent::Reset => "reset",
        }
    }
}

/// Prepend in one step, keeping the log newest first
fn prepend(new_actions: Vec<DailyAction>, existing: &[DailyAction]) -> Vec<DailyAction> {
    let mut actions = new_actions;
    actions.extend_from_slice(existing);
    actions
}

pub fn reduce(state: &AppState, event: AppEvent) -> Option<AppState> {
    match event {
        AppEvent::CompleteOnboarding { values } => {
            if state.is_initialized || values.is_empty() {
                return None;
            }
            let values = values
                .into_iter()
                .map(|mut v| {
                    v.importance = v.importance.clamp(1, 10);
                    v
                })
                .collect();
            Some(AppState {
                values,
                is_initialized: true,
                ..state.clone()
            })
        }

        AppEvent::AddAction { action, template_id } => {
            let mut next = state.clone();
            next.actions = prepend(vec![action], &state.actions);
            if let Some(template_id) = template_id {
                if let Some(t) = next.templates.iter_mut().find(|t| t.id == template_id) {
                    t.usage_count += 1;
                }
            }
            Some(next)
        }

        AppEvent::AddActions { actions } => {
            if actions.is_empty() {
                return None;
            }
            Some(AppState {
                actions: prepend(actions, &state.actions),
                ..state.clone()
            })
        }

        AppEvent::RemoveActions { ids } => {
            let ids: HashSet<String> = ids.into_iter().collect();
            let remaining: Vec<DailyAction> = state
                .actions
                .iter()
                .filter(|a| !ids.contains(&a.id))
                .cloned()
                .collect();
            if remaining.len() == state.actions.len() {
                return None;
            }
            Some(AppState {
                actions: remaining,
                ..state.clone()
            })
        }

        AppEvent::CreateTemplate { template } => {
            let mut next = state.clone();
            next.templates.push(template);
            Some(next)
        }

        AppEvent::UpdateTemplate { id, description, impacts } => {
            let mut next = state.clone();
            let template = next.templates.iter_mut().find(|t| t.id == id)?;
            template.description = description;
            template.impacts = impacts;
            Some(next)
        }

        AppEvent::DeleteTemplate { id } => {
            if state.find_template(&id).is_none() {
                return None;
            }
            let mut next = state.clone();
            next.templates.retain(|t| t.id != id);
            Some(next)
        }

        AppEvent::AcceptMission { mission } => Some(AppState {
            active_mission: Some(mission),
            ..state.clone()
        }),

        AppEvent::CompleteMission { mission_id, action_id, now } => {
            let current = state.active_mission.as_ref()?;
            if current.id != mission_id || current.completed {
                return None;
            }
            let mission = DailyMission {
                completed: true,
                ..current.clone()
            };
            let action = DailyAction {
                id: action_id,
                timestamp: now,
                description: format!("Completed mission: {}", mission.title),
                impacts: vec![ValueImpact::new(&mission.value_id, MISSION_IMPACT)],
                mood: Some(Mood::Great),
            };
            Some(AppState {
                actions: prepend(vec![action], &state.actions),
                active_mission: Some(mission),
                ..state.clone()
            })
        }

        AppEvent::AppendChat { message } => {
            let mut next = state.clone();
            next.chat_history.push(message);
            Some(next)
        }

        AppEvent::UpdateReminders { enabled, frequency, time } => {
            let mut next = state.clone();
            next.reminder_settings.enabled = enabled;
            next.reminder_settings.frequency = frequency;
            next.reminder_settings.time = time;
            Some(next)
        }

        AppEvent::MarkNotified { at } => {
            let mut next = state.clone();
            next.reminder_settings.last_notified = Some(at);
            Some(next)
        }

        AppEvent::Reset => Some(AppState::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str, ts: i64) -> DailyAction {
        DailyAction {
            id: id.to_string(),
            timestamp: ts,
            description: id.to_string(),
            impacts: vec![ValueImpact::new("health", 1.0)],
            mood: None,
        }
    }

    fn health() -> LifeValue {
        LifeValue {
            id: "health".to_string(),
            name: "Health".to_string(),
            description: String::new(),
            importance: 8,
        }
    }

    #[test]
    fn test_onboarding_is_one_way_and_requires_values() {
        let state = AppState::default();
        assert!(reduce(&state, AppEvent::CompleteOnboarding { values: vec![] }).is_none());

        let mut loud = health();
        loud.importance = 42;
        let next = reduce(&state, AppEvent::CompleteOnboarding { values: vec![loud] }).unwrap();
        assert!(next.is_initialized);
        assert_eq!(next.values[0].importance, 10);

        let again = AppEvent::CompleteOnboarding { values: vec![health()] };
        assert!(reduce(&next, again).is_none());

        let reset = reduce(&next, AppEvent::Reset).unwrap();
        assert!(!reset.is_initialized);
        assert!(reset.values.is_empty());
        assert!(reduce(&reset, AppEvent::CompleteOnboarding { values: vec![health()] }).is_some());
    }

    #[test]
    fn test_single_add_prepends_and_counts_template() {
        let state = AppState::default();
        let template_id = state.templates[0].id.clone();

        let s1 = reduce(&state, AppEvent::AddAction { action: action("a", 1), template_id: None }).unwrap();
        let s2 = reduce(
            &s1,
            AppEvent::AddAction { action: action("b", 2), template_id: Some(template_id.clone()) },
        )
        .unwrap();

        assert_eq!(s2.actions[0].id, "b");
        assert_eq!(s2.actions[1].id, "a");
        assert_eq!(s2.find_template(&template_id).unwrap().usage_count, 1);
        assert_eq!(s2.templates.iter().map(|t| t.usage_count).sum::<u32>(), 1);
    }

    #[test]
    fn test_batch_add_leaves_counters_alone() {
        let state = reduce(
            &AppState::default(),
            AppEvent::AddAction { action: action("old", 0), template_id: None },
        )
        .unwrap();
        let next = reduce(
            &state,
            AppEvent::AddActions { actions: vec![action("x", 5), action("y", 5)] },
        )
        .unwrap();

        let ids: Vec<_> = next.actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "old"]);
        assert!(next.templates.iter().all(|t| t.usage_count == 0));
    }

    #[test]
    fn test_remove_is_noop_for_missing_ids() {
        let state = reduce(
            &AppState::default(),
            AppEvent::AddActions { actions: vec![action("a", 1), action("b", 1)] },
        )
        .unwrap();
        assert!(reduce(&state, AppEvent::RemoveActions { ids: vec!["zzz".to_string()] }).is_none());

        let next = reduce(
            &state,
            AppEvent::RemoveActions { ids: vec!["a".to_string(), "zzz".to_string()] },
        )
        .unwrap();
        assert_eq!(next.actions.len(), 1);
        assert_eq!(next.actions[0].id, "b");
    }

    #[test]
    fn test_mission_completion_appends_action_once() {
        let mut state = AppState::default();
        state.values.push(health());
        let mission = DailyMission {
            id: "m1".to_string(),
            title: "Walk 10k steps".to_string(),
            description: "Get moving".to_string(),
            value_id: "health".to_string(),
            accepted_at: 1,
            completed: false,
        };
        let state = reduce(&state, AppEvent::AcceptMission { mission }).unwrap();

        let wrong = AppEvent::CompleteMission {
            mission_id: "other".to_string(),
            action_id: "act".to_string(),
            now: 10,
        };
        assert!(reduce(&state, wrong).is_none());

        let done = reduce(
            &state,
            AppEvent::CompleteMission { mission_id: "m1".to_string(), action_id: "act".to_string(), now: 10 },
        )
        .unwrap();
        assert!(done.active_mission.as_ref().unwrap().completed);
        assert_eq!(done.actions.len(), 1);
        assert_eq!(done.actions[0].description, "Completed mission: Walk 10k steps");
        assert_eq!(done.actions[0].impact_on("health"), Some(4.0));
        assert_eq!(done.actions[0].mood, Some(Mood::Great));

        let again = AppEvent::CompleteMission {
            mission_id: "m1".to_string(),
            action_id: "act2".to_string(),
            now: 11,
        };
        assert!(reduce(&done, again).is_none());
    }

    #[test]
    fn test_reminder_update_keeps_last_notified() {
        let state = reduce(&AppState::default(), AppEvent::MarkNotified { at: 99 }).unwrap();
        let next = reduce(
            &state,
            AppEvent::UpdateReminders {
                enabled: true,
                frequency: ReminderFrequency::Weekly,
                time: "08:30".to_string(),
            },
        )
        .unwrap();
        assert!(next.reminder_settings.enabled);
        assert_eq!(next.reminder_settings.time, "08:30");
        assert_eq!(next.reminder_settings.last_notified, Some(99));
    }

    #[test]
    fn test_template_lifecycle() {
        let state = AppState::default();
        let count = state.templates.len();
        let custom = ActionTemplate {
            id: "t-new".to_string(),
            description: "Stretch".to_string(),
            impacts: vec![ValueImpact::new("health", 1.0)],
            is_custom: Some(true),
            usage_count: 0,
        };

        let s1 = reduce(&state, AppEvent::CreateTemplate { template: custom }).unwrap();
        assert_eq!(s1.templates.len(), count + 1);

        let s2 = reduce(
            &s1,
            AppEvent::UpdateTemplate {
                id: "t-new".to_string(),
                description: "Long stretch".to_string(),
                impacts: vec![ValueImpact::new("health", 2.5)],
            },
        )
        .unwrap();
        assert_eq!(s2.find_template("t-new").unwrap().description, "Long stretch");

        let s3 = reduce(&s2, AppEvent::DeleteTemplate { id: "t-new".to_string() }).unwrap();
        assert!(s3.find_template("t-new").is_none());
        assert!(reduce(&s3, AppEvent::DeleteTemplate { id: "t-new".to_string() }).is_none());
    }
}
