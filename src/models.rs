//! Core journal data model
//!
//! Everything here is serialized into the single storage blob, so field names
//! follow the camelCase shape the blob has always used.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Label used wherever an impact points at a value that no longer exists
pub const UNKNOWN_VALUE_NAME: &str = "Unknown";

// ============ Values & Impacts ============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeValue {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: u8, // 1-10
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueImpact {
    pub value_id: String,
    pub impact: f64, // typically -5..+5 in 0.5 steps
}

impl ValueImpact {
    pub fn new(value_id: &str, impact: f64) -> Self {
        Self {
            value_id: value_id.to_string(),
            impact,
        }
    }
}

/// Signed sum of all impacts of an action or template
pub fn total_impact(impacts: &[ValueImpact]) -> f64 {
    impacts.iter().map(|i| i.impact).sum()
}

/// Resolve a value id to its display name, tolerating dangling references
pub fn value_name<'a>(values: &'a [LifeValue], value_id: &str) -> &'a str {
    values
        .iter()
        .find(|v| v.id == value_id)
        .map(|v| v.name.as_str())
        .unwrap_or(UNKNOWN_VALUE_NAME)
}

// ============ Actions ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    #[default]
    Neutral,
    Bad,
    Terrible,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Neutral => "neutral",
            Mood::Bad => "bad",
            Mood::Terrible => "terrible",
        }
    }

    pub fn from_str(s: &str) -> Option<Mood> {
        match s.to_lowercase().as_str() {
            "great" => Some(Mood::Great),
            "good" => Some(Mood::Good),
            "neutral" => Some(Mood::Neutral),
            "bad" => Some(Mood::Bad),
            "terrible" => Some(Mood::Terrible),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyAction {
    pub id: String,
    pub timestamp: i64, // epoch millis
    pub description: String,
    pub impacts: Vec<ValueImpact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

impl DailyAction {
    /// Impact this action has on one value (first matching entry only)
    pub fn impact_on(&self, value_id: &str) -> Option<f64> {
        self.impacts
            .iter()
            .find(|i| i.value_id == value_id)
            .map(|i| i.impact)
    }

    pub fn total_impact(&self) -> f64 {
        total_impact(&self.impacts)
    }
}

// ============ Templates ============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionTemplate {
    pub id: String,
    pub description: String,
    pub impacts: Vec<ValueImpact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom: Option<bool>,
    pub usage_count: u32,
}

// ============ Missions ============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyMission {
    pub id: String,
    pub title: String,
    pub description: String,
    pub value_id: String,
    pub accepted_at: i64,
    pub completed: bool,
}

// ============ Reminders ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub enabled: bool,
    pub frequency: ReminderFrequency,
    pub time: String, // "HH:mm"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_notified: Option<i64>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: ReminderFrequency::Daily,
            time: "20:00".to_string(),
            last_notified: None,
        }
    }
}

// ============ Chat ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: &str) -> Self {
        Self {
            role: ChatRole::User,
            text: text.to_string(),
        }
    }

    pub fn model(text: &str) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.to_string(),
        }
    }
}

// ============ Root State ============

/// The whole journal. One instance per session, replaced wholesale on every
/// accepted transition.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub values: Vec<LifeValue>,
    /// Newest first. New entries are always prepended.
    pub actions: Vec<DailyAction>,
    pub templates: Vec<ActionTemplate>,
    pub is_initialized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_mission: Option<DailyMission>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub reminder_settings: ReminderSettings,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            actions: Vec::new(),
            templates: defaults::default_templates(),
            is_initialized: false,
            active_mission: None,
            chat_history: Vec::new(),
            reminder_settings: ReminderSettings::default(),
        }
    }
}

impl AppState {
    pub fn find_value(&self, value_id: &str) -> Option<&LifeValue> {
        self.values.iter().find(|v| v.id == value_id)
    }

    pub fn find_template(&self, template_id: &str) -> Option<&ActionTemplate> {
        self.templates.iter().find(|t| t.id == template_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_camel_case() {
        let mut state = AppState::default();
        state.actions.push(DailyAction {
            id: "a1".to_string(),
            timestamp: 1_700_000_000_000,
            description: "Morning run".to_string(),
            impacts: vec![ValueImpact::new("health", 2.5)],
            mood: Some(Mood::Good),
        });

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["isInitialized"], false);
        assert_eq!(json["reminderSettings"]["time"], "20:00");
        assert_eq!(json["reminderSettings"]["frequency"], "daily");
        assert_eq!(json["actions"][0]["impacts"][0]["valueId"], "health");
        assert_eq!(json["actions"][0]["mood"], "good");
        assert!(json.get("activeMission").is_none());
    }

    #[test]
    fn test_action_without_mood_deserializes() {
        let raw = r#"{"id":"x","timestamp":5,"description":"d","impacts":[{"valueId":"work","impact":-1}]}"#;
        let action: DailyAction = serde_json::from_str(raw).unwrap();
        assert_eq!(action.mood, None);
        assert_eq!(action.impact_on("work"), Some(-1.0));
        assert_eq!(action.impact_on("health"), None);
    }

    #[test]
    fn test_value_name_tolerates_dangling_reference() {
        let values = vec![LifeValue {
            id: "health".to_string(),
            name: "Health".to_string(),
            description: String::new(),
            importance: 8,
        }];
        assert_eq!(value_name(&values, "health"), "Health");
        assert_eq!(value_name(&values, "gone"), UNKNOWN_VALUE_NAME);
    }

    #[test]
    fn test_mood_from_str() {
        assert_eq!(Mood::from_str("GREAT"), Some(Mood::Great));
        assert_eq!(Mood::from_str("meh"), None);
        assert_eq!(Mood::default().as_str(), "neutral");
    }
}
