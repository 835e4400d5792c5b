//! Mentor gateway
//!
//! This module handles everything Compass asks of the language model:
//! - Insight generation (alignment score, analysis, patterns, idea of the day)
//! - Turning free text or a voice clip into candidate actions
//! - Mentoring chat
//!
//! Calls return `Result<_, MentorError>`; each call site picks its own fallback.

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::gemini::{Content, GeminiClient, GeminiError, GenerateOptions, Part};
use crate::logging;
use crate::models::{value_name, ChatMessage, DailyAction, LifeValue, ValueImpact};

/// How many of the newest actions go into an insight request
pub const INSIGHT_ACTION_LIMIT: usize = 50;

pub const PARSE_RETRY_MESSAGE: &str = "Couldn't recognize that. Try manual entry.";
pub const AUDIO_RETRY_MESSAGE: &str = "Voice input failed. Please try again.";
pub const CHAT_EMPTY_REPLY: &str = "Sorry, I couldn't put together a reply.";
pub const CHAT_APOLOGY: &str = "Sorry, a connection error occurred.";

#[derive(Debug, Error)]
pub enum MentorError {
    #[error("Gemini API key not set")]
    MissingApiKey,

    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error("Invalid mentor response: {0}")]
    InvalidResponse(String),
}

// ============ Insight ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Positive,
    Negative,
}

fn de_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.max(0.0).round() as u32)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BehavioralPattern {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PatternKind,
    #[serde(deserialize_with = "de_count")]
    pub count: u32,
    pub advice: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdeaOfDay {
    pub title: String,
    pub description: String,
    pub value_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub analysis: String,
    pub suggestions: Vec<String>,
    pub alignment_score: f64, // 0-100
    pub patterns: Vec<BehavioralPattern>,
    #[serde(default)]
    pub idea_of_day: Option<IdeaOfDay>,
}

impl Insight {
    /// Neutral placeholder shown when the mentor cannot be reached
    pub fn placeholder() -> Self {
        Self {
            analysis: "Keep moving mindfully toward your values.".to_string(),
            suggestions: vec![
                "Take one small step today".to_string(),
                "Listen to your feelings".to_string(),
            ],
            alignment_score: 50.0,
            patterns: Vec::new(),
            idea_of_day: None,
        }
    }
}

// ============ Smart Log ============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SmartLogAction {
    pub description: String,
    pub impacts: Vec<ValueImpact>,
    pub confidence: f64, // 0-1
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SmartLogResult {
    pub actions: Vec<SmartLogAction>,
}

// ============ Schemas ============

fn impacts_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "valueId": { "type": "STRING" },
                "impact": { "type": "NUMBER" }
            },
            "required": ["valueId", "impact"]
        }
    })
}

pub fn insight_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "analysis": { "type": "STRING" },
            "suggestions": { "type": "ARRAY", "items": { "type": "STRING" } },
            "alignmentScore": { "type": "NUMBER" },
            "patterns": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "type": { "type": "STRING", "enum": ["positive", "negative"] },
                        "count": { "type": "NUMBER" },
                        "advice": { "type": "STRING" }
                    },
                    "required": ["description", "type", "count", "advice"]
                }
            },
            "ideaOfDay": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "valueId": { "type": "STRING" }
                },
                "required": ["title", "description", "valueId"]
            }
        },
        "required": ["analysis", "suggestions", "alignmentScore", "patterns"]
    })
}

pub fn smart_log_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "actions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "description": { "type": "STRING" },
                        "impacts": impacts_schema(),
                        "confidence": { "type": "NUMBER" }
                    },
                    "required": ["description", "impacts", "confidence"]
                }
            }
        },
        "required": ["actions"]
    })
}

// ============ Prompts ============

fn values_catalog(values: &[LifeValue]) -> String {
    values
        .iter()
        .map(|v| format!("- ID: {}, Name: {}", v.id, v.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Newest actions rendered one per line: `- [mood] description: Value (impact), ...`
pub fn summarize_actions(values: &[LifeValue], actions: &[DailyAction]) -> String {
    actions
        .iter()
        .take(INSIGHT_ACTION_LIMIT)
        .map(|a| {
            let impacts = a
                .impacts
                .iter()
                .map(|imp| format!("{} ({})", value_name(values, &imp.value_id), imp.impact))
                .collect::<Vec<_>>()
                .join(", ");
            let mood = a.mood.map(|m| m.as_str()).unwrap_or("neutral");
            format!("- [{}] {}: {}", mood, a.description, impacts)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_insight_prompt(values: &[LifeValue], actions: &[DailyAction]) -> String {
    let priorities = values
        .iter()
        .map(|v| format!("- {}: Importance {}/10", v.name, v.importance))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an ACT (Acceptance and Commitment Therapy) mentor.
Analyze the user's values vs actions to identify psychological patterns.

User's Life Values (Target Directions):
{}

Action History (Recent Experience):
{}

TASK:
1. Identify "Value-Action Gaps": where is the user falling short of their own priorities?
2. Detect Behavioral Loops (Patterns):
   - "Experiential Avoidance": actions taken to avoid discomfort that lead away from values.
   - "Habitual Wins": positive recurring actions that build momentum.
   - "Value Conflicts": one value consistently overriding another.
3. Respond in JSON with:
   - analysis: a high-level, wise observation of their current psychological flexibility.
   - suggestions: 3 concrete, value-aligned small steps.
   - alignmentScore: 0-100 reflecting how well actions match priorities.
   - patterns: array of {{description, type ('negative' | 'positive'), count, advice}}; advice is a mentor-style coaching tip.
   - ideaOfDay: a tiny, specific mission for their lowest-scoring high-importance value (use its ID as valueId).

STYLE: Wise, compassionate, non-judgmental."#,
        priorities,
        summarize_actions(values, actions)
    )
}

pub fn build_text_parse_prompt(text: &str, values: &[LifeValue]) -> String {
    format!(
        r#"User input: "{}"
Available Life Values:
{}

TASK:
Identify all distinct actions described by the user.
For each action:
- description: concise summary.
- impacts: array of {{valueId, impact}} where impact is -5 to +5.
- confidence: score 0-1.

Return a JSON object with an "actions" array."#,
        text,
        values_catalog(values)
    )
}

pub fn build_audio_parse_prompt(values: &[LifeValue]) -> String {
    format!(
        r#"This audio clip contains a user describing things they did today.
Available Life Values:
{}

Extract actions, identify the values impacted, and the impact weight (-5 to +5).
Return a JSON object with an "actions" array."#,
        values_catalog(values)
    )
}

pub fn build_chat_instruction(values: &[LifeValue]) -> String {
    let names = values.iter().map(|v| v.name.as_str()).collect::<Vec<_>>().join(", ");
    format!(
        "You are a warm, wise, and empathetic ACT (Acceptance and Commitment Therapy) mentor.\n\
         Help the user align their actions with their values: {}.\n\
         Keep responses concise but psychologically profound.",
        names
    )
}

// ============ Response Parsing ============

fn strip_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

/// Parse and sanity-check an insight payload
pub fn parse_insight(response: &str) -> Result<Insight, MentorError> {
    let cleaned = strip_fences(response);
    let mut insight: Insight = serde_json::from_str(cleaned)
        .map_err(|e| MentorError::InvalidResponse(format!("{} in {}", e, preview(cleaned))))?;

    if !insight.alignment_score.is_finite() {
        return Err(MentorError::InvalidResponse("alignmentScore is not a number".to_string()));
    }
    insight.alignment_score = insight.alignment_score.clamp(0.0, 100.0);
    Ok(insight)
}

/// Parse a smart-log payload, clamping impacts to -5..=5 and confidence to 0..=1
pub fn parse_smart_log(response: &str) -> Result<SmartLogResult, MentorError> {
    let cleaned = strip_fences(response);
    let mut result: SmartLogResult = serde_json::from_str(cleaned)
        .map_err(|e| MentorError::InvalidResponse(format!("{} in {}", e, preview(cleaned))))?;

    result.actions.retain(|a| !a.description.trim().is_empty() && !a.impacts.is_empty());
    for action in result.actions.iter_mut() {
        action.confidence = action.confidence.clamp(0.0, 1.0);
        for imp in action.impacts.iter_mut() {
            imp.impact = imp.impact.clamp(-5.0, 5.0);
        }
    }
    Ok(result)
}

/// Chat fallback: blank replies and failures both become fixed texts
pub fn chat_reply_or_apology(result: Result<String, MentorError>) -> String {
    match result {
        Ok(reply) if reply.trim().is_empty() => CHAT_EMPTY_REPLY.to_string(),
        Ok(reply) => reply,
        Err(e) => {
            logging::log_error(None, &format!("Chat failed: {}", e));
            CHAT_APOLOGY.to_string()
        }
    }
}

/// Insight fallback: any failure becomes the neutral placeholder
pub fn insight_or_placeholder(result: Result<Insight, MentorError>) -> Insight {
    match result {
        Ok(insight) => insight,
        Err(e) => {
            logging::log_error(None, &format!("Insight failed, using placeholder: {}", e));
            Insight::placeholder()
        }
    }
}

// ============ Loading Flag ============

/// Tracks an in-flight insight request so a manual refresh can be refused
#[derive(Debug, Clone, Default)]
pub struct InsightLoader {
    loading: Arc<AtomicBool>,
}

/// Clears the loading flag when dropped
pub struct LoadingGuard {
    loading: Arc<AtomicBool>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.loading.store(false, Ordering::SeqCst);
    }
}

impl InsightLoader {
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// `None` while another request holds the flag
    pub fn begin(&self) -> Option<LoadingGuard> {
        self.loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LoadingGuard {
                loading: Arc::clone(&self.loading),
            })
    }
}

// ============ Gateway ============

pub struct MentorGateway {
    client: GeminiClient,
}

impl MentorGateway {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: GeminiClient::new(api_key, model),
        }
    }

    pub fn from_client(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Alignment insight over the values and the newest actions
    pub async fn insight(&self, values: &[LifeValue], actions: &[DailyAction]) -> Result<Insight, MentorError> {
        let prompt = build_insight_prompt(values, actions);
        logging::log_mentor(None, &format!(
            "Requesting insight for {} values, {} actions",
            values.len(),
            actions.len().min(INSIGHT_ACTION_LIMIT)
        ));

        let response = self
            .client
            .generate(
                vec![Content::user(vec![Part::text(&prompt)])],
                GenerateOptions {
                    response_schema: Some(insight_schema()),
                    ..GenerateOptions::default()
                },
            )
            .await?;

        let insight = parse_insight(&response)?;
        logging::log_mentor(None, &format!(
            "Insight received: score {:.0}, {} patterns",
            insight.alignment_score,
            insight.patterns.len()
        ));
        Ok(insight)
    }

    /// Insight with the placeholder fallback; `None` when there is nothing to analyze yet
    pub async fn insight_or_fallback(&self, values: &[LifeValue], actions: &[DailyAction]) -> Option<Insight> {
        if actions.is_empty() {
            return None;
        }
        Some(insight_or_placeholder(self.insight(values, actions).await))
    }

    pub async fn parse_text(&self, text: &str, values: &[LifeValue]) -> Result<SmartLogResult, MentorError> {
        let prompt = build_text_parse_prompt(text, values);
        let response = self
            .client
            .generate(
                vec![Content::user(vec![Part::text(&prompt)])],
                GenerateOptions {
                    response_schema: Some(smart_log_schema()),
                    ..GenerateOptions::default()
                },
            )
            .await?;

        let result = parse_smart_log(&response)?;
        logging::log_mentor(None, &format!("Parsed {} actions from text", result.actions.len()));
        Ok(result)
    }

    /// Parse a recorded clip; `audio` is the raw encoded bytes (e.g. webm/opus)
    pub async fn parse_audio(
        &self,
        audio: &[u8],
        mime_type: &str,
        values: &[LifeValue],
    ) -> Result<SmartLogResult, MentorError> {
        let prompt = build_audio_parse_prompt(values);
        let encoded = base64::engine::general_purpose::STANDARD.encode(audio);

        let response = self
            .client
            .generate(
                vec![Content::user(vec![Part::text(&prompt), Part::inline(mime_type, &encoded)])],
                GenerateOptions {
                    response_schema: Some(smart_log_schema()),
                    ..GenerateOptions::default()
                },
            )
            .await?;

        let result = parse_smart_log(&response)?;
        logging::log_mentor(None, &format!(
            "Parsed {} actions from {} bytes of audio",
            result.actions.len(),
            audio.len()
        ));
        Ok(result)
    }

    /// One chat turn given the prior history (not including `message`)
    pub async fn chat(
        &self,
        history: &[ChatMessage],
        message: &str,
        values: &[LifeValue],
    ) -> Result<String, MentorError> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|m| Content::with_role(m.role.as_str(), &m.text))
            .collect();
        contents.push(Content::with_role("user", message));

        let reply = self
            .client
            .generate(
                contents,
                GenerateOptions {
                    system_instruction: Some(build_chat_instruction(values)),
                    ..GenerateOptions::default()
                },
            )
            .await?;
        Ok(reply)
    }
}
