pub mod aggregation;
pub mod config;
pub mod db;
pub mod defaults;
pub mod gemini;
pub mod history;
pub mod journal;
pub mod logging;
pub mod mentor;
pub mod models;
pub mod onboarding;
pub mod reducer;
pub mod reminder;
pub mod templates;

use std::sync::Arc;
use thiserror::Error;

use config::AppConfig;
use db::{Store, StoreError};
use gemini::GeminiClient;
use journal::{Journal, JournalError, SharedJournal};
use mentor::{Insight, InsightLoader, MentorError, MentorGateway};
use models::{ChatMessage, DailyAction};
use reminder::{LogNotifier, ReminderHandle};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Mentor(#[from] MentorError),

    /// Parsing failed; the text is the retry prompt shown to the user
    #[error("{0}")]
    SmartLog(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============ API Key ============

/// Environment wins over the key saved in settings
pub fn resolve_api_key(config: &AppConfig, store: &Store) -> Result<String, MentorError> {
    if let Some(key) = &config.gemini_api_key {
        return Ok(key.clone());
    }
    store
        .get_gemini_key()
        .ok()
        .flatten()
        .filter(|k| !k.trim().is_empty())
        .ok_or(MentorError::MissingApiKey)
}

pub async fn mentor_gateway(config: &AppConfig, journal: &SharedJournal) -> Result<MentorGateway, MentorError> {
    let journal = journal.lock().await;
    let api_key = resolve_api_key(config, journal.store())?;
    Ok(MentorGateway::new(&api_key, &config.model))
}

/// Check the key against the API before saving it
pub async fn validate_and_save_api_key(
    config: &AppConfig,
    journal: &SharedJournal,
    api_key: &str,
) -> Result<bool, AppError> {
    let api_key = api_key.trim();
    let client = GeminiClient::new(api_key, &config.model);
    let is_valid = client.validate_api_key().await.map_err(MentorError::from)?;

    if is_valid {
        journal.lock().await.store().update_gemini_key(api_key)?;
        logging::log_mentor(None, "API key validated and saved");
    } else {
        logging::log_mentor(None, "API key rejected");
    }
    Ok(is_valid)
}

pub async fn remove_api_key(journal: &SharedJournal) -> Result<(), AppError> {
    journal.lock().await.store().clear_gemini_key()?;
    Ok(())
}

// ============ Mentor Commands ============

/// Regenerate the insight. `None` when nothing is logged yet or a request is
/// already in flight; mentor failures come back as the placeholder.
pub async fn refresh_insight(
    journal: &SharedJournal,
    gateway: &MentorGateway,
    loader: &InsightLoader,
) -> Option<Insight> {
    let _guard = loader.begin()?;

    let (values, actions) = {
        let journal = journal.lock().await;
        (journal.state().values.clone(), journal.state().actions.clone())
    };

    gateway.insight_or_fallback(&values, &actions).await
}

/// Record the user's message, ask the mentor, record the reply (or an apology)
pub async fn send_chat(
    journal: &SharedJournal,
    gateway: &MentorGateway,
    message: &str,
) -> Result<Option<String>, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Ok(None);
    }

    let (history, values) = {
        let mut journal = journal.lock().await;
        let history = journal.state().chat_history.clone();
        let values = journal.state().values.clone();
        journal.append_chat(ChatMessage::user(message))?;
        (history, values)
    };

    let reply = mentor::chat_reply_or_apology(gateway.chat(&history, message, &values).await);

    journal.lock().await.append_chat(ChatMessage::model(&reply))?;
    Ok(Some(reply))
}

/// Parse a free-text description of the day and log the result as one batch
pub async fn smart_log_text(
    journal: &SharedJournal,
    gateway: &MentorGateway,
    text: &str,
) -> Result<Vec<DailyAction>, AppError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let values = journal.lock().await.state().values.clone();
    let parsed = gateway.parse_text(text, &values).await.map_err(|e| {
        logging::log_error(None, &format!("Smart log failed: {}", e));
        AppError::SmartLog(mentor::PARSE_RETRY_MESSAGE)
    })?;

    let committed = journal.lock().await.commit_parsed(&parsed.actions)?;
    Ok(committed)
}

/// Same as `smart_log_text`, from a recorded clip
pub async fn smart_log_audio(
    journal: &SharedJournal,
    gateway: &MentorGateway,
    audio: &[u8],
    mime_type: &str,
) -> Result<Vec<DailyAction>, AppError> {
    let values = journal.lock().await.state().values.clone();
    let parsed = gateway.parse_audio(audio, mime_type, &values).await.map_err(|e| {
        logging::log_error(None, &format!("Voice log failed: {}", e));
        AppError::SmartLog(mentor::AUDIO_RETRY_MESSAGE)
    })?;

    let committed = journal.lock().await.commit_parsed(&parsed.actions)?;
    Ok(committed)
}

// ============ Run ============

/// Open the journal, start reminders, and run until Ctrl-C
pub async fn run() -> Result<(), AppError> {
    let config = AppConfig::load();

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let _ = logging::cleanup_old_logs();

    let store = Store::open(&config.db_path())?;
    let journal = Journal::open(store).into_shared();

    match mentor_gateway(&config, &journal).await {
        Ok(_) => logging::log_mentor(None, &format!("Mentor ready ({})", config.model)),
        Err(e) => logging::log_mentor(None, &format!("Mentor unavailable: {}", e)),
    }

    let reminders = ReminderHandle::spawn(Arc::clone(&journal), Arc::new(LogNotifier), config.reminder_poll);

    tokio::signal::ctrl_c().await?;
    logging::log_journal(None, "Shutting down");
    reminders.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config(key: Option<&str>) -> AppConfig {
        AppConfig {
            data_dir: PathBuf::from("/tmp/compass-test"),
            log_dir: PathBuf::from("/tmp/compass-test/logs"),
            gemini_api_key: key.map(str::to_string),
            model: config::DEFAULT_MODEL.to_string(),
            reminder_poll: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_api_key_resolution_order() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(resolve_api_key(&config(None), &store), Err(MentorError::MissingApiKey)));

        store.update_gemini_key("stored").unwrap();
        assert_eq!(resolve_api_key(&config(None), &store).unwrap(), "stored");
        assert_eq!(resolve_api_key(&config(Some("env")), &store).unwrap(), "env");
    }

    #[tokio::test]
    async fn test_blank_inputs_skip_the_mentor() {
        let journal = Journal::open(Store::open_in_memory().unwrap()).into_shared();
        let gateway = MentorGateway::from_client(
            GeminiClient::new("key", config::DEFAULT_MODEL).with_base_url("http://127.0.0.1:9"),
        );

        assert_eq!(send_chat(&journal, &gateway, "   ").await.unwrap(), None);
        assert!(smart_log_text(&journal, &gateway, "").await.unwrap().is_empty());
        assert!(journal.lock().await.state().chat_history.is_empty());
    }

    #[tokio::test]
    async fn test_chat_failure_records_apology() {
        let journal = Journal::open(Store::open_in_memory().unwrap()).into_shared();
        let gateway = MentorGateway::from_client(
            GeminiClient::new("key", config::DEFAULT_MODEL).with_base_url("http://127.0.0.1:9"),
        );

        let reply = send_chat(&journal, &gateway, " hello ").await.unwrap();
        assert_eq!(reply.as_deref(), Some(mentor::CHAT_APOLOGY));

        let journal = journal.lock().await;
        let history = &journal.state().chat_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatMessage::user("hello"));
        assert_eq!(history[1], ChatMessage::model(mentor::CHAT_APOLOGY));
    }

    #[tokio::test]
    async fn test_parse_failures_become_retry_prompts() {
        let journal = Journal::open(Store::open_in_memory().unwrap()).into_shared();
        let gateway = MentorGateway::from_client(
            GeminiClient::new("key", config::DEFAULT_MODEL).with_base_url("http://127.0.0.1:9"),
        );

        let err = smart_log_text(&journal, &gateway, "ran 5k and called mom").await.unwrap_err();
        assert!(matches!(err, AppError::SmartLog(_)));
        assert_eq!(err.to_string(), mentor::PARSE_RETRY_MESSAGE);

        let err = smart_log_audio(&journal, &gateway, b"clip", "audio/webm").await.unwrap_err();
        assert_eq!(err.to_string(), mentor::AUDIO_RETRY_MESSAGE);

        assert!(journal.lock().await.state().actions.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_insight_without_actions_or_while_loading() {
        let journal = Journal::open(Store::open_in_memory().unwrap()).into_shared();
        let gateway = MentorGateway::from_client(
            GeminiClient::new("key", config::DEFAULT_MODEL).with_base_url("http://127.0.0.1:9"),
        );
        let loader = InsightLoader::default();

        assert!(refresh_insight(&journal, &gateway, &loader).await.is_none());
        assert!(!loader.is_loading());

        let _held = loader.begin().unwrap();
        assert!(refresh_insight(&journal, &gateway, &loader).await.is_none());
    }
}
