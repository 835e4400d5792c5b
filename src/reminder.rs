//! Reminder scheduler
//!
//! A background task polls the journal's reminder settings and, once the
//! configured local time has passed, sends one nudge per day (or per week).

use chrono::{DateTime, NaiveTime, TimeZone};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::defaults::{APP_NAME, NOTIFICATION_ICON, REMINDER_PHRASES, TEST_NOTIFICATION_BODY, TEST_NOTIFICATION_TITLE};
use crate::journal::{Journal, JournalError, SharedJournal};
use crate::logging;
use crate::models::{ReminderFrequency, ReminderSettings};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Invalid reminder time '{0}', expected HH:mm")]
    InvalidTime(String),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl Notification {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon: NOTIFICATION_ICON.to_string(),
        }
    }
}

/// Delivery channel for reminders (desktop toasts, push, a log line...)
pub trait Notifier: Send + Sync {
    fn permission_granted(&self) -> bool;
    fn notify(&self, notification: &Notification);
}

/// Notifier that writes reminders to the log. Always permitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn permission_granted(&self) -> bool {
        true
    }

    fn notify(&self, notification: &Notification) {
        logging::log_reminder(None, &format!("{}: {}", notification.title, notification.body));
    }
}

pub fn parse_time(time: &str) -> Result<NaiveTime, ReminderError> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|_| ReminderError::InvalidTime(time.to_string()))
}

/// Whether a reminder is due at `now`, interpreted in `now`'s time zone
pub fn should_fire<Tz: TimeZone>(settings: &ReminderSettings, now: &DateTime<Tz>) -> Result<bool, ReminderError> {
    if !settings.enabled {
        return Ok(false);
    }

    let fire_at = parse_time(&settings.time)?;
    if now.time() < fire_at {
        return Ok(false);
    }

    let last = settings.last_notified.unwrap_or(0);
    let due = match settings.frequency {
        ReminderFrequency::Daily => {
            let last_date = now
                .timezone()
                .timestamp_millis_opt(last)
                .single()
                .map(|dt| dt.date_naive());
            last_date != Some(now.date_naive())
        }
        ReminderFrequency::Weekly => now.timestamp_millis() - last >= WEEK_MS,
    };
    Ok(due)
}

pub fn pick_phrase<R: Rng>(rng: &mut R) -> &'static str {
    REMINDER_PHRASES[rng.random_range(0..REMINDER_PHRASES.len())]
}

/// One scheduler step. Returns whether a reminder went out.
pub fn tick<N, Tz>(journal: &mut Journal, notifier: &N, now: &DateTime<Tz>) -> Result<bool, ReminderError>
where
    N: Notifier + ?Sized,
    Tz: TimeZone,
{
    if !should_fire(&journal.state().reminder_settings, now)? {
        return Ok(false);
    }

    if !notifier.permission_granted() {
        return Ok(false);
    }

    let body = pick_phrase(&mut rand::rng());
    notifier.notify(&Notification::new(APP_NAME, body));

    let at = now.timestamp_millis();
    journal.mark_notified(at)?;
    logging::log_reminder(None, &format!("Reminder sent, lastNotified={}", at));
    Ok(true)
}

/// Fire the fixed test notification regardless of schedule
pub fn send_test_notification<N: Notifier + ?Sized>(notifier: &N) -> Result<(), ReminderError> {
    if !notifier.permission_granted() {
        return Err(ReminderError::PermissionDenied);
    }
    notifier.notify(&Notification::new(TEST_NOTIFICATION_TITLE, TEST_NOTIFICATION_BODY));
    Ok(())
}

// ============ Background Task ============

/// Owns the polling task. Dropping it aborts the task; `shutdown` stops it cleanly.
pub struct ReminderHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReminderHandle {
    pub fn spawn<N>(journal: SharedJournal, notifier: Arc<N>, poll: Duration) -> Self
    where
        N: Notifier + 'static,
    {
        let (tx, mut rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            logging::log_reminder(None, &format!("Scheduler started, polling every {}s", poll.as_secs()));

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut journal = journal.lock().await;
                        if let Err(e) = tick(&mut journal, notifier.as_ref(), &chrono::Local::now()) {
                            logging::log_error(None, &format!("Reminder tick skipped: {}", e));
                        }
                    }
                    _ = &mut rx => break,
                }
            }

            logging::log_reminder(None, "Scheduler stopped");
        });

        Self {
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the task and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ReminderHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
