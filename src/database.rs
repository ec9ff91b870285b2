//! # Database
//!
//! SQLite persistence for reminders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use crate::features::reminders::{NotificationChannel, Reminder, ReminderStatus, ReminderStore};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use sqlite::{ConnectionWithFullMutex, State, Statement};
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS reminders (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        scheduled_at TEXT NOT NULL,
        notification_channel TEXT NOT NULL DEFAULT 'email',
        contact_target TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        sent_at TEXT,
        last_error TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_reminders_status_time
        ON reminders (status, scheduled_at);
    CREATE INDEX IF NOT EXISTS idx_reminders_user
        ON reminders (user_id);
";

const REMINDER_COLUMNS: &str = "id, user_id, title, note, scheduled_at, notification_channel, \
     contact_target, status, sent_at, last_error, created_at";

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that string
/// comparison in SQL matches chronological order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp: {raw}"))?
        .with_timezone(&Utc))
}

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<ConnectionWithFullMutex>>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists.
    /// `:memory:` opens a private in-memory database.
    pub async fn new(path: &str) -> Result<Self> {
        let connection = sqlite::Connection::open_with_full_mutex(path)
            .with_context(|| format!("Failed to open database at {path}"))?;
        connection
            .execute(SCHEMA)
            .context("Failed to initialise reminder schema")?;

        info!("Database ready at {path}");

        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Statements and their change counts must not interleave across callers
    fn conn(&self) -> Result<MutexGuard<'_, ConnectionWithFullMutex>> {
        self.connection
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))
    }

    /// Read the current row into a reminder. Rows with missing or malformed
    /// fields are rejected rather than passed on half-filled.
    fn read_reminder(statement: &Statement) -> Result<Reminder> {
        let id = statement.read::<String, _>("id")?;
        let status_raw = statement.read::<String, _>("status")?;
        let channel_raw = statement.read::<String, _>("notification_channel")?;
        let scheduled_raw = statement.read::<String, _>("scheduled_at")?;
        let created_raw = statement.read::<String, _>("created_at")?;
        let sent_raw = statement.read::<Option<String>, _>("sent_at")?;

        let reminder = Reminder {
            user_id: statement.read::<String, _>("user_id")?,
            title: statement.read::<String, _>("title")?,
            note: statement.read::<String, _>("note")?,
            scheduled_at: parse_timestamp(&scheduled_raw)?,
            notification_channel: channel_raw.parse::<NotificationChannel>()?,
            contact_target: statement.read::<String, _>("contact_target")?,
            status: status_raw.parse::<ReminderStatus>()?,
            sent_at: sent_raw.as_deref().map(parse_timestamp).transpose()?,
            last_error: statement.read::<Option<String>, _>("last_error")?,
            created_at: parse_timestamp(&created_raw)?,
            id,
        };

        Ok(reminder)
    }

    /// Collect every well-formed row, skipping the rest with a warning
    fn collect_reminders(statement: &mut Statement) -> Result<Vec<Reminder>> {
        let mut reminders = Vec::new();
        while let State::Row = statement.next()? {
            match Self::read_reminder(statement) {
                Ok(reminder) => reminders.push(reminder),
                Err(e) => {
                    let id = statement
                        .read::<String, _>("id")
                        .unwrap_or_else(|_| "<unknown>".to_string());
                    warn!("Skipping malformed reminder row {id}: {e}");
                }
            }
        }
        Ok(reminders)
    }

    /// Apply a terminal status to a pending reminder
    fn update_status(
        &self,
        id: &str,
        status: ReminderStatus,
        sent_at: Option<&str>,
        last_error: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(
            "UPDATE reminders SET status = ?, sent_at = ?, last_error = ?
             WHERE id = ? AND status = 'pending'",
        )?;
        statement.bind((1, status.as_str()))?;
        statement.bind((2, sent_at))?;
        statement.bind((3, last_error))?;
        statement.bind((4, id))?;
        statement.next()?;

        if conn.change_count() == 0 {
            warn!("Status update to {status} for reminder {id} matched no pending row");
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for Database {
    async fn add_reminder(&self, reminder: &Reminder) -> Result<()> {
        let sent_at = reminder.sent_at.map(format_timestamp);
        let conn = self.conn()?;
        let mut statement = conn.prepare(format!(
            "INSERT INTO reminders ({REMINDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))?;
        statement.bind((1, reminder.id.as_str()))?;
        statement.bind((2, reminder.user_id.as_str()))?;
        statement.bind((3, reminder.title.as_str()))?;
        statement.bind((4, reminder.note.as_str()))?;
        statement.bind((5, format_timestamp(reminder.scheduled_at).as_str()))?;
        statement.bind((6, reminder.notification_channel.as_str()))?;
        statement.bind((7, reminder.contact_target.as_str()))?;
        statement.bind((8, reminder.status.as_str()))?;
        statement.bind((9, sent_at.as_deref()))?;
        statement.bind((10, reminder.last_error.as_deref()))?;
        statement.bind((11, format_timestamp(reminder.created_at).as_str()))?;
        statement.next()?;
        Ok(())
    }

    async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        let conn = self.conn()?;
        let mut statement =
            conn.prepare(format!("SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ?"))?;
        statement.bind((1, id))?;

        if let State::Row = statement.next()? {
            Ok(Some(Self::read_reminder(&statement)?))
        } else {
            Ok(None)
        }
    }

    async fn delete_reminder(&self, id: &str, user_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let mut statement = conn.prepare("DELETE FROM reminders WHERE id = ? AND user_id = ?")?;
        statement.bind((1, id))?;
        statement.bind((2, user_id))?;
        statement.next()?;
        Ok(conn.change_count() > 0)
    }

    async fn get_user_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE user_id = ? ORDER BY scheduled_at ASC"
        ))?;
        statement.bind((1, user_id))?;
        Self::collect_reminders(&mut statement)
    }

    async fn get_pending_reminders_after(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE status = 'pending' AND scheduled_at > ?
             ORDER BY scheduled_at ASC"
        ))?;
        statement.bind((1, format_timestamp(now).as_str()))?;
        Self::collect_reminders(&mut statement)
    }

    async fn mark_reminder_sent(&self, id: &str, sent_at: DateTime<Utc>) -> Result<()> {
        let sent_at = format_timestamp(sent_at);
        self.update_status(id, ReminderStatus::Sent, Some(&sent_at), None)
    }

    async fn mark_reminder_failed(&self, id: &str, error: &str) -> Result<()> {
        self.update_status(id, ReminderStatus::Failed, None, Some(error))
    }
}
