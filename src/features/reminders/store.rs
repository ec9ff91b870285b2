//! Persistence boundary for reminder records.

use crate::features::reminders::model::Reminder;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable storage of reminders and their status transitions.
///
/// Status updates only apply to reminders that are still pending, so a
/// terminal status is never overwritten.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn add_reminder(&self, reminder: &Reminder) -> Result<()>;

    async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>>;

    /// Delete a reminder owned by `user_id`. Returns false if nothing matched.
    async fn delete_reminder(&self, id: &str, user_id: &str) -> Result<bool>;

    /// All reminders for a user, ordered by scheduled time
    async fn get_user_reminders(&self, user_id: &str) -> Result<Vec<Reminder>>;

    /// Pending reminders scheduled strictly after `now`
    async fn get_pending_reminders_after(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>>;

    async fn mark_reminder_sent(&self, id: &str, sent_at: DateTime<Utc>) -> Result<()>;

    async fn mark_reminder_failed(&self, id: &str, error: &str) -> Result<()>;
}
