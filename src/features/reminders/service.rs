//! Create/delete/list operations that keep the store and the scheduler in step.

use crate::features::reminders::model::{NewReminder, Reminder, ReminderStatus};
use crate::features::reminders::scheduler::ReminderScheduler;
use crate::features::reminders::store::ReminderStore;
use anyhow::{bail, Result};
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
    scheduler: ReminderScheduler,
}

impl ReminderService {
    pub fn new(scheduler: ReminderScheduler) -> Self {
        ReminderService {
            store: scheduler.store().clone(),
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    /// Validate, persist as pending, then register the timer
    pub async fn create_reminder(&self, new: NewReminder) -> Result<Reminder> {
        let now = Utc::now();
        if new.title.trim().is_empty() {
            bail!("Reminder title is required");
        }
        if new.contact_target.trim().is_empty() {
            bail!("Reminder contact target is required");
        }
        if new.scheduled_at <= now {
            bail!("Reminder time must be in the future");
        }

        let reminder = Reminder {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            title: new.title.trim().to_string(),
            note: new.note,
            scheduled_at: new.scheduled_at,
            notification_channel: new.notification_channel,
            contact_target: new.contact_target.trim().to_string(),
            status: ReminderStatus::Pending,
            sent_at: None,
            last_error: None,
            created_at: now,
        };

        self.store.add_reminder(&reminder).await?;

        if !self.scheduler.schedule_reminder(&reminder) {
            // Record stays pending; it is picked up again on the next restart if still due
            warn!("Reminder {} saved but not scheduled", reminder.id);
        }

        info!(
            "Created reminder {} for user {} at {}",
            reminder.id, reminder.user_id, reminder.scheduled_at
        );
        Ok(reminder)
    }

    /// Delete the user's reminder and cancel its timer. Returns false if the
    /// reminder does not exist or belongs to someone else.
    pub async fn delete_reminder(&self, user_id: &str, id: &str) -> Result<bool> {
        let deleted = self.store.delete_reminder(id, user_id).await?;
        if deleted {
            self.scheduler.cancel_scheduled_reminder(id);
            info!("Deleted reminder {id} for user {user_id}");
        }
        Ok(deleted)
    }

    pub async fn list_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        self.store.get_user_reminders(user_id).await
    }
}
