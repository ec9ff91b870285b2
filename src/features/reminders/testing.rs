//! In-memory store and scripted transport for scheduler tests.

use crate::core::DeliveryError;
use crate::features::notifications::{DeliveryResult, NotificationTransport};
use crate::features::reminders::model::{NotificationChannel, Reminder, ReminderStatus};
use crate::features::reminders::store::ReminderStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Pending email reminder for `user-1` to `a@b.com`
pub fn reminder_at(id: &str, scheduled_at: DateTime<Utc>) -> Reminder {
    Reminder {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        title: format!("Eye screening {id}"),
        note: "Fasting not required".to_string(),
        scheduled_at,
        notification_channel: NotificationChannel::Email,
        contact_target: "a@b.com".to_string(),
        status: ReminderStatus::Pending,
        sent_at: None,
        last_error: None,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    reminders: DashMap<String, Reminder>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make status updates fail with an error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful status updates
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut Reminder)) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("simulated write failure");
        }
        if let Some(mut reminder) = self.reminders.get_mut(id) {
            if reminder.is_pending() {
                apply(&mut *reminder);
                self.writes.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn add_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.reminders.insert(reminder.id.clone(), reminder.clone());
        Ok(())
    }

    async fn get_reminder(&self, id: &str) -> Result<Option<Reminder>> {
        Ok(self.reminders.get(id).map(|r| r.clone()))
    }

    async fn delete_reminder(&self, id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .reminders
            .remove_if(id, |_, r| r.user_id == user_id)
            .is_some())
    }

    async fn get_user_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let mut reminders: Vec<_> = self
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.clone())
            .collect();
        reminders.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(reminders)
    }

    async fn get_pending_reminders_after(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        Ok(self
            .reminders
            .iter()
            .filter(|r| r.is_pending() && r.is_due_after(now))
            .map(|r| r.clone())
            .collect())
    }

    async fn mark_reminder_sent(&self, id: &str, sent_at: DateTime<Utc>) -> Result<()> {
        self.update(id, |r| {
            r.status = ReminderStatus::Sent;
            r.sent_at = Some(sent_at);
            r.last_error = None;
        })
    }

    async fn mark_reminder_failed(&self, id: &str, error: &str) -> Result<()> {
        self.update(id, |r| {
            r.status = ReminderStatus::Failed;
            r.last_error = Some(error.to_string());
        })
    }
}

/// One recorded send
#[derive(Debug, Clone)]
pub struct SentCall {
    pub to: String,
    pub subject: String,
    pub at: Instant,
}

/// Transport that succeeds or fails without touching the network
#[derive(Default)]
pub struct StubTransport {
    fail_all: bool,
    /// Destinations that always fail
    fail_for: Vec<String>,
    calls: Mutex<Vec<SentCall>>,
}

impl StubTransport {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        StubTransport {
            fail_all: true,
            ..Default::default()
        }
    }

    pub fn failing_for(destination: &str) -> Self {
        StubTransport {
            fail_for: vec![destination.to_string()],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationTransport for StubTransport {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> DeliveryResult {
        self.calls.lock().unwrap().push(SentCall {
            to: to.to_string(),
            subject: subject.to_string(),
            at: Instant::now(),
        });

        if self.fail_all || self.fail_for.iter().any(|d| d == to) {
            Err(DeliveryError::Smtp("535 authentication failed".to_string()))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
