//! Startup recovery of pending reminders.
//!
//! Timers live only in memory, so after a restart every pending reminder that
//! is still due in the future gets re-registered. Pending reminders whose time
//! passed while the process was down are left untouched.

use crate::features::reminders::scheduler::ReminderScheduler;
use anyhow::Result;
use chrono::Utc;
use log::{info, warn};

/// Counts from one recovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Pending future reminders returned by the store
    pub found: usize,
    pub scheduled: usize,
    /// Records the scheduler refused (not pending, or no longer in the future)
    pub skipped: usize,
}

impl ReminderScheduler {
    /// Re-register every pending future reminder from the store. Run once at
    /// startup, after the database is open.
    pub async fn restore_pending_reminders(&self) -> Result<RecoveryReport> {
        let now = Utc::now();
        let reminders = self.store().get_pending_reminders_after(now).await?;

        let mut report = RecoveryReport {
            found: reminders.len(),
            ..Default::default()
        };

        for reminder in &reminders {
            if !reminder.is_pending() || !reminder.is_due_after(now) {
                report.skipped += 1;
                continue;
            }

            match self.schedule(reminder) {
                Ok(()) => report.scheduled += 1,
                Err(e) => {
                    warn!("Could not restore reminder {}: {e}", reminder.id);
                    report.skipped += 1;
                }
            }
        }

        if report.found > 0 {
            info!(
                "Restored {} pending reminders ({} skipped)",
                report.scheduled, report.skipped
            );
        } else {
            info!("No pending reminders to restore");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::features::notifications::RetryPolicy;
    use crate::features::reminders::model::ReminderStatus;
    use crate::features::reminders::store::ReminderStore;
    use crate::features::reminders::testing::{reminder_at, MemoryStore, StubTransport};
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_restores_only_pending_future() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();

        store
            .add_reminder(&reminder_at("a", now + Duration::minutes(10)))
            .await
            .unwrap();
        store
            .add_reminder(&reminder_at("b", now - Duration::minutes(10)))
            .await
            .unwrap();
        let mut sent = reminder_at("c", now + Duration::minutes(10));
        sent.status = ReminderStatus::Sent;
        store.add_reminder(&sent).await.unwrap();

        let scheduler = ReminderScheduler::new(
            store.clone(),
            Arc::new(StubTransport::succeeding()),
            RetryPolicy::default(),
        );
        let report = scheduler.restore_pending_reminders().await.unwrap();

        assert_eq!(report.scheduled, 1);
        assert!(scheduler.is_scheduled("a"));
        assert!(!scheduler.is_scheduled("b"));
        assert!(!scheduler.is_scheduled("c"));

        // Overdue reminders stay pending and unmodified
        let overdue = store.get_reminder("b").await.unwrap().unwrap();
        assert_eq!(overdue.status, ReminderStatus::Pending);
        assert_eq!(store.write_count(), 0);

        scheduler.cancel_all();
    }

    #[tokio::test]
    async fn test_restore_twice_keeps_one_timer_each() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for id in ["a", "b"] {
            store
                .add_reminder(&reminder_at(id, now + Duration::minutes(10)))
                .await
                .unwrap();
        }

        let scheduler = ReminderScheduler::new(
            store,
            Arc::new(StubTransport::succeeding()),
            RetryPolicy::default(),
        );
        scheduler.restore_pending_reminders().await.unwrap();
        scheduler.restore_pending_reminders().await.unwrap();

        assert_eq!(scheduler.scheduled_count(), 2);
        scheduler.cancel_all();
    }

    #[tokio::test]
    async fn test_restored_reminder_fires_from_database() {
        let db = Database::new(":memory:").await.unwrap();
        db.add_reminder(&reminder_at(
            "r1",
            Utc::now() + Duration::milliseconds(150),
        ))
        .await
        .unwrap();

        let transport = Arc::new(StubTransport::succeeding());
        let scheduler = ReminderScheduler::new(
            Arc::new(db.clone()),
            transport.clone(),
            RetryPolicy::default(),
        );
        let report = scheduler.restore_pending_reminders().await.unwrap();
        assert_eq!(report.found, 1);
        assert_eq!(report.scheduled, 1);

        tokio::time::sleep(std::time::Duration::from_millis(400)).await;

        assert_eq!(transport.calls().len(), 1);
        let stored = db.get_reminder("r1").await.unwrap().unwrap();
        assert_eq!(stored.status, ReminderStatus::Sent);
        assert!(!scheduler.is_scheduled("r1"));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let scheduler = ReminderScheduler::new(
            Arc::new(MemoryStore::new()),
            Arc::new(StubTransport::succeeding()),
            RetryPolicy::default(),
        );
        let report = scheduler.restore_pending_reminders().await.unwrap();
        assert_eq!(report, RecoveryReport::default());
    }
}
