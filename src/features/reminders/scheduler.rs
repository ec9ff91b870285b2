//! # Reminder Scheduler
//!
//! Owns the table of live reminder timers and the dispatch that runs when a
//! timer fires.
//!
//! Each scheduled reminder gets one spawned task that sleeps until the
//! reminder's deadline. The table maps reminder id to that task's cancel
//! handle and holds at most one entry per id: scheduling an id again drops
//! the previous handle, which stops the old task before it can fire.
//!
//! Entries carry a generation number so a task only ever removes its own
//! entry, never one installed by a later reschedule.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::{DeliveryError, ScheduleError};
use crate::features::notifications::{
    render_reminder, DeliveryResult, NotificationTransport, RetryPolicy,
};
use crate::features::reminders::model::{NotificationChannel, Reminder};
use crate::features::reminders::store::ReminderStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// A live timer. Dropping `_cancel` stops the timer task if it has not fired.
struct TimerEntry {
    generation: u64,
    scheduled_at: DateTime<Utc>,
    _cancel: oneshot::Sender<()>,
}

/// What a dispatch did with a reminder
#[derive(Debug, Clone, PartialEq, Eq)]
enum DispatchOutcome {
    /// Record was gone or no longer pending
    Skipped,
    Sent,
    Failed,
}

struct SchedulerInner {
    store: Arc<dyn ReminderStore>,
    transport: Arc<dyn NotificationTransport>,
    retry: RetryPolicy,
    timers: DashMap<String, TimerEntry>,
    next_generation: AtomicU64,
}

#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        transport: Arc<dyn NotificationTransport>,
        retry: RetryPolicy,
    ) -> Self {
        ReminderScheduler {
            inner: Arc::new(SchedulerInner {
                store,
                transport,
                retry,
                timers: DashMap::new(),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn ReminderStore> {
        &self.inner.store
    }

    /// Register a one-shot timer for `reminder`, replacing any live timer for
    /// the same id. Refuses reminders whose time is not strictly in the future.
    pub fn schedule(&self, reminder: &Reminder) -> Result<(), ScheduleError> {
        let now = Utc::now();
        if reminder.scheduled_at <= now {
            return Err(ScheduleError::NotInFuture(reminder.id.clone()));
        }

        let delay = (reminder.scheduled_at - now)
            .to_std()
            .map_err(|_| ScheduleError::InvalidTimestamp(reminder.id.clone()))?;
        let deadline = Instant::now()
            .checked_add(delay)
            .ok_or_else(|| ScheduleError::InvalidTimestamp(reminder.id.clone()))?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ScheduleError::NoRuntime(reminder.id.clone()))?;

        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        // Insert before spawning so the task can never observe a missing entry
        let previous = self.inner.timers.insert(
            reminder.id.clone(),
            TimerEntry {
                generation,
                scheduled_at: reminder.scheduled_at,
                _cancel: cancel_tx,
            },
        );
        if previous.is_some() {
            debug!("Replaced existing timer for reminder {}", reminder.id);
        }
        drop(previous);

        let inner = self.inner.clone();
        let id = reminder.id.clone();
        runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_rx => {
                    debug!("Timer for reminder {id} cancelled");
                    return;
                }
                _ = tokio::time::sleep_until(deadline) => {}
            }

            let outcome = inner.dispatch(&id).await;
            debug!("Reminder {id} dispatch finished: {outcome:?}");

            inner
                .timers
                .remove_if(&id, |_, entry| entry.generation == generation);
        });

        info!(
            "Scheduled reminder {} for {} (in {}s)",
            reminder.id,
            reminder.scheduled_at,
            delay.as_secs()
        );
        Ok(())
    }

    /// Cancel the live timer for `id`. Returns whether one existed; calling
    /// this for an unknown id is a no-op.
    pub fn cancel(&self, id: &str) -> bool {
        match self.inner.timers.remove(id) {
            Some(_) => {
                info!("Cancelled scheduled reminder {id}");
                true
            }
            None => false,
        }
    }

    /// Cancel every live timer. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let count = self.inner.timers.len();
        self.inner.timers.clear();
        if count > 0 {
            info!("Cancelled {count} scheduled reminders");
        }
        count
    }

    /// Programmatic entry point used right after a reminder is created
    pub fn schedule_reminder(&self, reminder: &Reminder) -> bool {
        match self.schedule(reminder) {
            Ok(()) => true,
            Err(e) => {
                warn!("Not scheduling reminder: {e}");
                false
            }
        }
    }

    /// Programmatic entry point used right after a reminder is deleted
    pub fn cancel_scheduled_reminder(&self, id: &str) -> bool {
        self.cancel(id)
    }

    /// Shutdown hook
    pub fn cancel_all_scheduled(&self) {
        self.cancel_all();
    }

    pub fn is_scheduled(&self, id: &str) -> bool {
        self.inner.timers.contains_key(id)
    }

    pub fn scheduled_count(&self) -> usize {
        self.inner.timers.len()
    }

    /// When the live timer for `id` is due, if there is one
    pub fn scheduled_time(&self, id: &str) -> Option<DateTime<Utc>> {
        self.inner.timers.get(id).map(|entry| entry.scheduled_at)
    }
}

impl SchedulerInner {
    /// Deliver a reminder whose timer fired and record the result.
    /// Never returns an error: every failure ends up logged or in the record.
    async fn dispatch(&self, id: &str) -> DispatchOutcome {
        let reminder = match self.store.get_reminder(id).await {
            Ok(Some(reminder)) if reminder.is_pending() => reminder,
            Ok(Some(reminder)) => {
                debug!(
                    "Reminder {id} already {}; skipping dispatch",
                    reminder.status
                );
                return DispatchOutcome::Skipped;
            }
            Ok(None) => {
                debug!("Reminder {id} was deleted before it fired");
                return DispatchOutcome::Skipped;
            }
            Err(e) => {
                error!("Failed to load reminder {id} for dispatch: {e}");
                return DispatchOutcome::Skipped;
            }
        };

        match self.deliver(&reminder).await {
            Ok(()) => {
                if let Err(e) = self.store.mark_reminder_sent(id, Utc::now()).await {
                    error!("Reminder {id} was sent but its status could not be saved: {e}");
                }
                info!(
                    "✅ Reminder {id} sent to {} via {}",
                    reminder.contact_target, reminder.notification_channel
                );
                DispatchOutcome::Sent
            }
            Err(delivery_error) => {
                let message = delivery_error.to_string();
                if let Err(e) = self.store.mark_reminder_failed(id, &message).await {
                    error!("Reminder {id} failed but its status could not be saved: {e}");
                }
                warn!("❌ Reminder {id} failed: {message}");
                DispatchOutcome::Failed
            }
        }
    }

    async fn deliver(&self, reminder: &Reminder) -> DeliveryResult {
        match reminder.notification_channel {
            NotificationChannel::Email => {
                let message = render_reminder(reminder)?;
                let label = format!(
                    "Reminder {} ({} via {})",
                    reminder.id,
                    reminder.contact_target,
                    self.transport.name()
                );
                self.retry
                    .attempt(&label, || {
                        self.transport
                            .send(&reminder.contact_target, &message.subject, &message.html)
                    })
                    .await
            }
            NotificationChannel::Sms => Err(DeliveryError::UnsupportedChannel(
                NotificationChannel::Sms.to_string(),
            )),
        }
    }
}
