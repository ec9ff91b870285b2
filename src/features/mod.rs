//! # Features
//!
//! - `notifications`: email transport, rendering and retry
//! - `reminders`: reminder scheduling, dispatch and recovery

pub mod notifications;
pub mod reminders;

pub use notifications::{NotificationTransport, RetryPolicy, SmtpNotifier};
pub use reminders::{ReminderScheduler, ReminderService, ReminderStore};
