//! # Feature: Reminders
//!
//! Scheduled screening and appointment reminders delivered by email, with
//! startup recovery of pending reminders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod model;
pub mod recovery;
pub mod scheduler;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use model::{NewReminder, NotificationChannel, Reminder, ReminderStatus};
pub use recovery::RecoveryReport;
pub use scheduler::ReminderScheduler;
pub use service::ReminderService;
pub use store::ReminderStore;
