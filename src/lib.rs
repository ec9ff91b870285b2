// Core layer - configuration and error types
pub mod core;

// Features layer - notifications and reminders
pub mod features;

// Infrastructure
pub mod database;

pub use crate::core::{Config, DeliveryError, ScheduleError};
pub use database::Database;

pub use features::{
    // Notifications
    NotificationTransport, RetryPolicy, SmtpNotifier,
    // Reminders
    ReminderScheduler, ReminderService, ReminderStore,
};
