//! Reminder record and its enumerated fields.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery status of a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    /// Waiting for its timer to fire
    Pending,
    /// Delivered successfully
    Sent,
    /// All delivery attempts failed
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Sent => "sent",
            ReminderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReminderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ReminderStatus::Pending),
            "sent" => Ok(ReminderStatus::Sent),
            "failed" => Ok(ReminderStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid reminder status: {}", s)),
        }
    }
}

/// Channel a reminder is delivered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    /// Accepted at creation, but delivery always fails
    Sms,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Sms => "sms",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationChannel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "email" => Ok(NotificationChannel::Email),
            "sms" => Ok(NotificationChannel::Sms),
            _ => Err(anyhow::anyhow!("Invalid notification channel: {}", s)),
        }
    }
}

/// A user-scheduled future notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Unique reminder identifier
    pub id: String,

    /// Owner of the reminder
    pub user_id: String,

    pub title: String,

    pub note: String,

    /// When the notification should go out
    pub scheduled_at: DateTime<Utc>,

    pub notification_channel: NotificationChannel,

    /// Destination address for the channel
    pub contact_target: String,

    pub status: ReminderStatus,

    /// Set only on transition to sent
    pub sent_at: Option<DateTime<Utc>>,

    /// Set only on transition to failed
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn is_pending(&self) -> bool {
        self.status == ReminderStatus::Pending
    }

    /// Whether the reminder still has to fire after `now`
    pub fn is_due_after(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at > now
    }
}

/// Input for creating a reminder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub note: String,
    pub scheduled_at: DateTime<Utc>,
    pub notification_channel: NotificationChannel,
    pub contact_target: String,
}
