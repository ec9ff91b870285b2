//! # Feature: Notifications
//!
//! Email delivery for reminders: SMTP transport, message rendering and a
//! bounded retry envelope with linear backoff.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod message;
pub mod retry;
pub mod transport;

pub use message::{render_reminder, RenderedMessage};
pub use retry::RetryPolicy;
pub use transport::{DeliveryResult, NotificationTransport, SmtpNotifier};
