//! # Core Module
//!
//! Configuration and error types shared by the reminder features.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, SmtpConfig};
pub use error::{DeliveryError, ScheduleError};
