//! Email rendering for reminders.
//!
//! The HTML body comes from a Tera template with autoescaping on, so reminder
//! titles and notes are always escaped.

use crate::core::DeliveryError;
use crate::features::reminders::Reminder;
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

const REMINDER_TEMPLATE_NAME: &str = "reminder.html";

const REMINDER_TEMPLATE: &str = r#"<div style="font-family: sans-serif">
<h2>⏰ Reminder: {{ title }}</h2>
{% if note %}<p>{{ note }}</p>
{% endif %}<p><strong>Scheduled for:</strong> {{ scheduled_for }}</p>
<p style="color: #666">You are receiving this because you set a reminder in RetinaCare.</p>
</div>"#;

/// Subject and HTML body for a reminder email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct ReminderEmailContext<'a> {
    title: &'a str,
    note: &'a str,
    scheduled_for: String,
}

fn init_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(REMINDER_TEMPLATE_NAME, REMINDER_TEMPLATE)?;
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}

/// Render the email for `reminder`. Template failures are permanent.
pub fn render_reminder(reminder: &Reminder) -> Result<RenderedMessage, DeliveryError> {
    let templates = init_templates().map_err(|e| DeliveryError::Build(e.to_string()))?;

    let data = ReminderEmailContext {
        title: &reminder.title,
        note: reminder.note.trim(),
        scheduled_for: reminder
            .scheduled_at
            .format("%Y-%m-%d %H:%M UTC")
            .to_string(),
    };
    let context =
        TeraContext::from_serialize(&data).map_err(|e| DeliveryError::Build(e.to_string()))?;
    let html = templates
        .render(REMINDER_TEMPLATE_NAME, &context)
        .map_err(|e| DeliveryError::Build(e.to_string()))?;

    Ok(RenderedMessage {
        subject: format!("Reminder: {}", reminder.title),
        html,
    })
}
