//! Outbound email transport.
//!
//! Ordinary delivery failures come back as [`DeliveryError`] values, never
//! panics. A notifier built without credentials fails every send immediately
//! with [`DeliveryError::NotConfigured`] and never opens a connection.

use crate::core::{DeliveryError, SmtpConfig};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info, warn};
use std::time::Duration;

pub type DeliveryResult = Result<(), DeliveryError>;

/// Something that can deliver a rendered notification to one destination
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> DeliveryResult;

    /// Transport name for logging
    fn name(&self) -> &'static str;
}

struct SmtpInner {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

/// SMTP-backed transport (STARTTLS relay)
pub struct SmtpNotifier {
    inner: Result<SmtpInner, DeliveryError>,
}

impl SmtpNotifier {
    /// Build from config. Missing or unusable settings leave the notifier in
    /// a permanently unconfigured state instead of failing construction.
    pub fn from_config(config: Option<&SmtpConfig>) -> Self {
        let inner = match config {
            Some(smtp) => Self::build(smtp),
            None => Err(DeliveryError::NotConfigured(
                "SMTP_USER and SMTP_PASS are not set".to_string(),
            )),
        };

        match &inner {
            Ok(smtp) => info!("📧 Email transport ready (from {})", smtp.from),
            Err(e) => warn!("📧 Email transport disabled: {e}"),
        }

        SmtpNotifier { inner }
    }

    fn build(smtp: &SmtpConfig) -> Result<SmtpInner, DeliveryError> {
        let from = smtp
            .from
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::NotConfigured(format!("invalid SMTP_FROM: {e}")))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| DeliveryError::NotConfigured(format!("invalid SMTP_HOST: {e}")))?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .timeout(Some(smtp.timeout))
            .build();

        Ok(SmtpInner {
            mailer,
            from,
            timeout: smtp.timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_ok()
    }
}

#[async_trait]
impl NotificationTransport for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> DeliveryResult {
        let smtp = self.inner.as_ref().map_err(Clone::clone)?;

        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::InvalidAddress(format!("{to}: {e}")))?;

        let message = Message::builder()
            .from(smtp.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| DeliveryError::Build(e.to_string()))?;

        // lettre's own timeout covers socket reads; this bounds the whole exchange
        match tokio::time::timeout(smtp.timeout, smtp.mailer.send(message)).await {
            Ok(Ok(response)) => {
                debug!("SMTP accepted message to {to}: {}", response.code());
                Ok(())
            }
            Ok(Err(e)) => Err(DeliveryError::Smtp(e.to_string())),
            Err(_) => Err(DeliveryError::Timeout(smtp.timeout)),
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
