use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use retinacare::core::Config;
use retinacare::database::Database;
use retinacare::features::notifications::{RetryPolicy, SmtpNotifier};
use retinacare::features::reminders::ReminderScheduler;

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting RetinaCare reminder service...");

    let database = Database::new(&config.database_path).await?;

    let transport = SmtpNotifier::from_config(config.smtp.as_ref());
    let retry = RetryPolicy::new(config.reminder_max_attempts, config.reminder_retry_base);
    let scheduler = ReminderScheduler::new(Arc::new(database), Arc::new(transport), retry);

    // Re-arm timers lost with the previous process
    match scheduler.restore_pending_reminders().await {
        Ok(report) => info!(
            "⏰ Reminder recovery complete: {} scheduled, {} skipped",
            report.scheduled, report.skipped
        ),
        Err(e) => error!("Failed to restore pending reminders: {e}"),
    }

    info!("Reminder service running. Press Ctrl-C to stop.");
    shutdown_signal().await;

    info!("Shutting down, cancelling {} scheduled reminders", scheduler.scheduled_count());
    scheduler.cancel_all_scheduled();

    Ok(())
}
