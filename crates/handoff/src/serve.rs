// SPDX-FileCopyrightText: 2026 Handoff Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `handoff serve` command implementation.
//!
//! Composition root: opens the database, wires the engine, dispatcher, and
//! notification worker, and runs the HTTP server until SIGINT/SIGTERM.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use handoff_config::HandoffConfig;
use handoff_core::HandoffError;
use handoff_engine::ConversationEngine;
use handoff_notify::{Mailer, NotificationWorker, NullMailer, QueueDispatcher, SmtpMailer};
use handoff_storage::{Database, SqliteThreads};

use crate::http;

pub async fn run_serve(config: HandoffConfig) -> Result<(), HandoffError> {
    init_tracing(&config.server.log_level);

    info!("starting handoff serve");

    if let Some(parent) = std::path::Path::new(&config.storage.database_path).parent() {
        std::fs::create_dir_all(parent).map_err(|e| HandoffError::Storage {
            source: Box::new(e),
        })?;
    }
    let db = Database::open(&config.storage.database_path).await?;
    info!(path = config.storage.database_path.as_str(), "database open");

    let threads = Arc::new(SqliteThreads::new(db.clone()));
    let dispatcher = Arc::new(QueueDispatcher::new(db.clone()));
    let engine = ConversationEngine::new(db.clone(), threads.clone(), dispatcher, &config);

    let mailer: Arc<dyn Mailer> = if config.notify.enabled {
        info!(
            relay = config.smtp.host.as_str(),
            recipients = config.notify.notify_emails.len(),
            "SMTP notification delivery enabled"
        );
        Arc::new(SmtpMailer::from_config(&config.notify, &config.smtp)?)
    } else {
        info!("notification delivery disabled; jobs will be drained without sending");
        Arc::new(NullMailer)
    };

    let cancel = install_signal_handler();

    let worker = NotificationWorker::new(db.clone(), threads, mailer, config.notify.clone());
    let worker_handle = tokio::spawn(worker.run(cancel.clone()));

    let app = http::router(engine);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| HandoffError::Internal(format!("failed to bind to {addr}: {e}")))?;
    info!("handoff listening on {addr}");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| HandoffError::Internal(format!("server error: {e}")))?;

    // On a signal-initiated shutdown the token is already cancelled and the
    // worker may have exited; cancelling again is a no-op. Waiting on the
    // handle lets in-flight notification delivery finish before the
    // database closes.
    cancel.cancel();
    if let Err(e) = worker_handle.await {
        error!(error = %e, "notification worker panicked");
    }

    db.close().await?;
    info!("handoff serve shutdown complete");
    Ok(())
}

/// Installs SIGINT/SIGTERM handlers that fire a shared cancellation token.
fn install_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to install SIGINT handler");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = terminate => info!("received SIGTERM, shutting down"),
        }
        token.cancel();
    });

    cancel
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "handoff={log_level},handoff_storage={log_level},handoff_engine={log_level},handoff_notify={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
