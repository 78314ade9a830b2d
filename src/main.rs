//! Application entry point: initializes logging, loads configuration, sets up
//! the database, starts the reminder service and health server, and runs the
//! Telegram dispatcher.

use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod bot;
mod config;
mod database;
mod services;
mod utils;

use crate::bot::dialogue::DialogueState;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::User;
use crate::services::health::HealthService;
use crate::services::reminder::ReminderService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "practice_tracker_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Practice Tracker Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}",
        config.database_url, config.http_port
    );

    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    if let Some(admin_id) = config.bootstrap_admin_id {
        User::ensure_bootstrap_admin(&db_arc.pool, admin_id).await?;
        info!("Bootstrap admin ensured for Telegram id {}", admin_id);
    }

    info!("Initializing Telegram bot...");
    let telegram_bot = Bot::new(&config.telegram_bot_token);

    info!("Initializing reminder service...");
    let mut reminder_service = match ReminderService::new(telegram_bot.clone(), db_arc.clone()).await
    {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create reminder service: {}", e);
            return Err(anyhow::anyhow!("Failed to create reminder service: {}", e));
        }
    };

    if let Err(e) = reminder_service.start().await {
        tracing::error!("Failed to start reminder service: {}", e);
    } else {
        info!("Reminder service started successfully");
    }

    let health_service = HealthService::new(db_arc.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    let db_for_dispatcher = db_arc.as_ref().clone();
    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(telegram_bot, bot::handlers::schema())
            .dependencies(dptree::deps![
                InMemStorage::<DialogueState>::new(),
                db_for_dispatcher
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Either task finishing means the process is going down.
    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = reminder_service.stop().await {
        tracing::warn!("Error stopping reminder service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
