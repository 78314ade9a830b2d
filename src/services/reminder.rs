use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};
use teloxide::{prelude::*, Bot};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::database::connection::DatabaseManager;
use crate::database::models::DueReminder;
use crate::database::models::Task;
use crate::utils::datetime::format_date;

/// How far a fired reminder is pushed out before the next occurrence.
const REMINDER_INTERVAL_DAYS: i64 = 7;

/// Daily trigger at 09:00.
const REMINDER_CRON: &str = "0 0 9 * * *";

pub struct ReminderService {
    bot: Bot,
    db: Arc<DatabaseManager>,
    scheduler: JobScheduler,
}

impl ReminderService {
    pub async fn new(
        bot: Bot,
        db: Arc<DatabaseManager>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self { bot, db, scheduler })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let bot = self.bot.clone();
        let db = self.db.clone();

        let reminder_job = Job::new_async(REMINDER_CRON, move |_uuid, _l| {
            let bot = bot.clone();
            let db = db.clone();
            Box::pin(async move {
                let now = Local::now().naive_local();
                match run_reminder_pass(&db, now, |chat_id, text| {
                    deliver(bot.clone(), chat_id, text)
                })
                .await
                {
                    Ok(summary) => tracing::info!(
                        "Reminder pass finished: {} due, {} sent, {} failed",
                        summary.due,
                        summary.sent,
                        summary.failed
                    ),
                    Err(e) => tracing::error!("Reminder pass failed: {}", e),
                }
            })
        })?;

        self.scheduler.add(reminder_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Reminder service started - daily pass at 09:00");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    // Manual trigger for testing
    pub async fn check_reminders_now(&self) -> anyhow::Result<ReminderPassSummary> {
        let bot = self.bot.clone();
        let now = Local::now().naive_local();
        run_reminder_pass(&self.db, now, |chat_id, text| {
            deliver(bot.clone(), chat_id, text)
        })
        .await
    }
}

async fn deliver(bot: Bot, chat_id: i64, text: String) -> anyhow::Result<()> {
    bot.send_message(ChatId(chat_id), text).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPassSummary {
    /// Tasks in the due set, each visited exactly once.
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}

/// One reminder pass. The due set is read once; each task is then handled as
/// its own small unit of work: attempt delivery, log failures, and advance
/// the reminder seven days from pass time either way, so one unreachable
/// owner neither blocks the batch nor accumulates a backlog. Tasks due in the
/// same pass for the same owner each get their own message.
///
/// Generic over the delivery function so the pass is testable without a
/// Telegram connection.
pub async fn run_reminder_pass<N, Fut>(
    db: &DatabaseManager,
    now: NaiveDateTime,
    notify: N,
) -> anyhow::Result<ReminderPassSummary>
where
    N: Fn(i64, String) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let due = Task::find_due(&db.pool, now).await?;
    let mut summary = ReminderPassSummary { due: due.len(), sent: 0, failed: 0 };

    for reminder in &due {
        match reminder.tg_user_id {
            Some(chat_id) => match notify(chat_id, reminder_text(reminder)).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        "Failed to deliver reminder for task {} to chat {}: {}",
                        reminder.task_id,
                        chat_id,
                        e
                    );
                }
            },
            None => {
                summary.failed += 1;
                tracing::warn!(
                    "Owner '{}' of task {} has no chat identity yet; reminder skipped",
                    reminder.full_name,
                    reminder.task_id
                );
            }
        }

        Task::update_next_reminder(
            &db.pool,
            &reminder.task_id,
            now + Duration::days(REMINDER_INTERVAL_DAYS),
        )
        .await?;
    }

    Ok(summary)
}

fn reminder_text(reminder: &DueReminder) -> String {
    let subject = reminder
        .practice_name
        .as_deref()
        .unwrap_or(&reminder.description);

    format!(
        "🔔 Practice reminder\n\n\
         Practice: {}\n\
         Description: {}\n\
         Due: {}\n\n\
         This repeats weekly until the task is marked done.",
        subject,
        reminder.description,
        format_date(reminder.end_date)
    )
}
