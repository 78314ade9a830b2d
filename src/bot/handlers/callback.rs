use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dialogue::HandlerResult;
use crate::bot::keyboards;
use crate::database::connection::DatabaseManager;
use crate::database::models::{transition, Task, TaskAction, User};

/// Handles status-change buttons. Callback data format: `task:<id>:<action>`.
///
/// The transition decision lives in `models::status`; this handler only
/// parses, checks ownership, applies the result in one statement, and
/// re-renders the card so the buttons always reflect the stored status,
/// also after a stale double-tap.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    db: DatabaseManager,
) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).text("Invalid callback data").await?;
        return Ok(());
    };

    let caller_tg_id = q.from.id.0 as i64;
    tracing::info!("Callback '{}' from user {}", data, caller_tg_id);

    let parts: Vec<&str> = data.split(':').collect();
    let (task_id, action) = match parts.as_slice() {
        ["task", task_id, action] if !task_id.is_empty() => match TaskAction::parse(action) {
            Some(action) => (*task_id, action),
            None => {
                bot.answer_callback_query(q.id).text("Unknown action").await?;
                return Ok(());
            }
        },
        _ => {
            bot.answer_callback_query(q.id).text("Invalid callback data").await?;
            return Ok(());
        }
    };

    let caller = match User::find_by_tg_id(&db.pool, caller_tg_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            bot.answer_callback_query(q.id).text("Please register first with /start").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to look up callback sender: {}", e);
            bot.answer_callback_query(q.id).text("Something went wrong, try again").await?;
            return Ok(());
        }
    };

    let mut task = match Task::find_by_id(&db.pool, task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            bot.answer_callback_query(q.id).text("Task not found").await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Failed to load task {}: {}", task_id, e);
            bot.answer_callback_query(q.id).text("Something went wrong, try again").await?;
            return Ok(());
        }
    };

    if task.user_id != caller.id {
        bot.answer_callback_query(q.id).text("This task belongs to someone else").await?;
        return Ok(());
    }

    match transition(task.status, action) {
        Ok(t) => {
            if let Err(e) = Task::update_status(&db.pool, &task.id, t.new_status, t.clear_reminder).await {
                tracing::error!("Failed to update status of task {}: {}", task.id, e);
                bot.answer_callback_query(q.id).text("Failed to save the status change").await?;
                return Ok(());
            }

            task.status = t.new_status;
            if t.clear_reminder {
                task.next_reminder = None;
            }

            rerender_card(&bot, &q, &task).await?;
            bot.answer_callback_query(q.id)
                .text(format!("Status changed: {}", t.new_status.label()))
                .await?;
        }
        Err(e) => {
            // Stale tap: the state advanced since the card was rendered.
            // Refresh the card so the offered actions match again.
            rerender_card(&bot, &q, &task).await?;
            bot.answer_callback_query(q.id).text(format!("⚠️ {e}")).await?;
        }
    }

    Ok(())
}

async fn rerender_card(bot: &Bot, q: &CallbackQuery, task: &Task) -> HandlerResult {
    if let Some(message) = q.message.as_ref() {
        // Telegram rejects edits that change nothing; a repeated stale tap
        // lands here, and the answer toast is all the user needs.
        let edited = bot
            .edit_message_text(message.chat.id, message.id, keyboards::task_card_text(task))
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboards::task_keyboard(&task.id, task.status))
            .await;
        if let Err(e) = edited {
            tracing::debug!("Card refresh for task {} skipped: {}", task.id, e);
        }
    }
    Ok(())
}
