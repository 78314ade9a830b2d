use chrono::Local;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::utils::command::BotCommands;

use crate::bot::commands::Command;
use crate::bot::dialogue::{DialogueState, HandlerResult, TrackerDialogue};
use crate::bot::keyboards;
use crate::database::connection::DatabaseManager;
use crate::database::models::{NewTask, Task, TaskStatus, User};
use crate::services::{export, import};
use crate::utils::datetime::{format_datetime, normalize_date, parse_reminder_choice};
use crate::utils::feedback::Feedback;
use crate::utils::validation::{parse_choice_index, validate_description, validate_full_name};

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    // A command always aborts whatever flow was in progress.
    dialogue.exit().await?;

    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Start => handle_start(bot, msg, dialogue, db).await?,
        Command::Tasks => handle_tasks(bot, msg, db).await?,
        Command::Admin => handle_admin_panel(bot, msg, db).await?,
    }
    Ok(())
}

async fn handle_start(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let Some(tg_id) = sender_id(&msg) else { return Ok(()) };

    match User::find_by_tg_id(&db.pool, tg_id).await {
        Ok(Some(user)) => {
            bot.send_message(
                msg.chat.id,
                format!("Welcome back, {}!\nPick an action:", user.full_name),
            )
            .reply_markup(keyboards::main_menu(user.is_admin))
            .await?;
        }
        Ok(None) => {
            bot.send_message(
                msg.chat.id,
                "👋 Welcome to the Practice Tracker Bot!\n\nPlease enter your full name to register:",
            )
            .await?;
            dialogue.update(DialogueState::RegisterFullName).await?;
        }
        Err(e) => return fail_generic(&bot, &msg, "looking up user at /start", e).await,
    }
    Ok(())
}

pub async fn register_full_name(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(text) = msg.text() else {
        feedback.error("Please send your full name as text").await?;
        return Ok(());
    };

    if let Err(e) = validate_full_name(text) {
        feedback.error(&e.to_string()).await?;
        return Ok(());
    }

    let Some(tg_id) = sender_id(&msg) else { return Ok(()) };
    let username = msg.from().and_then(|u| u.username.as_deref()).map(with_at);

    let user = match User::register(&db.pool, tg_id, text.trim(), username.as_deref()).await {
        Ok(user) => user,
        Err(e) => return fail_generic(&bot, &msg, "registering user", e).await,
    };

    tracing::info!("Registered user '{}' for chat {}", user.full_name, tg_id);
    bot.send_message(msg.chat.id, "✅ You are registered!\nPick an action:")
        .reply_markup(keyboards::main_menu(user.is_admin))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

async fn handle_tasks(bot: Bot, msg: Message, db: DatabaseManager) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(user) = known_user(&bot, &msg, &db).await? else { return Ok(()) };

    let tasks = match Task::find_by_owner(&db.pool, &user.id).await {
        Ok(tasks) => tasks,
        Err(e) => return fail_generic(&bot, &msg, "loading tasks", e).await,
    };

    if tasks.is_empty() {
        feedback.info("You have no tasks yet").await?;
        return Ok(());
    }

    // One card per task so every card carries its own action buttons.
    for task in &tasks {
        bot.send_message(msg.chat.id, keyboards::task_card_text(task))
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboards::task_keyboard(&task.id, task.status))
            .await?;
    }
    Ok(())
}

async fn handle_admin_panel(bot: Bot, msg: Message, db: DatabaseManager) -> HandlerResult {
    let Some(_admin) = require_admin(&bot, &msg, &db).await? else { return Ok(()) };

    bot.send_message(
        msg.chat.id,
        "👨‍💼 Admin panel\n\n\
         • 📥 Export tasks\n\
         • 📤 Import tasks\n\
         • ➕ Add task\n\
         • ⏰ Set reminder\n\
         • 👑 Grant/revoke admin\n\
         • 🧹 Wipe database",
    )
    .reply_markup(keyboards::admin_menu())
    .await?;
    Ok(())
}

/// Routes plain text while no flow is active: menu buttons, plus a hint for
/// mistyped commands.
pub async fn menu_router(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let Some(text) = msg.text().map(str::to_string) else { return Ok(()) };

    match text.as_str() {
        keyboards::BTN_MY_TASKS => handle_tasks(bot, msg, db).await,
        keyboards::BTN_ADMIN_PANEL => handle_admin_panel(bot, msg, db).await,
        keyboards::BTN_EXPORT => handle_export(bot, msg, db).await,
        keyboards::BTN_IMPORT => start_import(bot, msg, dialogue, db).await,
        keyboards::BTN_ADD_TASK => {
            start_admin_prompt(bot, msg, dialogue, db, DialogueState::AddTaskFullName).await
        }
        keyboards::BTN_SET_REMINDER => {
            start_admin_prompt(bot, msg, dialogue, db, DialogueState::SetReminderFullName).await
        }
        keyboards::BTN_GRANT_ADMIN => {
            start_admin_prompt(bot, msg, dialogue, db, DialogueState::GrantAdminFullName).await
        }
        keyboards::BTN_WIPE => start_wipe(bot, msg, dialogue, db).await,
        _ if text.starts_with('/') => {
            let feedback = Feedback::new(bot, msg.chat.id);
            feedback
                .error("Unknown command. Use /help to see all available commands")
                .await?;
            Ok(())
        }
        // Anything else is ignored to avoid spamming group chats.
        _ => Ok(()),
    }
}

async fn handle_export(bot: Bot, msg: Message, db: DatabaseManager) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(_admin) = require_admin(&bot, &msg, &db).await? else { return Ok(()) };

    let rows = match Task::all_for_export(&db.pool).await {
        Ok(rows) => rows,
        Err(e) => return fail_generic(&bot, &msg, "exporting tasks", e).await,
    };

    if rows.is_empty() {
        feedback.info("There are no tasks to export").await?;
        return Ok(());
    }

    let csv = export::render_csv(&rows);
    bot.send_document(
        msg.chat.id,
        InputFile::memory(csv.into_bytes()).file_name("tasks.csv"),
    )
    .await?;
    Ok(())
}

async fn start_import(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let Some(_admin) = require_admin(&bot, &msg, &db).await? else { return Ok(()) };

    bot.send_message(
        msg.chat.id,
        "📤 Paste the task batch as CSV text.\n\n\
         First line is the header; required columns: full_name, end_date.\n\
         Optional: practice_name, task_description, start_date, tg_username, phone.\n\n\
         Example:\n\
         full_name,task_description,end_date\n\
         Jane Doe,Prepare the practice program,15.07.2025",
    )
    .await?;
    dialogue.update(DialogueState::ImportRows).await?;
    Ok(())
}

pub async fn import_rows(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(text) = msg.text() else {
        feedback.error("Please paste the batch as text").await?;
        return Ok(());
    };

    let batch = match import::parse_table(text) {
        Ok(batch) => batch,
        Err(e) => {
            feedback.error(&format!("Format error: {e}")).await?;
            dialogue.exit().await?;
            return Ok(());
        }
    };

    if batch.rows.is_empty() {
        feedback.error("The batch contains no valid rows").await?;
        dialogue.exit().await?;
        return Ok(());
    }

    let summary = match import::reconcile(&db, &batch.rows).await {
        Ok(summary) => summary,
        Err(e) => {
            dialogue.exit().await?;
            return fail_generic(&bot, &msg, "importing batch", e).await;
        }
    };

    tracing::info!(
        "Import finished: {} added, {} duplicates, {} rows skipped",
        summary.added,
        summary.duplicates,
        batch.skipped
    );
    feedback
        .success(&format!(
            "Added {} task(s); {} duplicate(s) skipped; {} invalid row(s) ignored",
            summary.added, summary.duplicates, batch.skipped
        ))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

pub async fn add_task_full_name(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(text) = msg.text() else {
        feedback.error("Please send the full name as text").await?;
        return Ok(());
    };

    if let Err(e) = validate_full_name(text) {
        feedback.error(&e.to_string()).await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "Enter the practice name or task description:")
        .await?;
    dialogue
        .update(DialogueState::AddTaskPractice { full_name: text.trim().to_string() })
        .await?;
    Ok(())
}

pub async fn add_task_practice(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    full_name: String,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(text) = msg.text() else {
        feedback.error("Please send the practice name as text").await?;
        return Ok(());
    };

    if let Err(e) = validate_description(text) {
        feedback.error(&e.to_string()).await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "Enter the due date (15.07.2025 or 2025-07-15):")
        .await?;
    dialogue
        .update(DialogueState::AddTaskDueDate {
            full_name,
            practice_name: text.trim().to_string(),
        })
        .await?;
    Ok(())
}

pub async fn add_task_due_date(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
    (full_name, practice_name): (String, String),
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(end_date) = msg.text().and_then(normalize_date) else {
        feedback
            .error("Invalid date format. Use 15.07.2025 or 2025-07-15")
            .await?;
        return Ok(());
    };

    let owner = match User::get_or_create_by_full_name(&db.pool, &full_name, None, None).await {
        Ok(owner) => owner,
        Err(e) => {
            dialogue.exit().await?;
            return fail_generic(&bot, &msg, "resolving task owner", e).await;
        }
    };

    let new_task = NewTask {
        user_id: owner.id,
        practice_name: Some(practice_name.clone()),
        start_date: None,
        end_date,
        description: practice_name,
    };
    if let Err(e) = Task::create(&db.pool, new_task).await {
        dialogue.exit().await?;
        return fail_generic(&bot, &msg, "creating task", e).await;
    }

    feedback
        .success(&format!("Task added for {full_name}"))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

pub async fn set_reminder_full_name(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(text) = msg.text() else {
        feedback.error("Please send the full name as text").await?;
        return Ok(());
    };
    let full_name = text.trim();

    let owners = match User::search_by_full_name(&db.pool, full_name).await {
        Ok(owners) => owners,
        Err(e) => {
            dialogue.exit().await?;
            return fail_generic(&bot, &msg, "searching for owner", e).await;
        }
    };

    let Some(owner) = disambiguate(&feedback, &dialogue, owners, full_name).await? else {
        return Ok(());
    };

    let tasks = match Task::find_by_owner(&db.pool, &owner.id).await {
        Ok(tasks) => tasks,
        Err(e) => {
            dialogue.exit().await?;
            return fail_generic(&bot, &msg, "loading owner's tasks", e).await;
        }
    };

    if tasks.is_empty() {
        feedback.error("This user has no tasks").await?;
        dialogue.exit().await?;
        return Ok(());
    }

    let listing: Vec<String> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let subject = t.practice_name.as_deref().unwrap_or(&t.description);
            format!("{}. {} (due {})", i + 1, shorten(subject, 30), t.end_date)
        })
        .collect();

    bot.send_message(
        msg.chat.id,
        format!("📋 Pick a task (1–{}):\n{}", tasks.len(), listing.join("\n")),
    )
    .await?;
    dialogue
        .update(DialogueState::SetReminderTask {
            task_ids: tasks.into_iter().map(|t| t.id).collect(),
        })
        .await?;
    Ok(())
}

pub async fn set_reminder_pick(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    task_ids: Vec<String>,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let choice = msg.text().map(|t| parse_choice_index(t, task_ids.len()));
    let index = match choice {
        Some(Ok(index)) => index,
        _ => {
            feedback
                .error(&format!("Enter a number between 1 and {}", task_ids.len()))
                .await?;
            return Ok(());
        }
    };

    bot.send_message(
        msg.chat.id,
        "🕒 Choose the reminder:\n\
         • 1 — in 1 day\n\
         • 3 — in 3 days\n\
         • 7 — in a week\n\
         • Or a date like: 2025-07-20 14:30",
    )
    .await?;
    dialogue
        .update(DialogueState::SetReminderWhen { task_id: task_ids[index].clone() })
        .await?;
    Ok(())
}

pub async fn set_reminder_when(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
    task_id: String,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let now = Local::now().naive_local();
    let when = match msg.text().map(|t| parse_reminder_choice(t, now)) {
        Some(Ok(when)) => when,
        Some(Err(e)) => {
            feedback.error(&format!("Invalid format. {e}")).await?;
            return Ok(());
        }
        None => {
            feedback.error("Please send the reminder choice as text").await?;
            return Ok(());
        }
    };

    // A done task stays quiet; its reminder was cleared by the transition.
    match Task::find_by_id(&db.pool, &task_id).await {
        Ok(Some(task)) if task.status == TaskStatus::Done => {
            feedback
                .error("This task is already done; reset it before scheduling reminders")
                .await?;
            dialogue.exit().await?;
            return Ok(());
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            feedback.error("This task no longer exists").await?;
            dialogue.exit().await?;
            return Ok(());
        }
        Err(e) => {
            dialogue.exit().await?;
            return fail_generic(&bot, &msg, "loading task", e).await;
        }
    }

    if let Err(e) = Task::update_next_reminder(&db.pool, &task_id, when).await {
        dialogue.exit().await?;
        return fail_generic(&bot, &msg, "updating reminder", e).await;
    }

    feedback
        .success(&format!("Reminder set for {}", format_datetime(when)))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

pub async fn grant_admin_name(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    let Some(text) = msg.text() else {
        feedback.error("Please send the full name as text").await?;
        return Ok(());
    };
    let full_name = text.trim();

    let users = match User::search_by_full_name(&db.pool, full_name).await {
        Ok(users) => users,
        Err(e) => {
            dialogue.exit().await?;
            return fail_generic(&bot, &msg, "searching for user", e).await;
        }
    };

    let Some(user) = disambiguate(&feedback, &dialogue, users, full_name).await? else {
        return Ok(());
    };

    let make_admin = !user.is_admin;
    let action = if make_admin { "grant admin rights" } else { "revoke admin rights" };
    let status = if user.is_admin { "admin" } else { "regular user" };
    bot.send_message(
        msg.chat.id,
        format!(
            "User: {}\nStatus: {}\n\nConfirm: {}? (yes/no)",
            user.full_name, status, action
        ),
    )
    .await?;
    dialogue
        .update(DialogueState::GrantAdminConfirm {
            user_id: user.id,
            full_name: user.full_name,
            make_admin,
        })
        .await?;
    Ok(())
}

pub async fn grant_admin_confirm(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
    (user_id, full_name, make_admin): (String, String, bool),
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);

    if !is_yes(msg.text()) {
        feedback.error("Cancelled").await?;
        dialogue.exit().await?;
        return Ok(());
    }

    if let Err(e) = User::set_admin(&db.pool, &user_id, make_admin).await {
        dialogue.exit().await?;
        return fail_generic(&bot, &msg, "updating admin flag", e).await;
    }

    let outcome = if make_admin { "is now an admin" } else { "is no longer an admin" };
    tracing::info!("Admin flag changed: '{}' {}", full_name, outcome);
    feedback.success(&format!("{full_name} {outcome}")).await?;
    dialogue.exit().await?;
    Ok(())
}

/// Admin-gated entry into a name-first flow: prompts for the owner's full
/// name and arms the given dialogue state.
async fn start_admin_prompt(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
    next: DialogueState,
) -> HandlerResult {
    let Some(_admin) = require_admin(&bot, &msg, &db).await? else { return Ok(()) };

    let prompt = match next {
        DialogueState::AddTaskFullName => "🆕 Enter the owner's full name:",
        DialogueState::SetReminderFullName => "⏰ Enter the owner's full name:",
        DialogueState::GrantAdminFullName => "👑 Enter the user's full name:",
        _ => "Enter the full name:",
    };
    bot.send_message(msg.chat.id, prompt).await?;
    dialogue.update(next).await?;
    Ok(())
}

async fn start_wipe(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let Some(_admin) = require_admin(&bot, &msg, &db).await? else { return Ok(()) };

    bot.send_message(msg.chat.id, "⚠️ 1. Delete ALL tasks? (yes/no)")
        .await?;
    dialogue.update(DialogueState::WipeConfirmTasks).await?;
    Ok(())
}

pub async fn wipe_confirm_tasks(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);

    if is_yes(msg.text()) {
        match Task::wipe_all(&db.pool).await {
            Ok(count) => {
                tracing::warn!("Wiped {} tasks", count);
                feedback.success(&format!("Deleted {count} task(s)")).await?;
            }
            Err(e) => {
                dialogue.exit().await?;
                return fail_generic(&bot, &msg, "wiping tasks", e).await;
            }
        }
    } else {
        feedback.info("Tasks kept").await?;
    }

    bot.send_message(msg.chat.id, "2. Delete all non-admin users? (yes/no)")
        .await?;
    dialogue.update(DialogueState::WipeConfirmUsers).await?;
    Ok(())
}

pub async fn wipe_confirm_users(
    bot: Bot,
    msg: Message,
    dialogue: TrackerDialogue,
    db: DatabaseManager,
) -> HandlerResult {
    let feedback = Feedback::new(bot.clone(), msg.chat.id);

    if is_yes(msg.text()) {
        match User::wipe_except_admins(&db.pool).await {
            Ok(count) => {
                tracing::warn!("Wiped {} non-admin users", count);
                feedback
                    .success(&format!("Deleted {count} user(s); admins kept"))
                    .await?;
            }
            Err(e) => {
                dialogue.exit().await?;
                return fail_generic(&bot, &msg, "wiping users", e).await;
            }
        }
    } else {
        feedback.info("Users kept").await?;
    }

    dialogue.exit().await?;
    Ok(())
}

// --- shared helpers ---

fn sender_id(msg: &Message) -> Option<i64> {
    msg.from().map(|u| u.id.0 as i64)
}

fn with_at(username: &str) -> String {
    if username.starts_with('@') {
        username.to_string()
    } else {
        format!("@{username}")
    }
}

fn is_yes(text: Option<&str>) -> bool {
    matches!(
        text.map(|t| t.trim().to_lowercase()).as_deref(),
        Some("yes") | Some("y")
    )
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

/// Looks up the sender; prompts for /start when unknown.
async fn known_user(
    bot: &Bot,
    msg: &Message,
    db: &DatabaseManager,
) -> Result<Option<User>, Box<dyn std::error::Error + Send + Sync>> {
    let Some(tg_id) = sender_id(msg) else { return Ok(None) };

    match User::find_by_tg_id(&db.pool, tg_id).await {
        Ok(Some(user)) => Ok(Some(user)),
        Ok(None) => {
            bot.send_message(msg.chat.id, "Please register first with /start")
                .await?;
            Ok(None)
        }
        Err(e) => {
            fail_generic(bot, msg, "looking up user", e).await?;
            Ok(None)
        }
    }
}

/// Looks up the sender and checks the admin flag; every rejection is
/// acknowledged, never silently dropped.
async fn require_admin(
    bot: &Bot,
    msg: &Message,
    db: &DatabaseManager,
) -> Result<Option<User>, Box<dyn std::error::Error + Send + Sync>> {
    let Some(user) = known_user(bot, msg, db).await? else { return Ok(None) };

    if !user.is_admin {
        bot.send_message(msg.chat.id, "This action requires admin rights")
            .await?;
        return Ok(None);
    }
    Ok(Some(user))
}

/// Resolves a full-name search to one user. Zero or several matches end the
/// flow with an explanation; several matches are listed for the admin to
/// refine, never auto-picked.
async fn disambiguate(
    feedback: &Feedback,
    dialogue: &TrackerDialogue,
    mut users: Vec<User>,
    full_name: &str,
) -> Result<Option<User>, Box<dyn std::error::Error + Send + Sync>> {
    match users.len() {
        0 => {
            feedback
                .error(&format!("No user found with the name '{full_name}'"))
                .await?;
            dialogue.exit().await?;
            Ok(None)
        }
        1 => Ok(users.pop()),
        _ => {
            let details: Vec<String> = users
                .iter()
                .map(|u| {
                    format!(
                        "• registered: {}, admin: {}",
                        if u.tg_user_id.is_some() { "yes" } else { "no" },
                        if u.is_admin { "yes" } else { "no" }
                    )
                })
                .collect();
            feedback
                .warning(&format!(
                    "Several users share the name '{}':\n{}\n\nRefine the name and try again",
                    full_name,
                    details.join("\n")
                ))
                .await?;
            dialogue.exit().await?;
            Ok(None)
        }
    }
}

async fn fail_generic(
    bot: &Bot,
    msg: &Message,
    context: &str,
    err: impl std::fmt::Display,
) -> HandlerResult {
    tracing::error!("Store operation failed while {}: {}", context, err);
    let feedback = Feedback::new(bot.clone(), msg.chat.id);
    feedback
        .error("Something went wrong on our side. Please try again later")
        .await?;
    Ok(())
}
