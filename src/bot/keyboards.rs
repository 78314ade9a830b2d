//! Keyboard construction and task card rendering. The inline action set is
//! always derived from the task's current status, so the UI never offers a
//! transition the engine would reject.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::database::models::{Task, TaskStatus};
use crate::utils::datetime::format_date;
use crate::utils::markdown::escape_markdown;

pub const BTN_MY_TASKS: &str = "📋 My tasks";
pub const BTN_ADMIN_PANEL: &str = "👨‍💼 Admin panel";

pub const BTN_EXPORT: &str = "📥 Export tasks";
pub const BTN_IMPORT: &str = "📤 Import tasks";
pub const BTN_ADD_TASK: &str = "➕ Add task";
pub const BTN_SET_REMINDER: &str = "⏰ Set reminder";
pub const BTN_GRANT_ADMIN: &str = "👑 Grant/revoke admin";
pub const BTN_WIPE: &str = "🧹 Wipe database";

/// Persistent menu under the text input.
pub fn main_menu(is_admin: bool) -> KeyboardMarkup {
    let mut rows = vec![vec![KeyboardButton::new(BTN_MY_TASKS)]];
    if is_admin {
        rows.push(vec![KeyboardButton::new(BTN_ADMIN_PANEL)]);
    }
    KeyboardMarkup::new(rows).resize_keyboard(true)
}

pub fn admin_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BTN_EXPORT), KeyboardButton::new(BTN_IMPORT)],
        vec![KeyboardButton::new(BTN_ADD_TASK), KeyboardButton::new(BTN_SET_REMINDER)],
        vec![KeyboardButton::new(BTN_GRANT_ADMIN), KeyboardButton::new(BTN_WIPE)],
        vec![KeyboardButton::new(BTN_MY_TASKS)],
    ])
    .resize_keyboard(true)
}

/// Inline actions valid for the task's current status, one per row.
/// Callback data format: `task:<id>:<action>`.
pub fn task_keyboard(task_id: &str, status: TaskStatus) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = status
        .available_actions()
        .iter()
        .map(|action| {
            vec![InlineKeyboardButton::callback(
                action.label().to_string(),
                format!("task:{task_id}:{}", action.as_str()),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(rows)
}

/// MarkdownV2 card shown for one task, in the listing and after each status
/// change.
pub fn task_card_text(task: &Task) -> String {
    let practice = task
        .practice_name
        .as_deref()
        .unwrap_or(&task.description);

    format!(
        "📄 *Practice:* {}\n📅 *Due:* {}\n📝 *Status:* {}\n💬 *Description:* {}",
        escape_markdown(practice),
        escape_markdown(&format_date(task.end_date)),
        escape_markdown(task.status.label()),
        escape_markdown(&task.description)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate};

    fn sample_task(status: TaskStatus) -> Task {
        let now = Local::now().naive_local();
        Task {
            id: "task-1".to_string(),
            user_id: "user-1".to_string(),
            practice_name: Some("Field practice".to_string()),
            start_date: None,
            end_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            description: "Prepare the program".to_string(),
            status,
            next_reminder: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_task_keyboard_matches_status() {
        let kb = task_keyboard("task-1", TaskStatus::Unseen);
        assert_eq!(kb.inline_keyboard.len(), 1);

        let kb = task_keyboard("task-1", TaskStatus::InProgress);
        assert_eq!(kb.inline_keyboard.len(), 2);

        let kb = task_keyboard("task-1", TaskStatus::Done);
        assert_eq!(kb.inline_keyboard.len(), 1);
    }

    #[test]
    fn test_task_keyboard_callback_data() {
        let kb = task_keyboard("task-1", TaskStatus::Unseen);
        let button = &kb.inline_keyboard[0][0];
        match &button.kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, "task:task-1:take");
            }
            other => panic!("unexpected button kind: {other:?}"),
        }
    }

    #[test]
    fn test_task_card_text_escapes_markdown() {
        let task = sample_task(TaskStatus::Unseen);
        let text = task_card_text(&task);
        assert!(text.contains("Field practice"));
        assert!(text.contains("2025\\-07\\-15"));
        assert!(text.contains("not seen yet"));
    }

    #[test]
    fn test_main_menu_admin_row() {
        assert_eq!(main_menu(false).keyboard.len(), 1);
        assert_eq!(main_menu(true).keyboard.len(), 2);
    }
}
