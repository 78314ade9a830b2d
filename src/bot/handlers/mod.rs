pub mod callback;
pub mod message;

use teloxide::dispatching::{dialogue, dialogue::InMemStorage, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::bot::commands::Command;
use crate::bot::dialogue::DialogueState;

/// Builds the update-handling tree. Commands win over any active flow; the
/// dialogue branches carry each multi-step flow's state; plain text falls
/// through to the menu router.
pub fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use dptree::case;

    let message_handler = Update::filter_message()
        .branch(
            teloxide::filter_command::<Command, _>().endpoint(message::command_handler),
        )
        .branch(case![DialogueState::RegisterFullName].endpoint(message::register_full_name))
        .branch(case![DialogueState::AddTaskFullName].endpoint(message::add_task_full_name))
        .branch(case![DialogueState::AddTaskPractice { full_name }].endpoint(message::add_task_practice))
        .branch(
            case![DialogueState::AddTaskDueDate { full_name, practice_name }]
                .endpoint(message::add_task_due_date),
        )
        .branch(case![DialogueState::SetReminderFullName].endpoint(message::set_reminder_full_name))
        .branch(case![DialogueState::SetReminderTask { task_ids }].endpoint(message::set_reminder_pick))
        .branch(case![DialogueState::SetReminderWhen { task_id }].endpoint(message::set_reminder_when))
        .branch(case![DialogueState::GrantAdminFullName].endpoint(message::grant_admin_name))
        .branch(
            case![DialogueState::GrantAdminConfirm { user_id, full_name, make_admin }]
                .endpoint(message::grant_admin_confirm),
        )
        .branch(case![DialogueState::ImportRows].endpoint(message::import_rows))
        .branch(case![DialogueState::WipeConfirmTasks].endpoint(message::wipe_confirm_tasks))
        .branch(case![DialogueState::WipeConfirmUsers].endpoint(message::wipe_confirm_users))
        .endpoint(message::menu_router);

    dialogue::enter::<Update, InMemStorage<DialogueState>, DialogueState, _>()
        .branch(message_handler)
        .branch(Update::filter_callback_query().endpoint(callback::handle_callback))
}
