//! Per-session conversation state. Everything a multi-step flow needs to
//! remember between messages travels in this enum, held by the dialogue
//! storage for exactly one chat; there is no process-wide mutable state.

use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::Dialogue;

pub type TrackerDialogue = Dialogue<DialogueState, InMemStorage<DialogueState>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    /// Registration: waiting for the new user's full name.
    RegisterFullName,
    /// Manual task intake (admin): owner name, then category, then due date.
    AddTaskFullName,
    AddTaskPractice {
        full_name: String,
    },
    AddTaskDueDate {
        full_name: String,
        practice_name: String,
    },
    /// Reminder rescheduling (admin): owner name, numbered task pick, then
    /// the new time.
    SetReminderFullName,
    SetReminderTask {
        task_ids: Vec<String>,
    },
    SetReminderWhen {
        task_id: String,
    },
    /// Admin-right toggling (admin): owner name, then confirmation.
    GrantAdminFullName,
    GrantAdminConfirm {
        user_id: String,
        full_name: String,
        make_admin: bool,
    },
    /// Waiting for a pasted CSV batch (admin).
    ImportRows,
    /// Two-step database wipe (admin), each step confirmed separately.
    WipeConfirmTasks,
    WipeConfirmUsers,
}
