use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a task. Stored as snake_case text in the `tasks`
/// table, constrained by a CHECK clause in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Unseen,
    InProgress,
    Reviewed,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Unseen => "unseen",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Reviewed => "reviewed",
            TaskStatus::Done => "done",
        }
    }

    /// Human-facing label used in task cards.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Unseen => "not seen yet",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Reviewed => "reviewed",
            TaskStatus::Done => "done",
        }
    }

    /// The actions a rendered task card may offer for this status. The UI
    /// must never present anything outside this set; `transition` still
    /// rejects stale requests on its own.
    pub fn available_actions(&self) -> &'static [TaskAction] {
        match self {
            TaskStatus::Unseen => &[TaskAction::Take],
            TaskStatus::InProgress => &[TaskAction::Review, TaskAction::Reset],
            TaskStatus::Reviewed => &[TaskAction::Complete, TaskAction::Reset],
            TaskStatus::Done => &[TaskAction::Reset],
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A requested status change, as carried in callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Take,
    Review,
    Complete,
    Reset,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Take => "take",
            TaskAction::Review => "review",
            TaskAction::Complete => "complete",
            TaskAction::Reset => "reset",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "take" => Some(TaskAction::Take),
            "review" => Some(TaskAction::Review),
            "complete" => Some(TaskAction::Complete),
            "reset" => Some(TaskAction::Reset),
            _ => None,
        }
    }

    /// Button caption for this action.
    pub fn label(&self) -> &'static str {
        match self {
            TaskAction::Take => "🔄 Take on",
            TaskAction::Review => "👁 Mark reviewed",
            TaskAction::Complete => "✅ Done",
            TaskAction::Reset => "↩️ Reset",
        }
    }
}

/// Outcome of a valid transition: the status to write and whether the
/// reminder must be nulled in the same statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub new_status: TaskStatus,
    pub clear_reminder: bool,
}

/// A (status, action) pair outside the transition table. Usually a stale
/// button tap after the state already advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub status: TaskStatus,
    pub action: TaskAction,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action '{}' is not valid for a task that is {}",
            self.action.as_str(),
            self.status.label()
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Pure transition function. No storage access; the caller applies the
/// returned `Transition` to the store in a single statement.
pub fn transition(status: TaskStatus, action: TaskAction) -> Result<Transition, InvalidTransition> {
    let new_status = match (status, action) {
        (TaskStatus::Unseen, TaskAction::Take) => TaskStatus::InProgress,
        (TaskStatus::InProgress, TaskAction::Review) => TaskStatus::Reviewed,
        (TaskStatus::Reviewed, TaskAction::Complete) => TaskStatus::Done,
        (current, TaskAction::Reset) if current != TaskStatus::Unseen => TaskStatus::Unseen,
        _ => return Err(InvalidTransition { status, action }),
    };

    Ok(Transition {
        new_status,
        clear_reminder: new_status == TaskStatus::Done,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [TaskStatus; 4] = [
        TaskStatus::Unseen,
        TaskStatus::InProgress,
        TaskStatus::Reviewed,
        TaskStatus::Done,
    ];
    const ALL_ACTIONS: [TaskAction; 4] = [
        TaskAction::Take,
        TaskAction::Review,
        TaskAction::Complete,
        TaskAction::Reset,
    ];

    #[test]
    fn test_happy_path_transitions() {
        assert_eq!(
            transition(TaskStatus::Unseen, TaskAction::Take).unwrap(),
            Transition { new_status: TaskStatus::InProgress, clear_reminder: false }
        );
        assert_eq!(
            transition(TaskStatus::InProgress, TaskAction::Review).unwrap(),
            Transition { new_status: TaskStatus::Reviewed, clear_reminder: false }
        );
        assert_eq!(
            transition(TaskStatus::Reviewed, TaskAction::Complete).unwrap(),
            Transition { new_status: TaskStatus::Done, clear_reminder: true }
        );
    }

    #[test]
    fn test_reset_from_any_non_unseen_status() {
        for status in [TaskStatus::InProgress, TaskStatus::Reviewed, TaskStatus::Done] {
            assert_eq!(
                transition(status, TaskAction::Reset).unwrap(),
                Transition { new_status: TaskStatus::Unseen, clear_reminder: false }
            );
        }
        assert!(transition(TaskStatus::Unseen, TaskAction::Reset).is_err());
    }

    #[test]
    fn test_only_done_clears_reminder() {
        for status in ALL_STATUSES {
            for action in ALL_ACTIONS {
                if let Ok(t) = transition(status, action) {
                    assert_eq!(t.clear_reminder, t.new_status == TaskStatus::Done);
                }
            }
        }
    }

    #[test]
    fn test_everything_else_is_invalid() {
        let valid: [(TaskStatus, TaskAction); 6] = [
            (TaskStatus::Unseen, TaskAction::Take),
            (TaskStatus::InProgress, TaskAction::Review),
            (TaskStatus::Reviewed, TaskAction::Complete),
            (TaskStatus::InProgress, TaskAction::Reset),
            (TaskStatus::Reviewed, TaskAction::Reset),
            (TaskStatus::Done, TaskAction::Reset),
        ];

        for status in ALL_STATUSES {
            for action in ALL_ACTIONS {
                let result = transition(status, action);
                if valid.contains(&(status, action)) {
                    assert!(result.is_ok(), "{status:?} + {action:?} should be valid");
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(err.status, status);
                    assert_eq!(err.action, action);
                }
            }
        }
    }

    #[test]
    fn test_available_actions_match_transition_table() {
        for status in ALL_STATUSES {
            for action in ALL_ACTIONS {
                let offered = status.available_actions().contains(&action);
                assert_eq!(
                    offered,
                    transition(status, action).is_ok(),
                    "UI offer and engine disagree on {status:?} + {action:?}"
                );
            }
        }
    }

    #[test]
    fn test_action_round_trip() {
        for action in ALL_ACTIONS {
            assert_eq!(TaskAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(TaskAction::parse("delete"), None);
    }
}
