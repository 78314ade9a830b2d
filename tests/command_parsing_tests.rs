use practice_tracker_bot::bot::commands::Command;
use teloxide::utils::command::BotCommands;

#[test]
fn test_help_command_parsing() {
    let result = Command::parse("/help", "trackerbot");
    assert!(result.is_ok());
    assert!(matches!(result.unwrap(), Command::Help));
}

#[test]
fn test_start_command_parsing() {
    let result = Command::parse("/start", "trackerbot");
    assert!(result.is_ok());
    assert!(matches!(result.unwrap(), Command::Start));
}

#[test]
fn test_tasks_command_parsing() {
    let result = Command::parse("/tasks", "trackerbot");
    assert!(result.is_ok());
    assert!(matches!(result.unwrap(), Command::Tasks));
}

#[test]
fn test_admin_command_parsing() {
    let result = Command::parse("/admin", "trackerbot");
    assert!(result.is_ok());
    assert!(matches!(result.unwrap(), Command::Admin));
}

#[test]
fn test_command_with_bot_mention() {
    let result = Command::parse("/tasks@trackerbot", "trackerbot");
    assert!(result.is_ok());
    assert!(matches!(result.unwrap(), Command::Tasks));
}

#[test]
fn test_unknown_command_is_rejected() {
    assert!(Command::parse("/schedule", "trackerbot").is_err());
    assert!(Command::parse("not a command", "trackerbot").is_err());
}
