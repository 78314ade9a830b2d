use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Practice Tracker Bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot and register")]
    Start,
    #[command(description = "Show your tasks")]
    Tasks,
    #[command(description = "Open the admin panel")]
    Admin,
}
