use crate::{
    models::{InboundMessage, Reply},
    services::{
        formatter::{ReplyFormatter, GREETING},
        lookup::DramaFinder,
    },
};

/// What an inbound text asks the bot to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// Any other `/command`; ignored
    Unknown(String),
    /// Plain text, looked up as a title
    Search(String),
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        let Some(rest) = text.strip_prefix('/') else {
            return Command::Search(text.to_string());
        };

        // `/start@SomeBot args` addresses the bot explicitly in group chats
        let word = rest.split_whitespace().next().unwrap_or_default();
        let name = word.split('@').next().unwrap_or_default();

        match name {
            "start" => Command::Start,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Routes one inbound message to its reply. `None` means no reply is sent.
pub async fn handle_message(
    finder: &dyn DramaFinder,
    formatter: &ReplyFormatter,
    message: &InboundMessage,
) -> Option<Reply> {
    let user = message.user.display_name.as_str();

    match Command::parse(&message.text) {
        Command::Start => {
            tracing::info!(user = %user, "Bot started by user");
            Some(Reply::plain(GREETING))
        }
        Command::Unknown(name) => {
            tracing::debug!(user = %user, command = %name, "Ignoring unknown command");
            None
        }
        Command::Search(query) => {
            tracing::info!(user = %user, query = %query, "User searched for drama");
            // Failures are logged where they happen, with their cause
            let result = finder.find(&query).await;
            Some(Reply::markdown(formatter.format_lookup(&result, user)))
        }
    }
}
