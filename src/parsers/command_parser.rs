/// A Telegram text message classified by its leading command, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Start,
    /// `/add`, carrying everything after the command.
    Add(Option<String>),
    SetDatabase(Vec<String>),
    SetSecret(Vec<String>),
    /// Relayed as-is; unknown commands land here too.
    PlainText,
    /// A command explicitly addressed to a different bot.
    ForeignBot,
}

pub fn parse_command(text: &str, bot_username: Option<&str>) -> ParsedCommand {
    let trimmed = text.trim_start();
    let Some(body) = trimmed.strip_prefix('/') else {
        return ParsedCommand::PlainText;
    };

    let (head, rest) = match body.find(char::is_whitespace) {
        Some(idx) => (&body[..idx], body[idx..].trim()),
        None => (body, ""),
    };
    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (head, None),
    };

    if let (Some(mention), Some(username)) = (mention, bot_username) {
        if !mention.eq_ignore_ascii_case(username) {
            return ParsedCommand::ForeignBot;
        }
    }

    match name.to_ascii_lowercase().as_str() {
        "start" => ParsedCommand::Start,
        "add" => ParsedCommand::Add((!rest.is_empty()).then(|| rest.to_string())),
        "setdb" => ParsedCommand::SetDatabase(split_args(rest)),
        "setsecret" => ParsedCommand::SetSecret(split_args(rest)),
        _ => ParsedCommand::PlainText,
    }
}

fn split_args(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}

/// Returns the single argument of a command, or `None` for any other count.
pub fn single_arg(args: &[String]) -> Option<&str> {
    match args {
        [only] => Some(only.as_str()),
        _ => None,
    }
}
