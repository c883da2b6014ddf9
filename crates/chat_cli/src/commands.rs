use client_store::Theme;

/// Conversation reference accepted by `/open`: a 1-based position in the
/// last listing, or a (prefix of a) conversation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationRef {
    Index(usize),
    Id(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    Help,
    Login {
        username: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
    Logout,
    List,
    Open(ConversationRef),
    New,
    Reload,
    Model(Option<String>),
    Temperature(Option<f64>),
    MaxTokens(Option<u32>),
    Theme(Option<Theme>),
    Prefs,
    Health,
    Quit,
    /// A known command with missing or malformed arguments.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  /login <username> <password>            sign in
  /register <username> <email> <password> create an account and sign in
  /logout                                 sign out and forget the token
  /list                                   refresh and list conversations
  /open <n|id>                            open a conversation by number or id
  /new                                    start a new conversation
  /reload                                 reload the open conversation
  /model [name]                           show or set the model
  /temp [0.0-1.0]                         show or set the temperature
  /max-tokens [64-4096]                   show or set the token budget
  /theme [light|dark]                     toggle or set the theme
  /prefs                                  show display preferences
  /health                                 check the backend
  /help                                   show this help
  /quit                                   exit
Anything else is sent as a prompt.";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut words = trimmed.split_whitespace();
    let command = words.next().unwrap_or(trimmed).to_string();
    let args: Vec<&str> = words.collect();

    let parsed = match (command.as_str(), args.as_slice()) {
        ("/help", _) => SlashCommand::Help,
        ("/login", [username, password]) => SlashCommand::Login {
            username: (*username).to_string(),
            password: (*password).to_string(),
        },
        ("/login", _) => SlashCommand::Usage("/login <username> <password>"),
        ("/register", [username, email, password]) => SlashCommand::Register {
            username: (*username).to_string(),
            email: (*email).to_string(),
            password: (*password).to_string(),
        },
        ("/register", _) => SlashCommand::Usage("/register <username> <email> <password>"),
        ("/logout", _) => SlashCommand::Logout,
        ("/list", _) => SlashCommand::List,
        ("/open", [target]) => SlashCommand::Open(parse_conversation_ref(target)),
        ("/open", _) => SlashCommand::Usage("/open <n|id>"),
        ("/new", _) => SlashCommand::New,
        ("/reload", _) => SlashCommand::Reload,
        ("/model", []) => SlashCommand::Model(None),
        ("/model", [model]) => SlashCommand::Model(Some((*model).to_string())),
        ("/model", _) => SlashCommand::Usage("/model [name]"),
        ("/temp", []) => SlashCommand::Temperature(None),
        ("/temp", [value]) => match value.parse::<f64>() {
            Ok(value) if value.is_finite() => SlashCommand::Temperature(Some(value)),
            _ => SlashCommand::Usage("/temp [0.0-1.0]"),
        },
        ("/temp", _) => SlashCommand::Usage("/temp [0.0-1.0]"),
        ("/max-tokens", []) => SlashCommand::MaxTokens(None),
        ("/max-tokens", [value]) => match value.parse::<u32>() {
            Ok(value) => SlashCommand::MaxTokens(Some(value)),
            Err(_) => SlashCommand::Usage("/max-tokens [64-4096]"),
        },
        ("/max-tokens", _) => SlashCommand::Usage("/max-tokens [64-4096]"),
        ("/theme", []) => SlashCommand::Theme(None),
        ("/theme", [value]) => match value.parse::<Theme>() {
            Ok(theme) => SlashCommand::Theme(Some(theme)),
            Err(_) => SlashCommand::Usage("/theme [light|dark]"),
        },
        ("/theme", _) => SlashCommand::Usage("/theme [light|dark]"),
        ("/prefs", _) => SlashCommand::Prefs,
        ("/health", _) => SlashCommand::Health,
        ("/quit" | "/exit", _) => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

fn parse_conversation_ref(target: &str) -> ConversationRef {
    match target.parse::<usize>() {
        Ok(index) => ConversationRef::Index(index),
        Err(_) => ConversationRef::Id(target.to_ascii_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use client_store::Theme;

    use super::{parse_slash_command, ConversationRef, SlashCommand};

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("what is 2 + 2?"), None);
        assert_eq!(parse_slash_command("   "), None);
    }

    #[test]
    fn commands_with_arguments_parse() {
        assert_eq!(
            parse_slash_command("  /login alice correctpw "),
            Some(SlashCommand::Login {
                username: "alice".to_string(),
                password: "correctpw".to_string(),
            })
        );
        assert_eq!(
            parse_slash_command("/open 2"),
            Some(SlashCommand::Open(ConversationRef::Index(2)))
        );
        assert_eq!(
            parse_slash_command("/open 4A1E3C52"),
            Some(SlashCommand::Open(ConversationRef::Id("4a1e3c52".to_string())))
        );
        assert_eq!(
            parse_slash_command("/temp 0.25"),
            Some(SlashCommand::Temperature(Some(0.25)))
        );
        assert_eq!(
            parse_slash_command("/theme LIGHT"),
            Some(SlashCommand::Theme(Some(Theme::Light)))
        );
        assert_eq!(parse_slash_command("/model"), Some(SlashCommand::Model(None)));
    }

    #[test]
    fn malformed_arguments_yield_usage() {
        assert_eq!(
            parse_slash_command("/login alice"),
            Some(SlashCommand::Usage("/login <username> <password>"))
        );
        assert_eq!(
            parse_slash_command("/temp warm"),
            Some(SlashCommand::Usage("/temp [0.0-1.0]"))
        );
        assert_eq!(
            parse_slash_command("/max-tokens -5"),
            Some(SlashCommand::Usage("/max-tokens [64-4096]"))
        );
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert_eq!(
            parse_slash_command("/frobnicate now"),
            Some(SlashCommand::Unknown("/frobnicate".to_string()))
        );
    }
}
