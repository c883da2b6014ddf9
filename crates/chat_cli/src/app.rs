use std::io::{self, Write};

use chat_backend::ConversationId;
use client_store::Preferences;
use roognis_client::{ChatClient, SessionPhase};

use crate::commands::{parse_slash_command, ConversationRef, SlashCommand, HELP_TEXT};
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented front end over a [`ChatClient`]. Each input line is either a
/// slash command or a prompt; queued notices are printed after every line.
pub struct App {
    client: ChatClient,
    preferences: Preferences,
}

impl App {
    pub fn new(client: ChatClient, preferences: Preferences) -> Self {
        Self {
            client,
            preferences,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Prints the banner and resumes a stored session when there is one.
    pub async fn start(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "roognis ({} backend, {} theme). Type /help for commands.",
            self.client.backend_id(),
            self.preferences.theme()
        )?;
        if let Ok(Some(user)) = self.client.restore_session().await {
            writeln!(out, "{}", render::user(&user))?;
            self.show_directory(out)?;
            self.show_transcript(out)?;
        }
        self.flush_notices(out)
    }

    pub fn write_prompt(&self, out: &mut impl Write) -> io::Result<()> {
        match self.client.phase() {
            SessionPhase::Authenticated => write!(out, "{}> ", self.client.selected_label())?,
            _ => write!(out, "> ")?,
        }
        out.flush()
    }

    pub async fn handle_line(&self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        let flow = match parse_slash_command(line) {
            Some(command) => self.run_command(command, out).await?,
            None => {
                if !line.trim().is_empty() {
                    if let Ok(response) = self.client.send(line).await {
                        writeln!(out, "{}", render::reply(&response))?;
                    }
                }
                Flow::Continue
            }
        };
        self.flush_notices(out)?;
        Ok(flow)
    }

    async fn run_command(&self, command: SlashCommand, out: &mut impl Write) -> io::Result<Flow> {
        match command {
            SlashCommand::Help => writeln!(out, "{HELP_TEXT}")?,
            SlashCommand::Login { username, password } => {
                if let Ok(user) = self.client.login(&username, &password).await {
                    self.signed_in(&user, out)?;
                }
            }
            SlashCommand::Register {
                username,
                email,
                password,
            } => {
                if let Ok(user) = self.client.register(&username, &email, &password).await {
                    self.signed_in(&user, out)?;
                }
            }
            SlashCommand::Logout => {
                self.client.logout();
                writeln!(out, "Signed out.")?;
            }
            SlashCommand::List => {
                if self.client.refresh_conversations().await.is_ok() {
                    self.show_directory(out)?;
                }
            }
            SlashCommand::Open(target) => match self.resolve(&target) {
                Some(conversation_id) => {
                    if self
                        .client
                        .select_conversation(Some(conversation_id))
                        .await
                        .is_ok()
                    {
                        self.show_transcript(out)?;
                    }
                }
                None => writeln!(
                    out,
                    "No conversation matches '{}'. Try /list.",
                    describe(&target)
                )?,
            },
            SlashCommand::New => {
                if self.client.select_conversation(None).await.is_ok() {
                    writeln!(out, "Started a new conversation.")?;
                }
            }
            SlashCommand::Reload => {
                if self.client.load_history().await.is_ok() {
                    self.show_transcript(out)?;
                }
            }
            SlashCommand::Model(model) => {
                if let Some(model) = model {
                    self.client.set_model(&model);
                }
                writeln!(out, "Model: {}", self.client.settings().model())?;
            }
            SlashCommand::Temperature(temperature) => {
                if let Some(temperature) = temperature {
                    self.client.set_temperature(temperature);
                }
                writeln!(out, "Temperature: {:.2}", self.client.settings().temperature())?;
            }
            SlashCommand::MaxTokens(max_tokens) => {
                if let Some(max_tokens) = max_tokens {
                    self.client.set_max_tokens(max_tokens);
                }
                writeln!(out, "Max tokens: {}", self.client.settings().max_tokens())?;
            }
            SlashCommand::Theme(theme) => {
                let theme = theme.unwrap_or_else(|| self.preferences.theme().toggled());
                self.preferences.set_theme(theme);
                writeln!(out, "Theme: {theme}")?;
            }
            SlashCommand::Prefs => {
                writeln!(out, "Theme: {}", self.preferences.theme())?;
                writeln!(out, "Sidebar width: {}", self.preferences.sidebar_width())?;
                writeln!(
                    out,
                    "Sidebar collapsed: {}",
                    if self.preferences.sidebar_collapsed() { "yes" } else { "no" }
                )?;
            }
            SlashCommand::Health => {
                if let Ok(report) = self.client.health().await {
                    writeln!(out, "{}", render::health(&report))?;
                }
            }
            SlashCommand::Quit => return Ok(Flow::Quit),
            SlashCommand::Usage(usage) => writeln!(out, "Usage: {usage}")?,
            SlashCommand::Unknown(command) => {
                writeln!(out, "Unknown command {command}. Type /help for commands.")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn signed_in(&self, user: &chat_backend::User, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", render::user(user))?;
        self.show_directory(out)?;
        self.show_transcript(out)
    }

    fn resolve(&self, target: &ConversationRef) -> Option<ConversationId> {
        let conversations = self.client.conversations();
        match target {
            ConversationRef::Index(index) => index
                .checked_sub(1)
                .and_then(|index| conversations.get(index))
                .map(|conversation| conversation.id),
            ConversationRef::Id(prefix) => {
                let mut matches = conversations.iter().filter(|conversation| {
                    conversation.id.to_string().starts_with(prefix.as_str())
                });
                match (matches.next(), matches.next()) {
                    (Some(conversation), None) => Some(conversation.id),
                    _ => None,
                }
            }
        }
    }

    fn show_directory(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "{}",
            render::conversations(
                &self.client.conversations(),
                self.client.selected_conversation()
            )
        )
    }

    fn show_transcript(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "{}",
            render::transcript(&self.client.selected_label(), &self.client.transcript())
        )
    }

    fn flush_notices(&self, out: &mut impl Write) -> io::Result<()> {
        for notice in self.client.drain_notices() {
            writeln!(out, "{}", render::notice(&notice))?;
        }
        Ok(())
    }
}

fn describe(target: &ConversationRef) -> String {
    match target {
        ConversationRef::Index(index) => index.to_string(),
        ConversationRef::Id(prefix) => prefix.clone(),
    }
}
