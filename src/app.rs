use crate::{
    clipboard::{Clipboard, SystemClipboard},
    commands::{self, CommandSpec, DEFAULT_COMMAND},
    completion::{ChatCompleter, ChatRequest, CompletionError, MockCompleter, OpenAiCompleter},
    config::Config,
    credentials::{ConfigCredentials, Credentials},
    dispatch::Invocation,
    display,
    response::trim_delimiters,
    session::{ParamOverrides, Session, SessionStore},
};
use anyhow::{anyhow, Result};
use std::io::Write;
use tracing::{debug, info, warn};

/// Options that shape a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Replace the previous exchange instead of appending after it.
    pub overwrite: bool,
    pub overrides: ParamOverrides,
    pub copy: bool,
}

/// The conversation about to be sent, and the table entry that governs how
/// its reply is presented.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub command: &'static CommandSpec,
    pub session: Session,
}

/// Builds the conversation for `invocation` on top of the stored session.
///
/// Fails when the resolved parameters could not be sent or saved, so a bad
/// override never reaches `session.json`.
pub fn plan(invocation: Invocation, stored: Option<Session>, options: &RunOptions) -> Result<Plan> {
    let plan = match invocation {
        Invocation::Start { command, text } => fresh(command, &text, &options.overrides),
        Invocation::FollowUp { text } => match stored {
            None => {
                info!("No conversation to continue, starting a new '{}'", DEFAULT_COMMAND);
                fresh(default_command()?, &text, &options.overrides)
            }
            Some(session) => continue_session(session, &text, options)?,
        },
    };
    plan.session.params.validate()?;
    Ok(plan)
}

fn default_command() -> Result<&'static CommandSpec> {
    commands::find(DEFAULT_COMMAND)
        .ok_or_else(|| anyhow!("default command '{}' is missing", DEFAULT_COMMAND))
}

fn fresh(command: &'static CommandSpec, text: &str, overrides: &ParamOverrides) -> Plan {
    let mut params = command.default_params();
    params.apply(overrides);
    Plan {
        command,
        session: Session::start(command.name, params, command.initial_messages(text)),
    }
}

fn continue_session(mut session: Session, text: &str, options: &RunOptions) -> Result<Plan> {
    let command = match commands::find(&session.command) {
        Some(command) => command,
        None => {
            warn!(
                "Stored command '{}' is unknown, presenting replies as '{}'",
                session.command, DEFAULT_COMMAND
            );
            default_command()?
        }
    };

    session.params.apply(&options.overrides);

    if options.overwrite && !session.drop_last_exchange() {
        info!("Only the opening exchange exists, restarting '{}' with new text", session.command);
        session.messages = command.initial_messages(text);
    } else {
        session.push_user(text);
    }

    debug!("Continuing '{}' at exchange {}", session.command, session.exchanges());
    Ok(Plan { command, session })
}

pub struct App {
    completer: Box<dyn ChatCompleter>,
    credentials: Box<dyn Credentials>,
    clipboard: Box<dyn Clipboard>,
    store: SessionStore,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let completer: Box<dyn ChatCompleter> = if config.is_mock_mode() {
            Box::new(MockCompleter)
        } else {
            Box::new(OpenAiCompleter::new(&config.base_url))
        };

        Ok(Self::with_parts(
            completer,
            Box::new(ConfigCredentials::new(config)),
            Box::new(SystemClipboard::new()),
            SessionStore::default_location()?,
        ))
    }

    pub fn with_parts(
        completer: Box<dyn ChatCompleter>,
        credentials: Box<dyn Credentials>,
        clipboard: Box<dyn Clipboard>,
        store: SessionStore,
    ) -> Self {
        Self {
            completer,
            credentials,
            clipboard,
            store,
        }
    }

    pub async fn run(&mut self, invocation: Invocation, options: &RunOptions) -> Result<()> {
        self.run_with_output(invocation, options, &mut std::io::stdout()).await
    }

    /// Sends one request and records the reply.
    pub async fn run_with_output<W: Write>(
        &mut self,
        invocation: Invocation,
        options: &RunOptions,
        output: &mut W,
    ) -> Result<()> {
        let stored = match &invocation {
            Invocation::FollowUp { .. } => self.store.load()?,
            Invocation::Start { .. } => None,
        };
        let Plan { command, mut session } = plan(invocation, stored, options)?;

        let request = ChatRequest::new(&session.params, &session.messages);
        let reply = self.complete_with_auth(&request).await?;

        session.push_assistant(reply.clone());
        self.store.save(&session)?;

        let text = if command.strip_delimiters {
            trim_delimiters(&reply)
        } else {
            reply.trim().to_string()
        };
        display::print_reply(command, &text, output)?;

        if options.copy {
            match self.clipboard.copy(&text) {
                Ok(()) => debug!("Copied reply to clipboard"),
                Err(e) => warn!("Could not copy to clipboard: {}", e),
            }
        }
        Ok(())
    }

    /// Runs the completion, asking for a new key while the API rejects the
    /// current one. A key typed at the prompt is saved once it works.
    async fn complete_with_auth(&mut self, request: &ChatRequest) -> Result<String> {
        if !self.completer.requires_key() {
            return Ok(self.completer.complete("", request).await?);
        }

        let mut fresh_key = None;
        let mut key = match self.credentials.api_key() {
            Some(key) => key,
            None => {
                let key = self.credentials.ask("No API key is configured.")?;
                fresh_key = Some(key.clone());
                key
            }
        };

        loop {
            match self.completer.complete(&key, request).await {
                Ok(reply) => {
                    if let Some(accepted) = fresh_key {
                        self.credentials.remember(&accepted)?;
                    }
                    return Ok(reply);
                }
                Err(CompletionError::Unauthorized) => {
                    warn!("API key rejected, asking for a new one");
                    key = self.credentials.ask("The API key was rejected.")?;
                    fresh_key = Some(key.clone());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn show_session<W: Write>(&self, output: &mut W) -> Result<()> {
        match self.store.load()? {
            Some(session) => display::print_session(&session, output),
            None => {
                writeln!(output, "No conversation stored.")?;
                Ok(())
            }
        }
    }

    pub fn reset_session(&self) -> Result<()> {
        self.store.clear()
    }
}
