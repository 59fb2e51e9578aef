//! Conversation state carried between invocations.
//!
//! Each successful run leaves the full message list and the parameters it
//! was resolved with in `session.json`, so a later call without a command
//! selector can pick the conversation up where it stopped.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Author of a message, serialized the way chat-completion APIs expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Highest sampling temperature chat-completion APIs accept.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Parses a sampling temperature, accepting finite values from 0 to [`MAX_TEMPERATURE`].
pub fn parse_temperature(value: &str) -> Result<f32, String> {
    let temperature: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    check_temperature(temperature)?;
    Ok(temperature)
}

fn check_temperature(temperature: f32) -> Result<(), String> {
    if temperature.is_finite() && (0.0..=MAX_TEMPERATURE).contains(&temperature) {
        Ok(())
    } else {
        Err(format!(
            "temperature must be between 0 and {}, got {}",
            MAX_TEMPERATURE, temperature
        ))
    }
}

/// Model parameters resolved for a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Per-invocation overrides from the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ModelParams {
    /// Applies any overrides that were given, leaving the rest untouched.
    pub fn apply(&mut self, overrides: &ParamOverrides) {
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = max_tokens;
        }
    }

    /// Rejects parameters the API would refuse, or that would not survive a
    /// round trip through `session.json`.
    pub fn validate(&self) -> Result<()> {
        if let Err(message) = check_temperature(self.temperature) {
            bail!(message);
        }
        if self.model.trim().is_empty() {
            bail!("model name must not be empty");
        }
        Ok(())
    }
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Name of the command-table entry that started the conversation.
    pub command: String,
    pub params: ModelParams,
    pub messages: Vec<Message>,
}

impl Session {
    pub fn start(command: &str, params: ModelParams, messages: Vec<Message>) -> Self {
        Self {
            command: command.to_string(),
            params,
            messages,
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Number of user turns in the conversation.
    pub fn exchanges(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }

    /// Removes the trailing user/assistant pair so the next user message
    /// replaces it. The first exchange is never removed.
    pub fn drop_last_exchange(&mut self) -> bool {
        if self.exchanges() < 2 {
            return false;
        }

        let Some(last_user) = self.messages.iter().rposition(|m| m.role == Role::User) else {
            return false;
        };
        self.messages.truncate(last_user);
        debug!("Dropped last exchange, {} messages remain", self.messages.len());
        true
    }

    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// Reads and writes the session file.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted at the user's config directory.
    pub fn default_location() -> Result<Self> {
        let dir = crate::config::Config::config_dir()?;
        Ok(Self::new(dir.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)?;
        debug!("Loaded session '{}' with {} messages", session.command, session.messages.len());
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;
        info!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("Removed session file {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn params() -> ModelParams {
        ModelParams {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 256,
        }
    }

    fn conversation(turns: usize) -> Session {
        let mut session = Session::start("chat", params(), vec![Message::system("be brief")]);
        for i in 0..turns {
            session.push_user(format!("question {}", i));
            session.push_assistant(format!("answer {}", i));
        }
        session
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_exchanges_counts_user_messages() {
        assert_eq!(conversation(0).exchanges(), 0);
        assert_eq!(conversation(3).exchanges(), 3);
    }

    #[test]
    fn test_drop_last_exchange_removes_trailing_pair() {
        let mut session = conversation(2);
        assert!(session.drop_last_exchange());
        assert_eq!(session.exchanges(), 1);
        assert_eq!(session.last_reply(), Some("answer 0"));
        assert_eq!(session.messages.len(), 3);
    }

    #[test]
    fn test_drop_last_exchange_keeps_first_exchange() {
        let mut session = conversation(1);
        assert!(!session.drop_last_exchange());
        assert_eq!(session.messages.len(), 3);
    }

    #[test]
    fn test_drop_last_exchange_without_reply() {
        let mut session = conversation(1);
        session.push_user("dangling");
        assert!(session.drop_last_exchange());
        assert_eq!(session.messages.last().unwrap().content, "answer 0");
    }

    #[test]
    fn test_apply_overrides_only_touches_given_fields() {
        let mut p = params();
        p.apply(&ParamOverrides {
            temperature: Some(0.9),
            ..ParamOverrides::default()
        });
        assert_eq!(p.model, "gpt-4o-mini");
        assert_eq!(p.temperature, 0.9);
        assert_eq!(p.max_tokens, 256);
    }

    #[test]
    fn test_parse_temperature_accepts_range() {
        assert_eq!(parse_temperature("0"), Ok(0.0));
        assert_eq!(parse_temperature("0.7"), Ok(0.7));
        assert_eq!(parse_temperature("2"), Ok(2.0));
    }

    #[test]
    fn test_parse_temperature_rejects_non_finite_and_out_of_range() {
        for value in ["NaN", "inf", "-inf", "2.5", "-0.1", "warm"] {
            assert!(parse_temperature(value).is_err(), "accepted {}", value);
        }
    }

    #[test]
    fn test_validate_rejects_nan_temperature() {
        let mut p = params();
        assert!(p.validate().is_ok());

        p.temperature = f32::NAN;
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_store_load_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_store_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        let session = conversation(2);

        store.save(&session).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, session);
    }

    #[test]
    fn test_store_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&conversation(1)).unwrap();

        store.clear().unwrap();

        assert!(!store.path().exists());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        assert!(SessionStore::new(path).load().is_err());
    }
}
