//! API key lookup, prompting and persistence.

use crate::config::Config;
use anyhow::{anyhow, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing::info;

/// Asks the user for an API key on the terminal.
///
/// # Example
///
/// ```no_run
/// use heyllm::credentials::KeyPrompt;
///
/// let key = KeyPrompt::new().prompt("No API key configured")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct KeyPrompt;

impl KeyPrompt {
    pub fn new() -> Self {
        Self
    }

    /// Prompts on stderr and reads from stdin.
    pub fn prompt(&self, reason: &str) -> Result<String> {
        let stdin = io::stdin();
        self.prompt_with_io(reason, &mut stdin.lock(), &mut io::stderr())
    }

    /// Writes `reason` and a prompt to `output`, then reads one line from
    /// `input`. An empty answer or end of input aborts.
    pub fn prompt_with_io<R: BufRead, W: Write>(
        &self,
        reason: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<String> {
        writeln!(output, "{}", reason.yellow())?;
        write!(output, "Enter your OpenAI API key (empty to cancel): ")?;
        output.flush()?;

        let mut line = String::new();
        let read = input.read_line(&mut line)?;
        let key = line.trim();

        if read == 0 || key.is_empty() {
            return Err(anyhow!(
                "No API key provided. Set one with 'hey --set-api-key <key>' or export OPENAI_API_KEY"
            ));
        }

        info!("Read API key from prompt");
        Ok(key.to_string())
    }
}

impl Default for KeyPrompt {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the completion loop gets its API key from.
pub trait Credentials {
    /// The key currently configured, if any.
    fn api_key(&self) -> Option<String>;

    /// Asks the user for a new key.
    fn ask(&mut self, reason: &str) -> Result<String>;

    /// Persists a key that the API accepted.
    fn remember(&mut self, key: &str) -> Result<()>;
}

/// Credentials backed by the config file and the terminal prompt.
pub struct ConfigCredentials {
    config: Config,
    prompt: KeyPrompt,
}

impl ConfigCredentials {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            prompt: KeyPrompt::new(),
        }
    }
}

impl Credentials for ConfigCredentials {
    fn api_key(&self) -> Option<String> {
        self.config.api_key().map(str::to_string)
    }

    fn ask(&mut self, reason: &str) -> Result<String> {
        self.prompt.prompt(reason)
    }

    fn remember(&mut self, key: &str) -> Result<()> {
        self.config.set_api_key(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_reads_trimmed_key() {
        let mut input = Cursor::new("  sk-new-key \n");
        let mut output = Vec::new();

        let key = KeyPrompt::new()
            .prompt_with_io("Key rejected", &mut input, &mut output)
            .unwrap();

        assert_eq!(key, "sk-new-key");
        let shown = String::from_utf8_lossy(&output);
        assert!(shown.contains("Key rejected"));
        assert!(shown.contains("Enter your OpenAI API key"));
    }

    #[test]
    fn test_empty_line_cancels() {
        let mut input = Cursor::new("\n");
        let mut output = Vec::new();

        let err = KeyPrompt::new()
            .prompt_with_io("Missing key", &mut input, &mut output)
            .unwrap_err();

        assert!(err.to_string().contains("No API key provided"));
    }

    #[test]
    fn test_end_of_input_cancels() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();

        assert!(KeyPrompt::new()
            .prompt_with_io("Missing key", &mut input, &mut output)
            .is_err());
    }
}
