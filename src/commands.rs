//! The command table.
//!
//! Every subcommand `hey` understands is a row in [`COMMANDS`]: the model it
//! talks to, its default sampling parameters and the prompt template the
//! user's text is merged into. The CLI flags and the dispatcher are both
//! derived from this table.

use crate::session::{Message, ModelParams};

/// Placeholder replaced by the user's text in a template.
pub const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
    pub model: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system: Option<&'static str>,
    pub template: &'static str,
    /// Strip code fences and wrapping backticks from the reply.
    pub strip_delimiters: bool,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "sh",
        aliases: &["shell", "cmd"],
        summary: "Generate a shell command",
        model: "gpt-4o-mini",
        temperature: 0.0,
        max_tokens: 256,
        system: Some(
            "You translate requests into shell commands. Reply with the command only, on a single line \
             where possible. No explanations, no markdown.",
        ),
        template: "Write a shell command that does the following: {input}",
        strip_delimiters: true,
    },
    CommandSpec {
        name: "code",
        aliases: &["program"],
        summary: "Generate source code",
        model: "gpt-4o",
        temperature: 0.2,
        max_tokens: 1500,
        system: Some(
            "You are an expert programmer. Reply with code only. Keep comments inside the code and \
             do not add prose before or after it.",
        ),
        template: "{input}",
        strip_delimiters: true,
    },
    CommandSpec {
        name: "regex",
        aliases: &["regexp"],
        summary: "Generate a regular expression",
        model: "gpt-4o-mini",
        temperature: 0.0,
        max_tokens: 200,
        system: Some("Reply with a single regular expression and nothing else."),
        template: "Write a regular expression that matches: {input}",
        strip_delimiters: true,
    },
    CommandSpec {
        name: "rephrase",
        aliases: &["reword"],
        summary: "Rephrase text so it reads clearly",
        model: "gpt-4o-mini",
        temperature: 0.7,
        max_tokens: 800,
        system: None,
        template: "Rephrase the following text so it is clear and concise. Keep its meaning and \
                   reply with the rephrased text only.\n\n{input}",
        strip_delimiters: false,
    },
    CommandSpec {
        name: "chat",
        aliases: &["ask"],
        summary: "Talk to the assistant",
        model: "gpt-4o",
        temperature: 0.7,
        max_tokens: 1500,
        system: Some("You are a helpful assistant. Answer concisely."),
        template: "{input}",
        strip_delimiters: false,
    },
];

/// Entry used when a follow-up has no conversation to continue.
pub const DEFAULT_COMMAND: &str = "chat";

impl CommandSpec {
    /// All words that select this entry, name first.
    pub fn selectors(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    /// Mail-merges `input` into the template.
    pub fn render(&self, input: &str) -> String {
        self.template.replace(INPUT_PLACEHOLDER, input)
    }

    /// Messages that open a new conversation for this command.
    pub fn initial_messages(&self, input: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(self.render(input)));
        messages
    }

    pub fn default_params(&self) -> ModelParams {
        ModelParams {
            model: self.model.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Exact, case-insensitive match on a name or alias.
pub fn find_exact(word: &str) -> Option<&'static CommandSpec> {
    let word = word.to_ascii_lowercase();
    COMMANDS.iter().find(|c| c.selectors().any(|s| s == word))
}

/// Entries with a name or alias starting with `word`, each listed once.
/// Words shorter than two characters never match.
pub fn find_by_prefix(word: &str) -> Vec<&'static CommandSpec> {
    if word.chars().count() < 2 {
        return Vec::new();
    }
    let word = word.to_ascii_lowercase();
    COMMANDS
        .iter()
        .filter(|c| c.selectors().any(|s| s.starts_with(&word)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use std::collections::HashSet;

    #[test]
    fn test_selectors_are_unique_across_table() {
        let mut seen = HashSet::new();
        for command in COMMANDS {
            for selector in command.selectors() {
                assert!(seen.insert(selector), "duplicate selector '{}'", selector);
            }
        }
    }

    #[test]
    fn test_every_template_takes_input() {
        for command in COMMANDS {
            assert!(
                command.template.contains(INPUT_PLACEHOLDER),
                "template for '{}' has no placeholder",
                command.name
            );
        }
    }

    #[test]
    fn test_default_command_exists() {
        assert!(find(DEFAULT_COMMAND).is_some());
    }

    #[test]
    fn test_render_substitutes_input() {
        let sh = find("sh").unwrap();
        assert_eq!(
            sh.render("list files by size"),
            "Write a shell command that does the following: list files by size"
        );
    }

    #[test]
    fn test_render_leaves_other_braces() {
        let code = find("code").unwrap();
        assert_eq!(code.render("fn main() {}"), "fn main() {}");
    }

    #[test]
    fn test_initial_messages_with_system_prompt() {
        let messages = find("regex").unwrap().initial_messages("ipv4 addresses");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.ends_with("ipv4 addresses"));
    }

    #[test]
    fn test_initial_messages_without_system_prompt() {
        let messages = find("rephrase").unwrap().initial_messages("me want food");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.ends_with("me want food"));
    }

    #[test]
    fn test_find_exact_matches_aliases_case_insensitively() {
        assert_eq!(find_exact("Shell").unwrap().name, "sh");
        assert_eq!(find_exact("REGEXP").unwrap().name, "regex");
        assert!(find_exact("re").is_none());
        assert!(find_exact("sha").is_none());
    }

    #[test]
    fn test_find_by_prefix() {
        let names: Vec<_> = find_by_prefix("reg").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["regex"]);

        let names: Vec<_> = find_by_prefix("ch").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["chat"]);

        let names: Vec<_> = find_by_prefix("rew").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["rephrase"]);

        let names: Vec<_> = find_by_prefix("prog").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["code"]);

        assert!(find_by_prefix("r").is_empty());
        assert!(find_by_prefix("zz").is_empty());
    }

    #[test]
    fn test_find_by_prefix_reports_every_candidate() {
        // "reg" hits both "regex" and its alias "regexp"
        assert_eq!(find_by_prefix("reg").len(), 1);
        assert_eq!(find_by_prefix("rep").len(), 1);
        let names: Vec<_> = find_by_prefix("re").iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["regex", "rephrase"]);
    }
}
