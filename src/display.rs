//! Terminal output.

use crate::commands::{CommandSpec, COMMANDS};
use crate::session::{Role, Session};
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

/// Prints a reply. Shell, code and regex output is highlighted so it stands
/// out from log lines; prose is printed as-is.
pub fn print_reply<W: Write>(command: &CommandSpec, text: &str, output: &mut W) -> Result<()> {
    if command.strip_delimiters {
        writeln!(output, "{}", text.bright_green())?;
    } else {
        writeln!(output, "{}", text)?;
    }
    Ok(())
}

pub fn print_session<W: Write>(session: &Session, output: &mut W) -> Result<()> {
    writeln!(
        output,
        "{} {} ({}, temperature {}, max tokens {})",
        "Conversation:".bold(),
        session.command,
        session.params.model,
        session.params.temperature,
        session.params.max_tokens
    )?;

    for message in &session.messages {
        let tag = match message.role {
            Role::System => "system".dimmed(),
            Role::User => "you".cyan().bold(),
            Role::Assistant => "assistant".green().bold(),
        };
        writeln!(output)?;
        writeln!(output, "{}", tag)?;
        writeln!(output, "{}", message.content)?;
    }
    Ok(())
}

pub fn print_command_table<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "{}", "Commands:".bold())?;
    for command in COMMANDS {
        let aliases = if command.aliases.is_empty() {
            String::new()
        } else {
            format!(" ({})", command.aliases.join(", "))
        };
        // pad before colouring, escape codes would count towards the width
        let name = format!("{:<10}", command.name);
        writeln!(
            output,
            "  {}{:<20}{:<14}{}",
            name.green(),
            aliases,
            command.model,
            command.summary
        )?;
    }
    writeln!(output)?;
    writeln!(output, "Without a command, the text continues the last conversation.")?;
    Ok(())
}
