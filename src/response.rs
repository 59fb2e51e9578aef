//! Cleanup of model replies before they are printed or copied.

/// Removes delimiter formatting that wraps the whole reply: a single fenced
/// code block (with or without a language tag) or a pair of backticks.
/// Anything that is not wrapped end to end is only whitespace-trimmed.
pub fn trim_delimiters(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(body) = strip_fence(trimmed) {
        return body.trim_matches('\n').trim_end().to_string();
    }

    if let Some(inner) = strip_backticks(trimmed) {
        return inner.to_string();
    }

    trimmed.to_string()
}

fn strip_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    let inner = rest.strip_suffix("```")?;

    // the opening line holds at most a language tag
    let (info, body) = inner.split_once('\n')?;
    if info.trim().contains(char::is_whitespace) {
        return None;
    }

    // a second fence means several blocks, leave them alone
    if body.contains("\n```") || body.starts_with("```") {
        return None;
    }
    Some(body)
}

fn strip_backticks(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('`')?.strip_suffix('`')?;
    if inner.is_empty() || inner.contains('`') || inner.contains('\n') {
        return None;
    }
    Some(inner)
}
