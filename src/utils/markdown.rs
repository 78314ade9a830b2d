/// Telegram MarkdownV2 requires every special character to be escaped when it
/// should render as literal text.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|'
                | '{' | '}' | '.' | '!'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown_specials() {
        assert_eq!(escape_markdown("Hello *world* (test)"), "Hello \\*world\\* \\(test\\)");
        assert_eq!(escape_markdown("due 2025-07-15."), "due 2025\\-07\\-15\\.");
    }

    #[test]
    fn test_escape_markdown_plain_text_untouched() {
        assert_eq!(escape_markdown("Jane Doe"), "Jane Doe");
        assert_eq!(escape_markdown(""), "");
    }
}
