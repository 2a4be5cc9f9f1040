//! Quoting helpers for the interpreters that launch commands pass through.

/// Quote a string for a POSIX shell: wrap in single quotes, and close,
/// escape and reopen around any embedded single quote.
pub(crate) fn posix(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Quote a string as an AppleScript string literal.
pub(crate) fn applescript(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quote a string as a PowerShell single-quoted literal.
pub(crate) fn powershell(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Escape text for `WScript.Shell.SendKeys`, where `+^%~(){}[]` are
/// modifiers or grouping characters and must be wrapped in braces.
pub(crate) fn sendkeys(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '+' | '^' | '%' | '~' | '(' | ')' | '{' | '}' | '[' | ']' => {
                out.push('{');
                out.push(c);
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    out
}
