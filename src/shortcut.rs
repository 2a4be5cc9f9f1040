//! Keyboard shortcut strings such as `Mod+Shift+C`.
//!
//! The host registers the shortcut; this module only validates what the
//! user typed and rewrites it in canonical form (modifiers in a fixed order,
//! canonical capitalization, single-letter keys upper-cased).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    /// Cmd on macOS, Ctrl elsewhere
    Mod,
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "mod" | "cmdorctrl" | "commandorcontrol" => Some(Self::Mod),
            "ctrl" | "control" => Some(Self::Ctrl),
            "alt" | "option" | "opt" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            "meta" | "cmd" | "command" | "super" | "win" => Some(Self::Meta),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Mod => "Mod",
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Meta => "Meta",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl Shortcut {
    /// Parse `Mod+Shift+C`-style input. At least one modifier and exactly
    /// one non-modifier key are required.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut modifiers = Vec::new();
        let mut key: Option<String> = None;

        for raw in input.split('+') {
            let token = raw.trim();
            if token.is_empty() {
                return Err(format!("Empty key in shortcut \"{input}\""));
            }
            if let Some(m) = Modifier::parse(token) {
                if !modifiers.contains(&m) {
                    modifiers.push(m);
                }
                continue;
            }
            if key.is_some() {
                return Err(format!("Shortcut \"{input}\" has more than one key"));
            }
            key = Some(normalize_key(token));
        }

        let key = key.ok_or_else(|| format!("Shortcut \"{input}\" has no key"))?;
        if modifiers.is_empty() {
            return Err(format!("Shortcut \"{input}\" needs at least one modifier"));
        }
        modifiers.sort();
        Ok(Self { modifiers, key })
    }
}

fn normalize_key(token: &str) -> String {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_ascii_uppercase().to_string(),
        _ => {
            let lower = token.to_ascii_lowercase();
            let mut out = String::with_capacity(lower.len());
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.extend(chars);
            }
            out
        }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{}+", m.as_str())?;
        }
        f.write_str(&self.key)
    }
}
