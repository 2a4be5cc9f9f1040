//! Installation report shown by `doctor`.

use std::fmt;

use crate::automation::automation_tool;
use crate::config::PluginSettings;
use crate::platform::Platform;
use crate::presence::{PresenceCache, assistant_key};
use crate::terminal::{CUSTOM_TERMINAL_ID, Terminal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRow {
    pub label: String,
    pub executable: String,
    pub installed: bool,
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub assistant: PresenceRow,
    pub terminals: Vec<PresenceRow>,
    /// Keystroke tool; only relevant when the selected terminal is an editor
    pub automation: Option<PresenceRow>,
    pub selected_terminal: String,
    pub selected_known: bool,
}

/// Probe everything the current settings depend on. `refresh` drops cached
/// results first.
pub async fn collect(
    presence: &PresenceCache,
    settings: &PluginSettings,
    platform: Platform,
    refresh: bool,
) -> Diagnostics {
    if refresh {
        presence.clear();
    }

    let key = assistant_key(settings.use_custom_claude_path, &settings.claude_path);
    let assistant = PresenceRow {
        label: "Claude CLI".to_string(),
        installed: presence
            .is_assistant_present(settings.use_custom_claude_path, &settings.claude_path)
            .await,
        executable: key,
    };

    let mut terminals = Vec::new();
    for terminal in Terminal::for_platform(platform) {
        terminals.push(PresenceRow {
            label: format!("{} ({})", terminal.display_name(), terminal.id()),
            executable: terminal.probe_executable().to_string(),
            installed: presence.is_present(terminal.probe_executable()).await,
        });
    }

    let selected = Terminal::from_id(&settings.terminal);
    let automation = match selected {
        Some(t) if t.needs_secondary_automation() => {
            let tool = automation_tool(platform);
            Some(PresenceRow {
                label: "Keystroke automation".to_string(),
                executable: tool.to_string(),
                installed: presence.is_present(tool).await,
            })
        }
        _ => None,
    };

    Diagnostics {
        assistant,
        terminals,
        automation,
        selected_terminal: settings.terminal.clone(),
        selected_known: selected.is_some() || settings.terminal == CUSTOM_TERMINAL_ID,
    }
}

impl fmt::Display for PresenceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.installed { "ok " } else { "-- " };
        write!(f, "{mark} {} [{}]", self.label, self.executable)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.assistant)?;
        if let Some(row) = &self.automation {
            writeln!(f, "{row}")?;
        }
        let note = if self.selected_known { "" } else { " (unknown)" };
        writeln!(f, "\nSelected terminal: {}{note}", self.selected_terminal)?;
        writeln!(f, "Terminals:")?;
        for row in &self.terminals {
            writeln!(f, "  {row}")?;
        }
        Ok(())
    }
}
