//! Builds the assistant invocation from the user's launch options.
//!
//! The output is a single command-line string that gets typed or passed into
//! a terminal, so flag order is fixed and every option maps to at most one
//! flag. Values are not validated: whatever the user configured is passed
//! through as literal text.

use serde::{Deserialize, Serialize};

/// Executable token used when no override path is configured.
pub(crate) const DEFAULT_EXECUTABLE: &str = "claude";

/// `max_turns` value that the assistant already assumes; no flag is emitted for it.
pub(crate) const DEFAULT_MAX_TURNS: i64 = 10;

/// Model name meaning "let the assistant pick".
pub(crate) const DEFAULT_MODEL: &str = "default";

/// Permission mode passed through `--permission-mode`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    #[default]
    Default,
    AcceptEdits,
    BypassPermissions,
    Plan,
    /// Tool allow/deny lists are only meaningful in this mode
    Custom,
}

impl PermissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::BypassPermissions => "bypassPermissions",
            Self::Plan => "plan",
            Self::Custom => "custom",
        }
    }
}

/// Per-invocation options, derived from the persisted settings.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchOptions {
    pub permission_mode: PermissionMode,
    pub skip_permissions: bool,
    pub allowed_tools: Vec<String>,
    pub denied_tools: Vec<String>,
    pub model: String,
    pub continue_session: bool,
    pub max_turns: i64,
    pub verbose: bool,
    pub additional_directories: Vec<String>,
    pub executable_override: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            permission_mode: PermissionMode::Default,
            skip_permissions: false,
            allowed_tools: Vec::new(),
            denied_tools: Vec::new(),
            model: DEFAULT_MODEL.to_string(),
            continue_session: false,
            max_turns: DEFAULT_MAX_TURNS,
            verbose: false,
            additional_directories: Vec::new(),
            executable_override: None,
        }
    }
}

/// Escape a path for interpolation inside double quotes.
///
/// Only `"` is handled (doubled, as `cmd.exe` expects). Other shell
/// metacharacters such as `&`, `|` or parentheses pass through untouched.
pub fn escape_path(path: &str) -> String {
    path.replace('"', "\"\"")
}

/// Assemble the assistant command line.
pub fn build_command(options: &LaunchOptions) -> String {
    let mut cmd = options
        .executable_override
        .clone()
        .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string());

    if options.permission_mode != PermissionMode::Default {
        cmd.push_str(" --permission-mode ");
        cmd.push_str(options.permission_mode.as_str());
    }
    if options.skip_permissions {
        cmd.push_str(" --dangerously-skip-permissions");
    }
    if !options.allowed_tools.is_empty() {
        cmd.push_str(" --allowedTools ");
        cmd.push_str(&options.allowed_tools.join(","));
    }
    if !options.denied_tools.is_empty() {
        cmd.push_str(" --disallowedTools ");
        cmd.push_str(&options.denied_tools.join(","));
    }
    if options.model != DEFAULT_MODEL {
        cmd.push_str(" --model ");
        cmd.push_str(&options.model);
    }
    if options.continue_session {
        cmd.push_str(" --continue");
    }
    if options.max_turns != DEFAULT_MAX_TURNS {
        cmd.push_str(&format!(" --max-turns {}", options.max_turns));
    }
    if options.verbose {
        cmd.push_str(" --verbose");
    }
    for dir in &options.additional_directories {
        if dir.trim().is_empty() {
            continue;
        }
        cmd.push_str(&format!(" --add-dir \"{}\"", escape_path(dir)));
    }

    cmd
}
