use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::automation::clamp_delay_ms;
use crate::command::{DEFAULT_MAX_TURNS, DEFAULT_MODEL, LaunchOptions, PermissionMode};
use crate::platform::Platform;
use crate::shortcut::Shortcut;
use crate::terminal::Terminal;

pub(crate) const SETTINGS_FILE: &str = "settings.json";

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/claude-launcher/`
/// - Linux: `~/.config/claude-launcher/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/claude-launcher/`
///
/// Falls back to `~/.claude-launcher/` if platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("claude-launcher"))
        .unwrap_or_else(legacy_dotdir)
}

/// Fallback config directory: ~/.claude-launcher/
fn legacy_dotdir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude-launcher")
}

pub fn settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE)
}

// ---------------------------------------------------------------------------
// PluginSettings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Terminal id from the dispatch table, or "custom"
    pub terminal: String,
    /// Template used when `terminal` is "custom"; `{{cwd}}` and `{{claude}}` are substituted
    pub custom_command: String,
    /// Path to the Claude executable, used when `use_custom_claude_path` is set
    #[serde(default)]
    pub claude_path: String,
    #[serde(default)]
    pub use_custom_claude_path: bool,
    /// Replaces the detected workspace root when `use_root_path_override` is set
    #[serde(default)]
    pub root_path_override: String,
    #[serde(default)]
    pub use_root_path_override: bool,
    /// Ignore the active document and always start in the root
    #[serde(default)]
    pub always_open_root: bool,
    /// Global shortcut in `Mod+Shift+C` form; empty disables it
    #[serde(default = "default_keyboard_shortcut")]
    pub keyboard_shortcut: String,
    /// Delay before typing into an editor's terminal (null = terminal default)
    #[serde(default)]
    pub automation_delay_ms: Option<u64>,
    /// Show the resolved directory and command after each launch
    #[serde(default)]
    pub show_debug_info: bool,

    // -- Claude CLI flags --
    #[serde(default)]
    pub permission_mode: PermissionMode,
    #[serde(default)]
    pub skip_permissions: bool,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub denied_tools: Vec<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub continue_session: bool,
    #[serde(default = "default_max_turns")]
    pub max_turns: i64,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub additional_directories: Vec<String>,
}

fn default_keyboard_shortcut() -> String {
    "Mod+Shift+C".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_turns() -> i64 {
    DEFAULT_MAX_TURNS
}

/// Starter template for the "custom" terminal on each platform.
pub fn default_custom_command(platform: Platform) -> String {
    match platform {
        Platform::Windows => r#"cmd /c "start cmd /k \"cd /d {{cwd}} && {{claude}}\"""#.to_string(),
        Platform::MacOs => {
            r#"osascript -e 'tell application "Terminal" to do script "cd \"{{cwd}}\" && {{claude}}"'"#
                .to_string()
        }
        Platform::Linux => {
            r#"x-terminal-emulator -e bash -c "cd '{{cwd}}' && {{claude}}; exec bash""#.to_string()
        }
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self::defaults_for(Platform::current())
    }
}

impl PluginSettings {
    pub fn defaults_for(platform: Platform) -> Self {
        Self {
            terminal: Terminal::default_for(platform).id().to_string(),
            custom_command: default_custom_command(platform),
            claude_path: String::new(),
            use_custom_claude_path: false,
            root_path_override: String::new(),
            use_root_path_override: false,
            always_open_root: false,
            keyboard_shortcut: default_keyboard_shortcut(),
            automation_delay_ms: None,
            show_debug_info: false,
            permission_mode: PermissionMode::Default,
            skip_permissions: false,
            allowed_tools: Vec::new(),
            denied_tools: Vec::new(),
            model: default_model(),
            continue_session: false,
            max_turns: default_max_turns(),
            verbose: false,
            additional_directories: Vec::new(),
        }
    }

    /// The executable override, if enabled and non-blank.
    pub fn executable_override(&self) -> Option<String> {
        let path = self.claude_path.trim();
        (self.use_custom_claude_path && !path.is_empty()).then(|| path.to_string())
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            permission_mode: self.permission_mode,
            skip_permissions: self.skip_permissions,
            allowed_tools: self.allowed_tools.clone(),
            denied_tools: self.denied_tools.clone(),
            model: self.model.clone(),
            continue_session: self.continue_session,
            max_turns: self.max_turns,
            verbose: self.verbose,
            additional_directories: self.additional_directories.clone(),
            executable_override: self.executable_override(),
        }
    }

    /// Delay before the automation step for `terminal`.
    pub fn automation_delay(&self, terminal: Terminal) -> Duration {
        let ms = self
            .automation_delay_ms
            .map(clamp_delay_ms)
            .unwrap_or_else(|| terminal.default_automation_delay_ms());
        Duration::from_millis(ms)
    }
}

// ---------------------------------------------------------------------------
// Merge over defaults
// ---------------------------------------------------------------------------

/// Result of merging stored settings over defaults.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub settings: PluginSettings,
    /// Stored keys whose value had the wrong shape and were replaced by the default
    pub rejected: Vec<String>,
    /// Stored keys that no setting corresponds to
    pub unknown: Vec<String>,
}

/// Overlay `stored` onto `defaults` field by field. A stored field wins only
/// when it deserializes into the field's type; anything else keeps the
/// default and is listed in `rejected`.
pub fn merge_settings(defaults: &PluginSettings, stored: &Value) -> MergeOutcome {
    let mut outcome = MergeOutcome {
        settings: defaults.clone(),
        rejected: Vec::new(),
        unknown: Vec::new(),
    };

    let Ok(Value::Object(mut effective)) = serde_json::to_value(defaults) else {
        return outcome;
    };
    let Value::Object(stored) = stored else {
        outcome.rejected.push("<root>".to_string());
        return outcome;
    };

    for (key, value) in stored {
        if !effective.contains_key(key) {
            outcome.unknown.push(key.clone());
            continue;
        }
        let mut candidate: Map<String, Value> = effective.clone();
        candidate.insert(key.clone(), value.clone());
        if serde_json::from_value::<PluginSettings>(Value::Object(candidate)).is_ok() {
            effective.insert(key.clone(), value.clone());
        } else {
            outcome.rejected.push(key.clone());
        }
    }

    let Ok(mut settings) = serde_json::from_value::<PluginSettings>(Value::Object(effective)) else {
        return outcome;
    };

    settings.automation_delay_ms = settings.automation_delay_ms.map(clamp_delay_ms);
    if !settings.keyboard_shortcut.trim().is_empty() {
        match Shortcut::parse(&settings.keyboard_shortcut) {
            Ok(shortcut) => settings.keyboard_shortcut = shortcut.to_string(),
            Err(_) => {
                outcome.rejected.push("keyboard_shortcut".to_string());
                settings.keyboard_shortcut = defaults.keyboard_shortcut.clone();
            }
        }
    }

    outcome.settings = settings;
    outcome
}

/// Set one field from user input. `raw` is read as JSON when it parses,
/// otherwise as a plain string, so `true`, `25` and `["Read"]` work as
/// expected and `opus` needs no quoting.
pub fn apply_setting(current: &PluginSettings, key: &str, raw: &str) -> Result<PluginSettings, String> {
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let mut patch = Map::new();
    patch.insert(key.to_string(), value);

    let outcome = merge_settings(current, &Value::Object(patch));
    if !outcome.unknown.is_empty() {
        return Err(format!("Unknown setting: {key}"));
    }
    if !outcome.rejected.is_empty() {
        return Err(format!("Invalid value for {key}: {raw}"));
    }
    Ok(outcome.settings)
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Load settings from `path`, merged over platform defaults. A missing file
/// yields defaults; unreadable or corrupt files are logged and also yield
/// defaults, so a bad file never blocks a launch.
pub fn load_settings_from(path: &Path) -> PluginSettings {
    let defaults = PluginSettings::default();
    if !path.exists() {
        return defaults;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Could not read settings {}: {e}", path.display());
            return defaults;
        }
    };
    let stored: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Corrupt settings {}: {e}. Using defaults.", path.display());
            return defaults;
        }
    };

    let outcome = merge_settings(&defaults, &stored);
    for key in &outcome.rejected {
        tracing::warn!("Ignoring malformed setting \"{key}\" in {}", path.display());
    }
    for key in &outcome.unknown {
        tracing::debug!("Ignoring unknown setting \"{key}\"");
    }
    outcome.settings
}

/// Save settings atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub fn save_settings_to(path: &Path, settings: &PluginSettings) -> Result<(), String> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| SETTINGS_FILE.to_string());
    let temp = dir.join(format!("{file_name}.tmp.{}", std::process::id()));

    std::fs::write(&temp, &json)
        .map_err(|e| format!("Failed to write temp settings: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set settings permissions: {e}"))?;
    }

    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit settings: {e}")
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
