//! Supported terminals and editors, and how to open each one.
//!
//! Every variant is plain data; [`Terminal::build_launch_command`] turns a
//! directory plus the assistant command into a shell command line for the
//! platform shell (`sh -c` or `cmd /C`).

use crate::command::escape_path;
use crate::platform::Platform;
use crate::quote;

/// Terminal id that selects the user's own command template.
pub const CUSTOM_TERMINAL_ID: &str = "custom";

/// Automation delay applied to editors when the user has no override.
pub const DEFAULT_AUTOMATION_DELAY_MS: u64 = 1500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terminal {
    Cmd,
    PowerShell,
    WindowsTerminal,
    MacTerminal,
    ITerm,
    GnomeTerminal,
    Konsole,
    Xterm,
    Alacritty,
    Kitty,
    WezTerm,
    VsCode,
    Cursor,
    Windsurf,
}

impl Terminal {
    pub const ALL: [Terminal; 14] = [
        Terminal::Cmd,
        Terminal::PowerShell,
        Terminal::WindowsTerminal,
        Terminal::MacTerminal,
        Terminal::ITerm,
        Terminal::GnomeTerminal,
        Terminal::Konsole,
        Terminal::Xterm,
        Terminal::Alacritty,
        Terminal::Kitty,
        Terminal::WezTerm,
        Terminal::VsCode,
        Terminal::Cursor,
        Terminal::Windsurf,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Cmd => "cmd",
            Self::PowerShell => "powershell",
            Self::WindowsTerminal => "windows-terminal",
            Self::MacTerminal => "terminal",
            Self::ITerm => "iterm",
            Self::GnomeTerminal => "gnome-terminal",
            Self::Konsole => "konsole",
            Self::Xterm => "xterm",
            Self::Alacritty => "alacritty",
            Self::Kitty => "kitty",
            Self::WezTerm => "wezterm",
            Self::VsCode => "vscode",
            Self::Cursor => "cursor",
            Self::Windsurf => "windsurf",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cmd => "Command Prompt",
            Self::PowerShell => "PowerShell",
            Self::WindowsTerminal => "Windows Terminal",
            Self::MacTerminal => "Terminal.app",
            Self::ITerm => "iTerm2",
            Self::GnomeTerminal => "GNOME Terminal",
            Self::Konsole => "Konsole",
            Self::Xterm => "XTerm",
            Self::Alacritty => "Alacritty",
            Self::Kitty => "kitty",
            Self::WezTerm => "WezTerm",
            Self::VsCode => "Visual Studio Code",
            Self::Cursor => "Cursor",
            Self::Windsurf => "Windsurf",
        }
    }

    /// Executable looked up by the presence probe.
    pub fn probe_executable(self) -> &'static str {
        match self {
            Self::Cmd => "cmd",
            Self::PowerShell => "powershell",
            Self::WindowsTerminal => "wt",
            // Both are driven through AppleScript
            Self::MacTerminal | Self::ITerm => "osascript",
            Self::GnomeTerminal => "gnome-terminal",
            Self::Konsole => "konsole",
            Self::Xterm => "xterm",
            Self::Alacritty => "alacritty",
            Self::Kitty => "kitty",
            Self::WezTerm => "wezterm",
            Self::VsCode => "code",
            Self::Cursor => "cursor",
            Self::Windsurf => "windsurf",
        }
    }

    /// Editors open a window but not a shell, so the command must be typed
    /// into their integrated terminal afterwards.
    pub fn needs_secondary_automation(self) -> bool {
        matches!(self, Self::VsCode | Self::Cursor | Self::Windsurf)
    }

    pub fn default_automation_delay_ms(self) -> u64 {
        if self.needs_secondary_automation() {
            DEFAULT_AUTOMATION_DELAY_MS
        } else {
            0
        }
    }

    pub fn supported_on(self, platform: Platform) -> bool {
        match self {
            Self::Cmd | Self::PowerShell | Self::WindowsTerminal => platform == Platform::Windows,
            Self::MacTerminal | Self::ITerm => platform == Platform::MacOs,
            Self::GnomeTerminal | Self::Konsole | Self::Xterm => platform == Platform::Linux,
            Self::Kitty => platform != Platform::Windows,
            Self::Alacritty | Self::WezTerm | Self::VsCode | Self::Cursor | Self::Windsurf => true,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn for_platform(platform: Platform) -> impl Iterator<Item = Terminal> {
        Self::ALL.into_iter().filter(move |t| t.supported_on(platform))
    }

    pub fn default_for(platform: Platform) -> Self {
        match platform {
            Platform::Windows => Self::Cmd,
            Platform::MacOs => Self::MacTerminal,
            Platform::Linux => Self::GnomeTerminal,
        }
    }

    /// Build the command line that opens this terminal in `dir` running
    /// `inner`. For editors `inner` is not part of the command; it is typed
    /// later by the automation step.
    pub fn build_launch_command(self, dir: &str, inner: &str, platform: Platform) -> String {
        let win_dir = format!("\"{}\"", escape_path(dir));
        match self {
            Self::Cmd => format!("start \"\" /D {win_dir} cmd /k \"{inner}\""),
            Self::PowerShell => format!(
                "start \"\" /D {win_dir} powershell -NoExit -Command \"{}\"",
                inner.replace('"', "\\\"")
            ),
            Self::WindowsTerminal => format!("wt -d {win_dir} cmd /k {inner}"),
            Self::MacTerminal => {
                let script = format!("cd {} && {inner}", quote::posix(dir));
                let run = format!(
                    "tell application \"Terminal\" to do script {}",
                    quote::applescript(&script)
                );
                format!(
                    "osascript -e {} -e {}",
                    quote::posix(&run),
                    quote::posix("tell application \"Terminal\" to activate")
                )
            }
            Self::ITerm => {
                let script = format!("cd {} && {inner}", quote::posix(dir));
                let lines = [
                    "tell application \"iTerm\"".to_string(),
                    "activate".to_string(),
                    "set newWindow to (create window with default profile)".to_string(),
                    format!(
                        "tell current session of newWindow to write text {}",
                        quote::applescript(&script)
                    ),
                    "end tell".to_string(),
                ];
                let args: Vec<String> = lines
                    .iter()
                    .map(|l| format!("-e {}", quote::posix(l)))
                    .collect();
                format!("osascript {}", args.join(" "))
            }
            Self::GnomeTerminal => format!(
                "gnome-terminal --working-directory={} -- bash -c {}",
                quote::posix(dir),
                quote::posix(&format!("{inner}; exec bash"))
            ),
            Self::Konsole => format!(
                "konsole --workdir {} -e bash -c {}",
                quote::posix(dir),
                quote::posix(&format!("{inner}; exec bash"))
            ),
            Self::Xterm => format!(
                "xterm -e bash -c {}",
                quote::posix(&format!("cd {} && {inner}; exec bash", quote::posix(dir)))
            ),
            Self::Alacritty if platform.is_windows() => {
                format!("alacritty --working-directory {win_dir} -e cmd /k {inner}")
            }
            Self::Alacritty => format!(
                "alacritty --working-directory {} -e sh -c {}",
                quote::posix(dir),
                quote::posix(&keep_shell_open(inner))
            ),
            Self::Kitty => format!(
                "kitty --directory {} sh -c {}",
                quote::posix(dir),
                quote::posix(&keep_shell_open(inner))
            ),
            Self::WezTerm if platform.is_windows() => {
                format!("wezterm start --cwd {win_dir} -- cmd /k {inner}")
            }
            Self::WezTerm => format!(
                "wezterm start --cwd {} -- sh -c {}",
                quote::posix(dir),
                quote::posix(&keep_shell_open(inner))
            ),
            Self::VsCode | Self::Cursor | Self::Windsurf => {
                let dir_arg = if platform.is_windows() {
                    win_dir
                } else {
                    quote::posix(dir)
                };
                format!("{} {dir_arg}", self.probe_executable())
            }
        }
    }
}

/// Run `inner`, then drop into the user's shell so the window stays open.
fn keep_shell_open(inner: &str) -> String {
    format!("{inner}; exec \"${{SHELL:-sh}}\"")
}
