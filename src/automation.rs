//! Typing the assistant command into an editor's integrated terminal.
//!
//! Editors open a window at the directory but no shell. After a delay the
//! launcher runs a small script for the platform's keystroke tool that
//! focuses the editor, toggles its integrated terminal (Ctrl+`), types the
//! command and presses Enter. The step is best-effort: its failure is
//! reported but the editor window stays open.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::LaunchError;
use crate::notices::{NoticeLevel, NoticeSink};
use crate::platform::Platform;
use crate::process::{ProcessSpawner, SpawnRequest};
use crate::quote;
use crate::terminal::Terminal;

/// Lower and upper bound for the user-configurable delay.
pub const MIN_AUTOMATION_DELAY_MS: u64 = 500;
pub const MAX_AUTOMATION_DELAY_MS: u64 = 10_000;

/// Keystroke tool each platform relies on.
pub fn automation_tool(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "powershell",
        Platform::MacOs => "osascript",
        Platform::Linux => "xdotool",
    }
}

/// Window/application name used to focus the editor.
fn window_name(terminal: Terminal) -> &'static str {
    match terminal {
        Terminal::Cursor => "Cursor",
        Terminal::Windsurf => "Windsurf",
        _ => "Visual Studio Code",
    }
}

/// Build the command line that focuses `terminal`'s integrated terminal and
/// types `inner` followed by Enter.
pub fn build_automation_script(terminal: Terminal, inner: &str, platform: Platform) -> String {
    let app = window_name(terminal);
    match platform {
        Platform::MacOs => {
            let lines = [
                format!("tell application {} to activate", quote::applescript(app)),
                "delay 0.5".to_string(),
                "tell application \"System Events\" to keystroke \"`\" using control down".to_string(),
                "delay 0.5".to_string(),
                format!(
                    "tell application \"System Events\" to keystroke {}",
                    quote::applescript(inner)
                ),
                "tell application \"System Events\" to key code 36".to_string(),
            ];
            let args: Vec<String> = lines.iter().map(|l| format!("-e {}", quote::posix(l))).collect();
            format!("osascript {}", args.join(" "))
        }
        Platform::Windows => {
            let script = format!(
                "$ws = New-Object -ComObject WScript.Shell; \
                 [void]$ws.AppActivate({}); \
                 Start-Sleep -Milliseconds 500; \
                 $ws.SendKeys('^`'); \
                 Start-Sleep -Milliseconds 500; \
                 $ws.SendKeys({}); \
                 $ws.SendKeys('{{ENTER}}')",
                quote::powershell(app),
                quote::powershell(&quote::sendkeys(inner)),
            );
            format!(
                "powershell -NoProfile -NonInteractive -Command \"{}\"",
                script.replace('"', "\\\"")
            )
        }
        Platform::Linux => format!(
            "xdotool search --sync --onlyvisible --name {} windowactivate --sync \
             key --clearmodifiers ctrl+grave sleep 0.5 type --delay 20 {} key Return",
            quote::posix(app),
            quote::posix(inner)
        ),
    }
}

/// Clamp a user-supplied delay into the supported range.
pub fn clamp_delay_ms(ms: u64) -> u64 {
    ms.clamp(MIN_AUTOMATION_DELAY_MS, MAX_AUTOMATION_DELAY_MS)
}

/// Handle to a scheduled automation step. Dropping it does not cancel the
/// step; awaiting [`PendingAutomation::wait`] is optional.
#[derive(Debug)]
pub struct PendingAutomation {
    handle: JoinHandle<Result<(), LaunchError>>,
}

impl PendingAutomation {
    pub async fn wait(self) -> Result<(), LaunchError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(LaunchError::SecondaryAutomationFailed(format!("task aborted: {e}"))),
        }
    }
}

/// Run `request` after `delay` on a background task. The request should be
/// built with [`SpawnRequest::wait_for_exit`], otherwise a keystroke tool that
/// fails after the spawner's grace window goes unreported.
pub(crate) fn schedule(
    spawner: Arc<dyn ProcessSpawner>,
    notices: Arc<dyn NoticeSink>,
    request: SpawnRequest,
    delay: Duration,
) -> PendingAutomation {
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match spawner.spawn(request).await {
            Ok(_) => {
                tracing::debug!("automation step finished");
                Ok(())
            }
            Err(e) => {
                let err = LaunchError::SecondaryAutomationFailed(e.to_string());
                tracing::warn!("{err}");
                notices.notify(NoticeLevel::Warn, "automation", &err.to_string());
                Err(err)
            }
        }
    });
    PendingAutomation { handle }
}
