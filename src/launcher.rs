//! Launch orchestration: directory → command → dispatch → (automation).
//!
//! One call to [`Launcher::launch`] performs exactly one primary spawn. For
//! editors a second, delayed step types the command into the integrated
//! terminal; the launch counts as done as soon as the primary spawn
//! succeeds, and the caller may await the automation step through
//! [`LaunchReport::finish`].

use std::sync::Arc;

use crate::automation::{self, PendingAutomation, build_automation_script};
use crate::command::build_command;
use crate::config::PluginSettings;
use crate::error::LaunchError;
use crate::notices::{NoticeLevel, NoticeSink};
use crate::platform::Platform;
use crate::presence::{PresenceCache, assistant_key};
use crate::process::{ProcessSpawner, SpawnRequest};
use crate::terminal::{CUSTOM_TERMINAL_ID, Terminal};
use crate::workspace::{Workspace, resolve_working_dir};

pub const CWD_PLACEHOLDER: &str = "{{cwd}}";
pub const CLAUDE_PLACEHOLDER: &str = "{{claude}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    ResolvingDirectory,
    BuildingCommand,
    Dispatching,
    AwaitingSecondaryAutomation,
    Done,
    Failed,
}

/// How the launch command was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Custom,
    Builtin(Terminal),
}

#[derive(Debug)]
pub struct LaunchReport {
    pub working_dir: String,
    /// Assistant invocation
    pub command: String,
    /// What was handed to the shell
    pub launch_command: String,
    pub dispatch: Dispatch,
    pub state: LaunchState,
    pub automation: Option<PendingAutomation>,
}

impl LaunchReport {
    /// Wait for the automation step, if one is pending, and move to `Done`.
    /// The step's failure is returned but does not undo the launch.
    pub async fn finish(&mut self) -> Result<(), LaunchError> {
        let result = match self.automation.take() {
            Some(pending) => pending.wait().await,
            None => Ok(()),
        };
        advance(&mut self.state, LaunchState::Done);
        result
    }
}

pub struct Launcher {
    spawner: Arc<dyn ProcessSpawner>,
    presence: Arc<PresenceCache>,
    notices: Arc<dyn NoticeSink>,
    platform: Platform,
}

impl Launcher {
    pub fn new(
        spawner: Arc<dyn ProcessSpawner>,
        presence: Arc<PresenceCache>,
        notices: Arc<dyn NoticeSink>,
        platform: Platform,
    ) -> Self {
        Self { spawner, presence, notices, platform }
    }

    pub fn presence(&self) -> &Arc<PresenceCache> {
        &self.presence
    }

    /// Entry point for every trigger (shortcut, command, toolbar).
    pub async fn launch(
        &self,
        settings: &PluginSettings,
        workspace: &dyn Workspace,
    ) -> Result<LaunchReport, LaunchError> {
        let mut state = LaunchState::Idle;
        match self.run(settings, workspace, &mut state).await {
            Ok(report) => Ok(report),
            Err(err) => {
                advance(&mut state, LaunchState::Failed);
                tracing::error!("{err}");
                self.notices.notify(NoticeLevel::Error, "launch", &err.to_string());
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        settings: &PluginSettings,
        workspace: &dyn Workspace,
        state: &mut LaunchState,
    ) -> Result<LaunchReport, LaunchError> {
        advance(state, LaunchState::ResolvingDirectory);
        let parent = workspace.active_document_parent();
        let working_dir = resolve_working_dir(
            settings.use_root_path_override,
            &settings.root_path_override,
            settings.always_open_root,
            parent.as_deref(),
            &workspace.base_path(),
            self.platform,
        );

        advance(state, LaunchState::BuildingCommand);
        let command = build_command(&settings.launch_options());
        tracing::debug!(%working_dir, %command, "built assistant command");

        advance(state, LaunchState::Dispatching);
        let dispatch = if settings.terminal == CUSTOM_TERMINAL_ID {
            Dispatch::Custom
        } else {
            let terminal = Terminal::from_id(&settings.terminal)
                .ok_or_else(|| LaunchError::InvalidTerminalSelected(settings.terminal.clone()))?;
            if !terminal.supported_on(self.platform) {
                tracing::warn!("{} is not expected on {:?}", terminal.display_name(), self.platform);
            }
            Dispatch::Builtin(terminal)
        };

        let use_override = settings.use_custom_claude_path;
        if !self.presence.is_assistant_present(use_override, &settings.claude_path).await {
            return Err(LaunchError::AssistantNotFound(assistant_key(
                use_override,
                &settings.claude_path,
            )));
        }

        if settings.show_debug_info {
            self.notices.notify(
                NoticeLevel::Info,
                "launch",
                &format!("Directory: {working_dir}\nCommand: {command}"),
            );
        }

        let (launch_command, automation) = match dispatch {
            Dispatch::Custom => {
                let line = render_custom_template(&settings.custom_command, &working_dir, &command);
                self.spawner
                    .spawn(SpawnRequest::new(line.clone()).in_dir(&working_dir))
                    .await
                    .map_err(|e| LaunchError::CustomCommandFailed(e.to_string()))?;
                (line, None)
            }
            Dispatch::Builtin(terminal) => {
                let line = terminal.build_launch_command(&working_dir, &command, self.platform);
                self.spawner
                    .spawn(SpawnRequest::new(line.clone()))
                    .await
                    .map_err(|e| LaunchError::PrimarySpawnFailed(e.to_string()))?;

                let automation = terminal.needs_secondary_automation().then(|| {
                    let script = build_automation_script(terminal, &command, self.platform);
                    automation::schedule(
                        self.spawner.clone(),
                        self.notices.clone(),
                        SpawnRequest::new(script).wait_for_exit(),
                        settings.automation_delay(terminal),
                    )
                });
                (line, automation)
            }
        };

        let final_state = if automation.is_some() {
            LaunchState::AwaitingSecondaryAutomation
        } else {
            LaunchState::Done
        };
        advance(state, final_state);
        tracing::info!(dir = %working_dir, terminal = %settings.terminal, "launched");

        Ok(LaunchReport {
            working_dir,
            command,
            launch_command,
            dispatch,
            state: final_state,
            automation,
        })
    }
}

fn advance(state: &mut LaunchState, next: LaunchState) {
    tracing::debug!(from = ?state, to = ?next, "launch state");
    *state = next;
}

/// Substitute every `{{cwd}}` and `{{claude}}` in one left-to-right pass, so
/// placeholder text inside the substituted values is left alone.
pub fn render_custom_template(template: &str, cwd: &str, claude: &str) -> String {
    let mut out = String::with_capacity(template.len() + cwd.len() + claude.len());
    let mut rest = template;
    loop {
        let next_cwd = rest.find(CWD_PLACEHOLDER);
        let next_claude = rest.find(CLAUDE_PLACEHOLDER);
        let (idx, placeholder, value) = match (next_cwd, next_claude) {
            (Some(a), Some(b)) if a < b => (a, CWD_PLACEHOLDER, cwd),
            (Some(a), None) => (a, CWD_PLACEHOLDER, cwd),
            (_, Some(b)) => (b, CLAUDE_PLACEHOLDER, claude),
            (None, None) => break,
        };
        out.push_str(&rest[..idx]);
        out.push_str(value);
        rest = &rest[idx + placeholder.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::NoticeLog;
    use crate::presence::tests::{FakeProbe, ManualClock};
    use crate::process::tests::RecordingSpawner;
    use std::path::PathBuf;
    use std::time::Duration;

    struct StaticWorkspace {
        root: &'static str,
        parent: Option<&'static str>,
    }

    impl Workspace for StaticWorkspace {
        fn active_document_parent(&self) -> Option<String> {
            self.parent.map(str::to_string)
        }

        fn base_path(&self) -> String {
            self.root.to_string()
        }
    }

    struct Harness {
        spawner: Arc<RecordingSpawner>,
        probe: Arc<FakeProbe>,
        notices: Arc<NoticeLog>,
        launcher: Launcher,
    }

    fn harness(platform: Platform, installed: &[&str]) -> Harness {
        let spawner = Arc::new(RecordingSpawner::default());
        let probe = Arc::new(FakeProbe::with(installed));
        let notices = Arc::new(NoticeLog::default());
        let presence = Arc::new(PresenceCache::new(probe.clone(), Arc::new(ManualClock::new(0))));
        let launcher = Launcher::new(spawner.clone(), presence, notices.clone(), platform);
        Harness { spawner, probe, notices, launcher }
    }

    const VAULT: StaticWorkspace = StaticWorkspace { root: "C:\\Vault", parent: None };

    #[test]
    fn template_substitutes_each_placeholder() {
        let out = render_custom_template(
            r#"cmd /c "start cmd /k \"cd /d {{cwd}} && {{claude}}\"""#,
            "C:\\Vault",
            "claude --verbose",
        );
        assert_eq!(out, r#"cmd /c "start cmd /k \"cd /d C:\Vault && claude --verbose\"""#);
    }

    #[test]
    fn template_replaces_repeats_and_ignores_injected_placeholders() {
        let out = render_custom_template("{{cwd}}|{{claude}}|{{cwd}}", "/a{{claude}}", "c");
        assert_eq!(out, "/a{{claude}}|c|/a{{claude}}");
        assert_eq!(render_custom_template("no placeholders", "x", "y"), "no placeholders");
        assert_eq!(render_custom_template("{{claude}} {{cwd", "x", "y"), "y {{cwd");
    }

    #[tokio::test]
    async fn custom_terminal_spawns_rendered_template_in_working_dir() {
        let h = harness(Platform::Windows, &["claude"]);
        let mut settings = PluginSettings::defaults_for(Platform::Windows);
        settings.terminal = "custom".into();
        settings.verbose = true;

        let report = h.launcher.launch(&settings, &VAULT).await.unwrap();
        assert_eq!(report.dispatch, Dispatch::Custom);
        assert_eq!(report.state, LaunchState::Done);
        assert!(report.automation.is_none());

        let requests = h.spawner.requests.lock().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].command_line,
            r#"cmd /c "start cmd /k \"cd /d C:\Vault && claude --verbose\"""#
        );
        assert_eq!(requests[0].cwd, Some(PathBuf::from("C:\\Vault")));
    }

    #[tokio::test]
    async fn unknown_terminal_fails_without_spawning() {
        let h = harness(Platform::Linux, &["claude"]);
        let mut settings = PluginSettings::defaults_for(Platform::Linux);
        settings.terminal = "foo".into();

        let err = h.launcher.launch(&settings, &VAULT).await.unwrap_err();
        assert_eq!(err, LaunchError::InvalidTerminalSelected("foo".into()));
        assert!(h.spawner.command_lines().is_empty());

        let notices = h.notices.entries(0);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn missing_assistant_aborts_before_spawn() {
        let h = harness(Platform::Linux, &[]);
        let settings = PluginSettings::defaults_for(Platform::Linux);

        let err = h.launcher.launch(&settings, &VAULT).await.unwrap_err();
        assert_eq!(err, LaunchError::AssistantNotFound("claude".into()));
        assert!(h.spawner.command_lines().is_empty());
    }

    #[tokio::test]
    async fn override_path_drives_presence_and_command() {
        let h = harness(Platform::Linux, &["/opt/claude/bin/claude"]);
        let mut settings = PluginSettings::defaults_for(Platform::Linux);
        settings.use_custom_claude_path = true;
        settings.claude_path = "/opt/claude/bin/claude".into();

        let report = h
            .launcher
            .launch(&settings, &StaticWorkspace { root: "/vault", parent: Some("Notes") })
            .await
            .unwrap();
        assert_eq!(report.command, "/opt/claude/bin/claude");
        assert_eq!(report.working_dir, "/vault/Notes");
        assert_eq!(h.probe.calls(), 1);
    }

    #[tokio::test]
    async fn builtin_terminal_spawns_its_launch_command() {
        let h = harness(Platform::Linux, &["claude"]);
        let settings = PluginSettings::defaults_for(Platform::Linux);
        let ws = StaticWorkspace { root: "/home/me/vault", parent: Some("Projects/2024") };

        let report = h.launcher.launch(&settings, &ws).await.unwrap();
        assert_eq!(report.working_dir, "/home/me/vault/Projects/2024");
        assert_eq!(report.dispatch, Dispatch::Builtin(Terminal::GnomeTerminal));
        assert_eq!(report.state, LaunchState::Done);
        assert_eq!(
            h.spawner.command_lines(),
            vec![
                "gnome-terminal --working-directory='/home/me/vault/Projects/2024' -- bash -c 'claude; exec bash'"
                    .to_string()
            ]
        );
        assert_eq!(h.spawner.requests.lock()[0].cwd, None);
        assert!(!h.spawner.requests.lock()[0].wait_for_exit);
    }

    #[tokio::test]
    async fn primary_failure_carries_stderr() {
        let h = harness(Platform::Linux, &["claude"]);
        h.spawner.push_result(Some("gnome-terminal: not found"));
        let settings = PluginSettings::defaults_for(Platform::Linux);

        let err = h.launcher.launch(&settings, &VAULT).await.unwrap_err();
        match err {
            LaunchError::PrimarySpawnFailed(msg) => assert!(msg.contains("gnome-terminal: not found")),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(h.spawner.command_lines().len(), 1);
    }

    #[tokio::test]
    async fn custom_failure_is_reported_as_custom() {
        let h = harness(Platform::Linux, &["claude"]);
        h.spawner.push_result(Some("bad template"));
        let mut settings = PluginSettings::defaults_for(Platform::Linux);
        settings.terminal = "custom".into();

        let err = h.launcher.launch(&settings, &VAULT).await.unwrap_err();
        assert!(matches!(err, LaunchError::CustomCommandFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn editor_schedules_automation_without_waiting() {
        let h = harness(Platform::Linux, &["claude"]);
        let mut settings = PluginSettings::defaults_for(Platform::Linux);
        settings.terminal = "vscode".into();
        settings.automation_delay_ms = Some(2000);

        let mut report = h
            .launcher
            .launch(&settings, &StaticWorkspace { root: "/v", parent: None })
            .await
            .unwrap();
        assert_eq!(report.state, LaunchState::AwaitingSecondaryAutomation);
        assert_eq!(h.spawner.command_lines(), vec!["code '/v'".to_string()]);

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(h.spawner.command_lines().len(), 1);

        report.finish().await.unwrap();
        assert_eq!(report.state, LaunchState::Done);
        assert!(report.automation.is_none());
        let lines = h.spawner.command_lines();
        assert_eq!(lines.len(), 2);
        let requests = h.spawner.requests.lock().clone();
        assert!(!requests[0].wait_for_exit);
        assert!(requests[1].wait_for_exit);
        assert!(lines[1].starts_with("xdotool search"));
        assert!(lines[1].contains("type --delay 20 'claude'"));
    }

    #[tokio::test(start_paused = true)]
    async fn automation_failure_does_not_fail_launch() {
        let h = harness(Platform::MacOs, &["claude"]);
        h.spawner.push_result(None);
        h.spawner.push_result(Some("osascript: not allowed assistive access"));
        let mut settings = PluginSettings::defaults_for(Platform::MacOs);
        settings.terminal = "cursor".into();

        let mut report = h.launcher.launch(&settings, &VAULT).await.unwrap();
        let err = report.finish().await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(report.state, LaunchState::Done);

        let notices = h.notices.entries(0);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warn);
        assert!(notices[0].message.contains("assistive access"));
    }

    #[tokio::test]
    async fn debug_info_emits_notice() {
        let h = harness(Platform::Linux, &["claude"]);
        let mut settings = PluginSettings::defaults_for(Platform::Linux);
        settings.show_debug_info = true;
        settings.model = "opus".into();

        h.launcher
            .launch(&settings, &StaticWorkspace { root: "/v", parent: Some("a") })
            .await
            .unwrap();
        let notices = h.notices.entries(0);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert_eq!(notices[0].message, "Directory: /v/a\nCommand: claude --model opus");
    }

    #[tokio::test]
    async fn always_open_root_ignores_active_document() {
        let h = harness(Platform::Windows, &["claude"]);
        let mut settings = PluginSettings::defaults_for(Platform::Windows);
        settings.always_open_root = true;

        let report = h
            .launcher
            .launch(&settings, &StaticWorkspace { root: "C:\\Vault", parent: Some("Projects/2024") })
            .await
            .unwrap();
        assert_eq!(report.working_dir, "C:\\Vault");
    }
}
