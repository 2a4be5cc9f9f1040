pub mod automation;
pub mod cli;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod launcher;
pub mod notices;
pub mod platform;
pub mod presence;
pub mod process;
mod quote;
pub mod shortcut;
pub mod terminal;
pub mod workspace;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::cli::SystemProbe;
use crate::config::PluginSettings;
use crate::launcher::Launcher;
use crate::notices::{Notice, NoticeLog};
use crate::platform::Platform;
use crate::presence::{PresenceCache, SystemClock};
use crate::process::ShellSpawner;
use crate::terminal::Terminal;
use crate::workspace::FsWorkspace;

pub use crate::error::LaunchError;

#[derive(Parser)]
#[command(name = "claude-launcher", version)]
#[command(about = "Open the Claude CLI in a terminal at the active note's folder", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(long, global = true)]
    debug: bool,

    /// Use this settings file instead of the one in the config directory.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the configured terminal running Claude (default).
    Launch(LaunchArgs),
    /// Show which executables are installed.
    Doctor {
        /// Ignore cached probe results.
        #[arg(long)]
        refresh: bool,
    },
    /// List the terminals available on this platform.
    Terminals,
    /// Inspect or change settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args, Default)]
struct LaunchArgs {
    /// Document the launch is triggered from; its folder becomes the working directory.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Workspace root; detected from `.obsidian` / `.git` when omitted.
    #[arg(long)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the effective settings as JSON.
    Show,
    /// Print the settings file location.
    Path,
    /// Restore defaults.
    Reset,
    /// Set one field, e.g. `set terminal kitty` or `set allowed_tools '["Read"]'`.
    Set { key: String, value: String },
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Everything a launch needs, wired once per process.
struct App {
    launcher: Launcher,
    notices: Arc<NoticeLog>,
    settings_path: PathBuf,
    platform: Platform,
}

impl App {
    fn new(settings_path: PathBuf) -> Self {
        let platform = Platform::current();
        let notices = Arc::new(NoticeLog::default());
        let presence = Arc::new(PresenceCache::new(Arc::new(SystemProbe), Arc::new(SystemClock)));
        let launcher = Launcher::new(Arc::new(ShellSpawner), presence, notices.clone(), platform);
        Self { launcher, notices, settings_path, platform }
    }

    fn settings(&self) -> PluginSettings {
        config::load_settings_from(&self.settings_path)
    }

    async fn launch(&self, args: LaunchArgs) -> anyhow::Result<bool> {
        let settings = self.settings();
        let workspace = FsWorkspace::new(args.file, args.root)
            .context("Failed to resolve workspace")?;

        let ok = match self.launcher.launch(&settings, &workspace).await {
            Ok(mut report) => {
                println!("Opened {} in {}", report.launch_command, report.working_dir);
                // The automation task dies with the runtime, so wait for it here.
                report.finish().await.is_ok()
            }
            Err(_) => false,
        };
        print_notices(&self.notices.entries(0));
        Ok(ok)
    }

    async fn doctor(&self, refresh: bool) {
        let settings = self.settings();
        let report =
            diagnostics::collect(self.launcher.presence(), &settings, self.platform, refresh).await;
        print!("{report}");
    }

    fn terminals(&self) {
        for terminal in Terminal::for_platform(self.platform) {
            let note = if terminal.needs_secondary_automation() { "  (types command via automation)" } else { "" };
            println!("{:<18} {}{note}", terminal.id(), terminal.display_name());
        }
        println!("{:<18} Custom command template", terminal::CUSTOM_TERMINAL_ID);
    }

    fn settings_command(&self, cmd: SettingsCommand) -> anyhow::Result<()> {
        match cmd {
            SettingsCommand::Show => {
                println!("{}", serde_json::to_string_pretty(&self.settings())?);
            }
            SettingsCommand::Path => println!("{}", self.settings_path.display()),
            SettingsCommand::Reset => {
                config::save_settings_to(&self.settings_path, &PluginSettings::default())
                    .map_err(anyhow::Error::msg)?;
                println!("Settings reset to defaults");
            }
            SettingsCommand::Set { key, value } => {
                let current = self.settings();
                let updated = config::apply_setting(&current, &key, &value).map_err(anyhow::Error::msg)?;
                config::save_settings_to(&self.settings_path, &updated).map_err(anyhow::Error::msg)?;
                println!("{key} updated");
            }
        }
        Ok(())
    }
}

fn format_notice(notice: &Notice) -> String {
    format!("{}: {}", notice.level, notice.message)
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("{}", format_notice(notice));
    }
}

/// Parse arguments and dispatch. Returns the process exit code.
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let app = App::new(cli.settings.unwrap_or_else(config::settings_path));
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    rt.block_on(async move {
        match cli.command.unwrap_or(Commands::Launch(LaunchArgs::default())) {
            Commands::Launch(args) => Ok(if app.launch(args).await? { 0 } else { 1 }),
            Commands::Doctor { refresh } => {
                app.doctor(refresh).await;
                Ok(0)
            }
            Commands::Terminals => {
                app.terminals();
                Ok(0)
            }
            Commands::Settings(cmd) => {
                app.settings_command(cmd)?;
                Ok(0)
            }
        }
    })
}
