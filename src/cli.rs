//! Executable presence probing.
//!
//! Apps launched from a desktop environment often don't inherit the user's
//! shell PATH, so a failed `which`/`where` lookup is followed by a scan of
//! well-known install directories.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use tokio::process::Command;

/// Answers "is this executable reachable?". Errors count as "no".
#[async_trait]
pub trait PresenceProbe: Send + Sync {
    async fn probe(&self, name: &str) -> bool;
}

/// Probe backed by the OS search path plus well-known directories.
#[derive(Debug, Default, Clone)]
pub struct SystemProbe;

#[async_trait]
impl PresenceProbe for SystemProbe {
    async fn probe(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        // An explicit path (override setting) is checked directly.
        if name.contains('/') || name.contains('\\') {
            return Path::new(name).is_file();
        }
        if on_search_path(name).await {
            return true;
        }
        find_in_known_dirs(name, extra_bin_dirs()).is_some()
    }
}

async fn on_search_path(name: &str) -> bool {
    let checker = if cfg!(target_os = "windows") { "where" } else { "which" };
    match Command::new(checker).arg(name).output().await {
        Ok(output) => output.status.success(),
        Err(e) => {
            tracing::debug!("{checker} {name} failed: {e}");
            false
        }
    }
}

/// Well-known directories where CLI tools live but that desktop-launched apps
/// don't have on PATH. Computed once.
fn extra_bin_dirs() -> &'static [PathBuf] {
    static DIRS: OnceLock<Vec<PathBuf>> = OnceLock::new();
    DIRS.get_or_init(|| {
        let home = dirs::home_dir().unwrap_or_default();
        let mut dirs = Vec::new();

        #[cfg(target_os = "macos")]
        {
            dirs.extend([
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/opt/homebrew/bin"),
                PathBuf::from("/Applications/Visual Studio Code.app/Contents/Resources/app/bin"),
                PathBuf::from("/Applications/Cursor.app/Contents/Resources/app/bin"),
            ]);
        }

        #[cfg(target_os = "linux")]
        {
            dirs.extend([
                PathBuf::from("/usr/bin"),
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/snap/bin"),
                PathBuf::from("/var/lib/flatpak/exports/bin"),
            ]);
        }

        #[cfg(not(target_os = "windows"))]
        {
            dirs.extend([
                home.join(".local/bin"),
                home.join(".claude/local"),
                home.join(".npm-global/bin"),
                home.join(".cargo/bin"),
            ]);
        }

        #[cfg(target_os = "windows")]
        {
            let local_app_data = std::env::var("LOCALAPPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join("AppData\\Local"));
            let program_files = std::env::var("ProgramFiles")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Program Files"));
            dirs.extend([
                home.join("AppData\\Roaming\\npm"),
                home.join(".local\\bin"),
                home.join("scoop\\shims"),
                local_app_data.join("Programs\\Microsoft VS Code\\bin"),
                local_app_data.join("Programs\\cursor\\resources\\app\\bin"),
                local_app_data.join("Programs\\windsurf\\resources\\app\\bin"),
                local_app_data.join("Microsoft\\WindowsApps"),
                program_files.join("Microsoft VS Code\\bin"),
            ]);
        }

        dirs
    })
}

/// Look for `name` in each directory, trying the platform's executable
/// extensions on Windows.
pub(crate) fn find_in_known_dirs(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let names: Vec<String> = if cfg!(target_os = "windows") {
        ["", ".exe", ".cmd", ".bat"].iter().map(|ext| format!("{name}{ext}")).collect()
    } else {
        vec![name.to_string()]
    };
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn extra_bin_dirs_returns_non_empty() {
        assert!(!extra_bin_dirs().is_empty());
    }

    #[test]
    fn extra_bin_dirs_no_duplicates() {
        let mut seen = HashSet::new();
        for dir in extra_bin_dirs() {
            assert!(seen.insert(dir), "Duplicate directory in extra_bin_dirs: {}", dir.display());
        }
    }

    #[test]
    fn finds_binary_in_known_dir() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let bin = b.path().join("claude");
        std::fs::write(&bin, "").unwrap();

        let dirs = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(find_in_known_dirs("claude", &dirs), Some(bin));
        assert_eq!(find_in_known_dirs("missing", &dirs), None);
    }

    #[test]
    fn directories_do_not_count_as_binaries() {
        let a = TempDir::new().unwrap();
        std::fs::create_dir(a.path().join("claude")).unwrap();
        assert_eq!(find_in_known_dirs("claude", &[a.path().to_path_buf()]), None);
    }

    #[tokio::test]
    async fn probe_rejects_blank_and_missing() {
        assert!(!SystemProbe.probe("").await);
        assert!(!SystemProbe.probe("nonexistent_binary_xyz_12345").await);
    }

    #[tokio::test]
    async fn probe_checks_explicit_paths_directly() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("my-claude");
        assert!(!SystemProbe.probe(&bin.to_string_lossy()).await);
        std::fs::write(&bin, "").unwrap();
        assert!(SystemProbe.probe(&bin.to_string_lossy()).await);
    }
}
