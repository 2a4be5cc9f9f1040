//! Working-directory resolution.
//!
//! The launch directory is the folder of the active document, expressed as
//! `<root>/<parent>`, unless the user pinned launches to the root. The host
//! supplies the active document and the detected root through [`Workspace`].

use std::path::{Path, PathBuf};

use crate::platform::Platform;

/// Marker directories that identify a workspace root, checked in order.
const ROOT_MARKERS: &[&str] = &[".obsidian", ".git"];

/// What the host knows about the currently open document.
pub trait Workspace {
    /// Parent folder of the active document, relative to the root, using
    /// `/` separators. `None` when no document is open or it sits at the root.
    fn active_document_parent(&self) -> Option<String>;

    /// Absolute base directory of the current workspace.
    fn base_path(&self) -> String;
}

/// Compute the absolute directory the assistant should start in.
pub fn resolve_working_dir(
    root_override_enabled: bool,
    root_override_path: &str,
    always_use_root: bool,
    active_document_parent: Option<&str>,
    detected_root: &str,
    platform: Platform,
) -> String {
    let root = if root_override_enabled && !root_override_path.is_empty() {
        root_override_path
    } else {
        detected_root
    };

    let parent = match active_document_parent {
        Some(p) if !always_use_root && !p.is_empty() => p,
        _ => return root.to_string(),
    };

    let sep = platform.separator();
    let normalized: String = parent
        .chars()
        .map(|c| if c == '/' || c == '\\' { sep } else { c })
        .collect();
    format!("{root}{sep}{normalized}")
}

/// Filesystem-backed workspace used by the command-line host.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
    active_file: Option<PathBuf>,
}

impl FsWorkspace {
    /// `active_file` is the document the launch was triggered from. Without
    /// an explicit `root`, the root is found by walking up from the document
    /// (or the current directory) to the nearest marker directory.
    pub fn new(active_file: Option<PathBuf>, root: Option<PathBuf>) -> std::io::Result<Self> {
        let active_file = active_file.map(|f| std::path::absolute(&f)).transpose()?;
        let root = match root {
            Some(r) => std::path::absolute(&r)?,
            None => {
                let start = match active_file.as_deref().and_then(Path::parent) {
                    Some(dir) => dir.to_path_buf(),
                    None => std::env::current_dir()?,
                };
                detect_root(&start)
            }
        };
        Ok(Self { root, active_file })
    }
}

impl Workspace for FsWorkspace {
    fn active_document_parent(&self) -> Option<String> {
        let parent = self.active_file.as_deref()?.parent()?;
        let relative = parent.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    fn base_path(&self) -> String {
        self.root.to_string_lossy().to_string()
    }
}

/// Walk up from `start` looking for a root marker; falls back to `start`.
pub(crate) fn detect_root(start: &Path) -> PathBuf {
    for marker in ROOT_MARKERS {
        if let Some(found) = start.ancestors().find(|dir| dir.join(marker).is_dir()) {
            return found.to_path_buf();
        }
    }
    start.to_path_buf()
}
