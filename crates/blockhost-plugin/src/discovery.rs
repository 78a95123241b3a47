//! Locating VST2 modules on disk.
//!
//! Lookup order for a requested name:
//! 1. the name itself, if it is an existing path
//! 2. `<plugin root>/<name>.<ext>` when a root was given
//! 3. the same pattern in each platform default directory

use crate::internal::INTERNAL_PREFIX;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File extension of a VST2 module on this platform.
pub fn platform_extension() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "vst"
    }

    #[cfg(target_os = "windows")]
    {
        "dll"
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        "so"
    }
}

/// Platform default VST2 directories, in search order.
pub fn default_search_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let mut paths = Vec::new();
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join("Library/Audio/Plug-Ins/VST"));
        }
        paths.push(PathBuf::from("/Library/Audio/Plug-Ins/VST"));
        paths
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from("C:\\Program Files\\VSTPlugins"),
            PathBuf::from("C:\\Program Files\\Steinberg\\VSTPlugins"),
            PathBuf::from("C:\\Program Files\\Common Files\\VST2"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".vst"));
        }
        if let Some(vst_path) = std::env::var_os("VST_PATH") {
            paths.extend(std::env::split_paths(&vst_path));
        }
        paths.push(PathBuf::from("/usr/lib/vst"));
        paths.push(PathBuf::from("/usr/local/lib/vst"));
        paths
    }
}

/// Resolves `name` to a loadable module path.
///
/// Internal `mrs_` names never resolve here.
pub fn resolve(name: &str, plugin_root: Option<&Path>) -> Option<PathBuf> {
    if name.is_empty() || name.starts_with(INTERNAL_PREFIX) {
        return None;
    }

    let literal = Path::new(name);
    if literal.exists() {
        debug!("Using plugin path '{}' as given", name);
        return Some(library_path(literal.to_path_buf()));
    }

    let roots = plugin_root
        .map(Path::to_path_buf)
        .into_iter()
        .chain(default_search_paths());
    for root in roots {
        if let Some(found) = resolve_in(&root, name) {
            debug!("Resolved plugin '{}' to {}", name, found.display());
            return Some(found);
        }
    }
    None
}

fn resolve_in(root: &Path, name: &str) -> Option<PathBuf> {
    let candidate = root.join(format!("{}.{}", name, platform_extension()));
    if candidate.exists() {
        return Some(library_path(candidate));
    }
    let with_extension = root.join(name);
    if has_plugin_extension(&with_extension) && with_extension.exists() {
        return Some(library_path(with_extension));
    }
    None
}

fn has_plugin_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(platform_extension()))
}

/// A macOS `.vst` bundle is a directory; the binary lives inside it.
fn library_path(path: PathBuf) -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if path.is_dir() {
            if let Some(stem) = path.file_stem() {
                let binary = path.join("Contents").join("MacOS").join(stem);
                if binary.exists() {
                    return binary;
                }
            }
        }
    }
    path
}

/// Modules found in `plugin_root` and the default directories.
pub fn list_plugins(plugin_root: Option<&Path>) -> Vec<PathBuf> {
    let roots: Vec<PathBuf> = plugin_root
        .map(Path::to_path_buf)
        .into_iter()
        .chain(default_search_paths())
        .collect();

    let mut found = Vec::new();
    for root in roots {
        if !root.is_dir() {
            debug!("Skipping missing plugin directory {}", root.display());
            continue;
        }
        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to scan {}: {}", root.display(), e);
                continue;
            }
        };

        info!("Plugins in {}:", root.display());
        let mut in_root: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| has_plugin_extension(path))
            .collect();
        in_root.sort();
        if in_root.is_empty() {
            info!("  (none)");
        }
        for path in in_root {
            if let Some(stem) = path.file_stem() {
                info!("  {}", stem.to_string_lossy());
            }
            found.push(path);
        }
    }
    found
}
