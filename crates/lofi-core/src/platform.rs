use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// When set, bundled binaries beside the executable are ignored and only
/// `PATH` is searched.
static USE_SYSTEM_DEPS: AtomicBool = AtomicBool::new(false);

pub fn set_use_system_deps(use_system: bool) {
    USE_SYSTEM_DEPS.store(use_system, Ordering::Relaxed);
}

pub fn should_use_system_deps() -> bool {
    USE_SYSTEM_DEPS.load(Ordering::Relaxed)
}

#[cfg(unix)]
pub fn mpv_socket_name() -> String {
    format!(
        "{}/lofi-mpv-{}.sock",
        std::env::temp_dir().display(),
        std::process::id()
    )
}

#[cfg(windows)]
pub fn mpv_socket_name() -> String {
    format!("lofi-mpv-{}", std::process::id())
}

#[cfg(unix)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server={socket_name}")
}

#[cfg(windows)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{socket_name}")
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/lofi on every unix, including macOS
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("lofi")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lofi")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("lofi")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lofi")
    }
}

#[cfg(unix)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv"]
}

#[cfg(windows)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv.exe", "mpv"]
}

#[cfg(unix)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp"]
}

#[cfg(windows)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp.exe", "yt-dlp"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("external").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for name in names {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Find the mpv binary.
///
/// Searches in order:
/// 1. MPV_PATH environment variable
/// 2. Beside current executable (unless use_system_deps is set)
/// 3. PATH
pub fn find_mpv_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("MPV_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }
    if !should_use_system_deps() {
        if let Some(p) = find_beside_exe(mpv_binary_names()) {
            return Some(p);
        }
    }
    find_on_path(mpv_binary_names())
}

/// Find yt-dlp, which mpv's ytdl hook needs to resolve video ids.
/// Same search order as [`find_mpv_binary`] with `YT_DLP_PATH`.
pub fn find_yt_dlp_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("YT_DLP_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }
    if !should_use_system_deps() {
        if let Some(p) = find_beside_exe(yt_dlp_binary_names()) {
            return Some(p);
        }
    }
    find_on_path(yt_dlp_binary_names())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_namespaced() {
        assert!(data_dir().ends_with("lofi"));
        assert!(config_dir().ends_with("lofi"));
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_arg_points_at_socket() {
        let name = mpv_socket_name();
        assert!(name.ends_with(".sock"));
        assert_eq!(mpv_socket_arg(&name), format!("--input-ipc-server={name}"));
    }
}
