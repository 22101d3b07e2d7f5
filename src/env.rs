use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "other-apps";

/// Returns the root directory used by the panel for settings.
pub fn default_app_dir() -> PathBuf {
    let base = match env::consts::OS {
        "windows" => env::var_os("APPDATA")
            .or_else(|| env::var_os("LOCALAPPDATA"))
            .map(PathBuf::from),
        "macos" => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join("Library").join("Application Support")),
        _ => env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR_NAME)
}

/// Returns the host's cache directory convention for the panel data.
pub fn default_cache_dir() -> PathBuf {
    let base = match env::consts::OS {
        "windows" => env::var_os("LOCALAPPDATA")
            .or_else(|| env::var_os("APPDATA"))
            .map(PathBuf::from),
        "macos" => env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join("Library").join("Caches")),
        _ => env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache"))),
    }
    .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_DIR_NAME)
}

pub fn config_path() -> PathBuf {
    default_app_dir().join("config.json")
}

/// Create the on-disk folder layout expected by the panel.
pub fn ensure_dirs(cache_dir: &std::path::Path) -> std::io::Result<()> {
    for dir in [default_app_dir(), cache_dir.to_path_buf()] {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
