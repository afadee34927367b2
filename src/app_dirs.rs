use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Log file under `$HOME/.local/state/keyveil`, or the platform data dir
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("keyveil");
            Some(state_dir.join("keyveil.log"))
        } else {
            ProjectDirs::from("", "", "keyveil")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("keyveil.log"))
        }
    }
}
