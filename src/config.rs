use crate::keymap::key_id_for_char;
use crate::layout::KeyId;
use crate::mastery::{MaskPolicy, STREAK_TO_HIDE};
use crate::mode::GameMode;
use crate::session::{SessionConfig, STREAK_TO_WIN};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Trailing history entries shown under the keyboard
pub const HISTORY_WINDOW: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Skip the mode screen and start in this mode
    pub mode: Option<GameMode>,
    pub policy: MaskPolicy,
    pub streak_to_hide: usize,
    pub streak_to_win: usize,
    pub history_window: usize,
    pub seed: Option<u64>,
    /// Global-order priority as the characters printed on the keys, e.g. "fjdksla;"
    pub priority: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: None,
            policy: MaskPolicy::default(),
            streak_to_hide: STREAK_TO_HIDE,
            streak_to_win: STREAK_TO_WIN,
            history_window: HISTORY_WINDOW,
            seed: None,
            priority: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            policy: self.policy,
            streak_to_hide: self.streak_to_hide,
            streak_to_win: self.streak_to_win,
            seed: self.seed,
            priority: self.priority_keys(),
        }
    }

    /// Characters without a key on the US layout are skipped.
    pub fn priority_keys(&self) -> Vec<KeyId> {
        self.priority
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter_map(key_id_for_char)
            .collect()
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "keyveil") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("keyveil_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable config: {e}");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
