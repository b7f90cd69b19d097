use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::session::{SessionConfig, QUESTIONS_PER_LEVEL, QUESTION_TIME};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub questions_per_level: usize,
    pub question_secs: u64,
    /// How long the verdict stays up before the next question
    pub feedback_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            questions_per_level: QUESTIONS_PER_LEVEL,
            question_secs: QUESTION_TIME.as_secs(),
            feedback_millis: 1000,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            questions_per_level: self.questions_per_level.max(1),
            question_time: Duration::from_secs(self.question_secs.max(1)),
        }
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_millis)
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
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
            tracing::warn!(path = %self.path.display(), "ignoring unreadable config");
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
