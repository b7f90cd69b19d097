use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_NAME: &str = "mathdrill";

/// Fixed key the progress blob is stored under
pub const PROGRESS_KEY: &str = "progress_v1";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn progress_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(format!("{PROGRESS_KEY}.json")))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(format!("{APP_NAME}.log")))
    }

    pub fn config_path() -> PathBuf {
        match ProjectDirs::from("", "", APP_NAME) {
            Some(pd) => pd.config_dir().join("config.json"),
            None => PathBuf::from(format!("{APP_NAME}_config.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_file_is_named_after_the_key() {
        if let Some(path) = AppDirs::progress_path() {
            assert_eq!(path.file_name().unwrap(), "progress_v1.json");
            assert!(path.to_string_lossy().contains(APP_NAME));
        }
    }

    #[test]
    fn config_file_name() {
        assert!(AppDirs::config_path().ends_with("config.json")
            || AppDirs::config_path().ends_with("mathdrill_config.json"));
    }
}
