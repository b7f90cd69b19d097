use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::app_dirs::{AppDirs, PROGRESS_KEY};
use crate::error::StoreError;
use crate::progress::Progress;

/// Whole-blob persistence for [`Progress`]
pub trait ProgressStore {
    /// `Ok(None)` when nothing has been stored yet
    fn read_blob(&self) -> Result<Option<String>, StoreError>;
    fn write_blob(&self, blob: &str) -> Result<(), StoreError>;

    fn load(&self) -> Result<Option<Progress>, StoreError> {
        match self.read_blob()? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    fn save(&self, progress: &Progress) -> Result<(), StoreError> {
        let blob = serde_json::to_string(progress)?;
        self.write_blob(&blob)
    }
}

/// Loads the stored progress, falling back to (and persisting) defaults when
/// the blob is missing, unreadable or corrupt.
pub fn load_or_default(store: &dyn ProgressStore, today: NaiveDate) -> Progress {
    let loaded = match store.load() {
        Ok(Some(mut progress)) => {
            if progress.normalize() {
                persist(store, &progress);
            }
            return progress;
        }
        Ok(None) => {
            info!("no stored progress, starting fresh");
            Progress::new(today)
        }
        Err(e) => {
            warn!(error = %e, "stored progress unusable, resetting to defaults");
            Progress::new(today)
        }
    };
    persist(store, &loaded);
    loaded
}

/// Saves and logs failures; the in-memory state stays authoritative.
pub fn persist(store: &dyn ProgressStore, progress: &Progress) {
    if let Err(e) = store.save(progress) {
        warn!(error = %e, "failed to save progress");
    }
}

#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::progress_path()
            .unwrap_or_else(|| PathBuf::from(format!("{PROGRESS_KEY}.json")));
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

impl Default for FileProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for FileProgressStore {
    fn read_blob(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) if blob.trim().is_empty() => Ok(None),
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_blob(&self, blob: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, blob)?;
        Ok(())
    }
}

/// In-process store keeping the serialized blob, shareable between handles
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    blob: Rc<RefCell<Option<String>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Rc::new(RefCell::new(Some(blob.into()))),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn read_blob(&self) -> Result<Option<String>, StoreError> {
        Ok(self.blob.borrow().clone())
    }

    fn write_blob(&self, blob: &str) -> Result<(), StoreError> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}
