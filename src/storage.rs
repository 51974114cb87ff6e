use crate::model::{NotificationSettings, Seed};
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key under which notification settings are stored.
pub const SETTINGS_KEY: &str = "notificationSettings";
pub const STORAGE_FILE: &str = "storage.json";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("reading {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("writing {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("parsing {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("encoding value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key-value storage, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

/// JSON object on disk mapping keys to string values.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let serialized = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, serialized).map_err(write_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        // an unreadable file is replaced rather than blocking the write
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }
}

/// Loads settings, falling back to the defaults when the entry is absent,
/// unreadable or malformed.
pub fn load_notification_settings(store: &dyn KeyValueStore) -> NotificationSettings {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return NotificationSettings::default(),
        Err(err) => {
            warn!(error = %err, "could not read notification settings, using defaults");
            return NotificationSettings::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = %err, "malformed notification settings, using defaults");
            NotificationSettings::default()
        }
    }
}

pub fn save_notification_settings(
    store: &mut dyn KeyValueStore,
    settings: &NotificationSettings,
) -> Result<(), StorageError> {
    let value = serde_json::to_string(settings)?;
    store.set(SETTINGS_KEY, value)
}

/// Hook for [`crate::state::AppState::set_settings_hook`]. Write failures are
/// logged and otherwise ignored; the in-memory settings stay authoritative.
pub fn persist_settings_hook<S>(mut store: S) -> impl FnMut(&NotificationSettings)
where
    S: KeyValueStore + 'static,
{
    move |settings| match save_notification_settings(&mut store, settings) {
        Ok(()) => debug!("notification settings saved"),
        Err(err) => warn!(error = %err, "failed to persist notification settings"),
    }
}

/// Directory holding the storage file: the override when given, otherwise
/// the platform data directory.
pub fn data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    let dirs = ProjectDirs::from("", "", "taskpro").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

pub fn load_seed(path: &Path) -> Result<Seed> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let seed: Seed = serde_yaml::from_str(&data).context("parsing seed file")?;
    if seed.is_empty() {
        warn!(path = %path.display(), "seed file has no sections, using demo data");
    }
    if let Some(categories) = &seed.categories {
        ensure_unique_ids("category", categories.iter().map(|c| c.id.as_str()))?;
    }
    if let Some(tasks) = &seed.tasks {
        ensure_unique_ids("task", tasks.iter().map(|t| t.id.as_str()))?;
    }
    if let Some(notifications) = &seed.notifications {
        ensure_unique_ids("notification", notifications.iter().map(|n| n.id.as_str()))?;
    }
    Ok(seed)
}

fn ensure_unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            bail!("seed file has duplicate {} id {:?}", kind, id);
        }
    }
    Ok(())
}
