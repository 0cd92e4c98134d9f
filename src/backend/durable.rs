use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Backend, BackendKind};
use crate::error::{Result, StoreError};

/// Persistent map backed by a JSON file.
///
/// The whole map lives in memory and is written out on `save` (or after every
/// mutation with auto-save). Writes go to a temp file first and are renamed
/// into place. Without a path the backend is memory-only.
#[derive(Debug)]
pub struct DurableBackend {
    path: Option<PathBuf>,
    data: BTreeMap<String, String>,
    auto_save: bool,
    backup_enabled: bool,
}

impl DurableBackend {
    /// Open or create the file at `path`. A missing or blank file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let data = Self::load(&path_buf)?;
        debug!(path = %path_buf.display(), entries = data.len(), "opened durable store");

        Ok(Self {
            path: Some(path_buf),
            data,
            auto_save: false,
            backup_enabled: false,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: BTreeMap::new(),
            auto_save: false,
            backup_enabled: false,
        }
    }

    /// Save after every set/remove and when dropped.
    pub fn with_auto_save(mut self) -> Self {
        self.auto_save = true;
        self
    }

    /// Copy the previous file to `.bak` before each save.
    pub fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_enabled = enabled;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StoreError::Io(io::Error::new(ErrorKind::InvalidData, e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Write the map to disk. No-op for a memory-only backend.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if self.backup_enabled && path.exists() {
            fs::copy(path, path.with_extension("bak"))?;
        }

        let json = serde_json::to_string_pretty(&self.data)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;

        debug!(path = %path.display(), entries = self.data.len(), "saved durable store");
        Ok(())
    }

    /// Replace the in-memory map with the file's contents.
    pub fn reload(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            self.data = Self::load(path)?;
        }
        Ok(())
    }

    fn after_write(&self) -> Result<()> {
        if self.auto_save {
            self.save()?;
        }
        Ok(())
    }
}

impl Backend for DurableBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Durable
    }

    fn set_item(&mut self, key: &str, value: &str, _expires_at: Option<i64>) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        self.after_write()
    }

    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.data.remove(key).is_some() {
            self.after_write()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.keys().cloned().collect())
    }
}

impl Drop for DurableBackend {
    fn drop(&mut self) {
        if self.auto_save {
            if let Err(e) = self.save() {
                warn!(error = %e, "failed to save durable store on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = DurableBackend::open(temp_file.path()).unwrap();
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let mut backend = DurableBackend::open(temp_file.path()).unwrap();
            backend.set_item("app.user", "{}", None).unwrap();
            backend.save().unwrap();
        }

        let backend = DurableBackend::open(temp_file.path()).unwrap();
        assert_eq!(backend.get_item("app.user").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_auto_save_on_drop() {
        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut backend = DurableBackend::open(&temp_path).unwrap().with_auto_save();
            backend.set_item("key", "value", None).unwrap();
        }

        let backend = DurableBackend::open(&temp_path).unwrap();
        assert_eq!(backend.get_item("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_backup() {
        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut backend = DurableBackend::open(&temp_path).unwrap();
            backend.set_item("initial", "data", None).unwrap();
            backend.save().unwrap();
        }
        {
            let mut backend = DurableBackend::open(&temp_path).unwrap().with_backup(true);
            backend.set_item("new", "data", None).unwrap();
            backend.save().unwrap();
        }

        assert!(temp_path.with_extension("bak").exists());
    }

    #[test]
    fn test_reload_discards_unsaved() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut backend = DurableBackend::open(temp_file.path()).unwrap();
        backend.set_item("a", "1", None).unwrap();
        backend.save().unwrap();
        backend.set_item("b", "2", None).unwrap();

        backend.reload().unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_corrupt_file() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "{not json").unwrap();
        assert!(matches!(
            DurableBackend::open(temp_file.path()),
            Err(StoreError::Io(_))
        ));
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let mut backend = DurableBackend::in_memory();
        backend.set_item("a", "1", None).unwrap();
        backend.save().unwrap();
        assert!(backend.path().is_none());
    }
}
