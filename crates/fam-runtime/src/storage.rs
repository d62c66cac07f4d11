//! Persistent homes for battery-backed save RAM.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, warn};

/// Key/value store answering the core's storage requests.
///
/// Neither operation can fail from the core's point of view: a missing or
/// unreadable entry loads as zeros and a failed save is only logged.
pub trait Storage: Send {
    /// Returns exactly `size` bytes stored under `key`.
    fn load(&mut self, key: &str, size: usize) -> Vec<u8>;
    fn save(&mut self, key: &str, data: &[u8]);
}

/// One `<key>.sav` file per cartridge inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.sav"))
    }

    fn write(&self, key: &str, data: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), data)
    }
}

impl Storage for FileStorage {
    fn load(&mut self, key: &str, size: usize) -> Vec<u8> {
        let path = self.path_for(key);
        let mut data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no save file yet");
                Vec::new()
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read save file");
                Vec::new()
            }
        };
        data.resize(size, 0);
        data
    }

    fn save(&mut self, key: &str, data: &[u8]) {
        match self.write(key, data) {
            Ok(()) => debug!(key, len = data.len(), "save RAM written"),
            Err(err) => warn!(path = %self.path_for(key).display(), %err, "failed to write save file"),
        }
    }
}

/// In-process storage. Clones share the same entries, so a caller can keep
/// one to inspect what a runtime wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, data: Vec<u8>) {
        self.entries.lock().insert(key.into(), data);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn load(&mut self, key: &str, size: usize) -> Vec<u8> {
        let mut data = self.get(key).unwrap_or_default();
        data.resize(size, 0);
        data
    }

    fn save(&mut self, key: &str, data: &[u8]) {
        self.insert(key, data.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fam-runtime-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_loads_as_zeros() {
        let dir = scratch_dir("missing");
        let mut storage = FileStorage::new(&dir);
        assert_eq!(storage.load("absent", 4), vec![0; 4]);
        assert!(!dir.exists());
    }

    #[test]
    fn file_round_trip_is_resized_to_the_request() {
        let dir = scratch_dir("round-trip");
        let mut storage = FileStorage::new(&dir);
        storage.save("abc", &[1, 2, 3]);
        assert!(storage.path_for("abc").exists());
        assert_eq!(storage.load("abc", 5), vec![1, 2, 3, 0, 0]);
        assert_eq!(storage.load("abc", 2), vec![1, 2]);
        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn memory_clones_share_entries() {
        let storage = MemoryStorage::new();
        let mut writer = storage.clone();
        writer.save("k", &[9]);
        assert_eq!(storage.get("k"), Some(vec![9]));
        assert_eq!(writer.load("k", 3), vec![9, 0, 0]);
        assert_eq!(storage.len(), 1);
    }
}
