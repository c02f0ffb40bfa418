//! Persistent save state
//!
//! One flat string-keyed map, serialized as a single JSON blob. Every write
//! goes straight through to the backing store; there is no explicit save
//! button anywhere in the game. A corrupt or missing blob degrades to an
//! empty save, never a crash.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use macroquad::logging::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key namespace. All progress lives under these.
pub mod keys {
    pub const GOLD: &str = "gold";
    pub const PICKAXE_LEVEL: &str = "pickaxe-level";
    pub const LANTERN_LEVEL: &str = "lantern-level";
    pub const BOOTS_OWNED: &str = "boots-owned";
    pub const LUCKY_CHARM_OWNED: &str = "lucky-charm-owned";
    pub const INVENTORY: &str = "player-inventory";
    pub const LEVEL_INDEX: &str = "level-index";
}

#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "save store i/o error: {}", e),
            SaveError::Parse(e) => write!(f, "save blob is not valid JSON: {}", e),
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Parse(e)
    }
}

/// Where the blob lives. The game never cares which one it got.
pub trait SaveBackend {
    /// `Ok(None)` means no save exists yet.
    fn load(&self) -> Result<Option<String>, SaveError>;
    fn store(&self, blob: &str) -> Result<(), SaveError>;
}

/// Blob in a file next to the executable. Native builds.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SaveBackend for FileBackend {
    fn load(&self) -> Result<Option<String>, SaveError> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, blob: &str) -> Result<(), SaveError> {
        std::fs::write(&self.path, blob)?;
        Ok(())
    }
}

/// Blob held in memory. Web builds (progress lasts for the session) and
/// tests.
#[derive(Default)]
pub struct MemoryBackend {
    blob: RefCell<Option<String>>,
}

impl SaveBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, SaveError> {
        Ok(self.blob.borrow().clone())
    }

    fn store(&self, blob: &str) -> Result<(), SaveError> {
        *self.blob.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_backend() -> Box<dyn SaveBackend> {
    Box::new(FileBackend::new("deeplight-save.json"))
}

#[cfg(target_arch = "wasm32")]
pub fn default_backend() -> Box<dyn SaveBackend> {
    Box::new(MemoryBackend::default())
}

pub struct SaveState {
    values: BTreeMap<String, serde_json::Value>,
    backend: Box<dyn SaveBackend>,
}

impl SaveState {
    /// Load the blob from the backend. Any failure logs and starts empty.
    pub fn open(backend: Box<dyn SaveBackend>) -> Self {
        let values = match backend.load() {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(values) => values,
                Err(e) => {
                    warn!("discarding unreadable save: {}", e);
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("could not load save: {}", e);
                BTreeMap::new()
            }
        };
        Self { values, backend }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Set a value and write the whole blob through to the backend.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.values.insert(key.to_string(), value);
                self.write_through();
            }
            Err(e) => warn!("could not serialize save value for '{}': {}", key, e),
        }
    }

    pub fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.write_through();
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.write_through();
    }

    fn write_through(&self) {
        let blob = match serde_json::to_string(&self.values) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("could not serialize save blob: {}", e);
                return;
            }
        };
        if let Err(e) = self.backend.store(&blob) {
            warn!("could not persist save: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        {
            let mut save = SaveState::open(Box::new(FileBackend::new(&path)));
            save.set(keys::GOLD, 42u32);
            save.set(keys::BOOTS_OWNED, true);
        }

        let save = SaveState::open(Box::new(FileBackend::new(&path)));
        assert_eq!(save.get::<u32>(keys::GOLD), Some(42));
        assert_eq!(save.get::<bool>(keys::BOOTS_OWNED), Some(true));
        assert_eq!(save.get::<u32>(keys::PICKAXE_LEVEL), None);
    }

    #[test]
    fn corrupt_blob_degrades_to_empty_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        std::fs::write(&path, "{not json!").unwrap();

        let mut save = SaveState::open(Box::new(FileBackend::new(&path)));
        assert_eq!(save.get::<u32>(keys::GOLD), None);

        // Still usable after the bad load
        save.set(keys::GOLD, 7u32);
        let save = SaveState::open(Box::new(FileBackend::new(&path)));
        assert_eq!(save.get::<u32>(keys::GOLD), Some(7));
    }

    #[test]
    fn wrong_typed_reads_return_none() {
        let mut save = SaveState::open(Box::new(MemoryBackend::default()));
        save.set(keys::GOLD, "not a number");
        assert_eq!(save.get::<u32>(keys::GOLD), None);
    }

    #[test]
    fn clear_wipes_everything() {
        let mut save = SaveState::open(Box::new(MemoryBackend::default()));
        save.set(keys::GOLD, 10u32);
        save.set(keys::LEVEL_INDEX, 2u32);
        save.clear();
        assert_eq!(save.get::<u32>(keys::GOLD), None);
        assert_eq!(save.get::<u32>(keys::LEVEL_INDEX), None);
    }

    #[test]
    fn get_or_falls_back() {
        let save = SaveState::open(Box::new(MemoryBackend::default()));
        assert_eq!(save.get_or(keys::PICKAXE_LEVEL, 0u32), 0);
    }
}
