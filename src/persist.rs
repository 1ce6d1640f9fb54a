use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::snapshot::CanvasSnapshot;

/// Durable key holding the canvas checkpoint.
pub const CANVAS_STATE_KEY: &str = "canvasState";
/// Durable key holding the saved-board list.
pub const IMAGES_KEY: &str = "images";

/// Errors that can occur during durable store operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to access durable store: {0}")]
    Io(#[from] std::io::Error),

    #[error("durable store unavailable: {0}")]
    Unavailable(String),
}

/// A durable mapping from string keys to serialized values.
///
/// Readers must tolerate absent keys; there is no schema versioning.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory store: the fallback when durable storage is unavailable, and
/// the store used by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store keeping one JSON document per key under a state
/// directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Opens the store, creating the state directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    // Keys are fixed internal identifiers, safe to embed in a file name.
    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(value)?;
        std::fs::write(self.key_path(key), json)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// A saved-board record kept under [`IMAGES_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedImage {
    pub id: Uuid,
    pub name: String,
    /// The board's snapshot data URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SavedImage {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            desc: None,
            tags: None,
            color: None,
        }
    }
}

/// Checkpoints the canvas bitmap to the durable store and restores it on
/// startup.
///
/// Writes are scheduled off the input path and are last-write-wins: an older
/// write landing after a newer one is a rare, harmless race corrected by the
/// next pointer-up. Storage failures degrade the session to in-memory
/// operation and are logged, never fatal.
#[derive(Clone)]
pub struct CheckpointGateway {
    store: Arc<Mutex<Box<dyn KeyValueStore>>>,
}

impl CheckpointGateway {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Writes the checkpoint synchronously, replacing any prior value.
    pub fn write_checkpoint(&self, snapshot: &CanvasSnapshot) -> Result<(), PersistenceError> {
        self.store.lock().set(CANVAS_STATE_KEY, snapshot.as_data_url())
    }

    /// Schedules a checkpoint write without blocking input handling.
    pub fn schedule_checkpoint(&self, snapshot: CanvasSnapshot) {
        let gateway = self.clone();
        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(move || {
            if let Err(err) = gateway.write_checkpoint(&snapshot) {
                log::warn!("checkpoint write failed, continuing in-memory: {err}");
            }
        });
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = gateway.write_checkpoint(&snapshot) {
                log::warn!("checkpoint write failed, continuing in-memory: {err}");
            }
        });
    }

    /// Loads the durable checkpoint, if one exists and parses.
    pub fn restore(&self) -> Option<CanvasSnapshot> {
        match self.store.lock().get(CANVAS_STATE_KEY) {
            Ok(Some(url)) => match CanvasSnapshot::from_data_url(url) {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    log::warn!("ignoring malformed checkpoint: {err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                log::warn!("checkpoint restore failed: {err}");
                None
            }
        }
    }

    pub fn has_checkpoint(&self) -> bool {
        matches!(self.store.lock().get(CANVAS_STATE_KEY), Ok(Some(_)))
    }

    /// Deletes the durable checkpoint.
    pub fn clear_checkpoint(&self) -> Result<(), PersistenceError> {
        self.store.lock().remove(CANVAS_STATE_KEY)
    }

    /// The saved-board list; absent or unreadable data yields an empty list.
    pub fn saved_images(&self) -> Vec<SavedImage> {
        match self.store.lock().get(IMAGES_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|err| {
                log::warn!("ignoring malformed saved-board list: {err}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                log::warn!("saved-board list read failed: {err}");
                Vec::new()
            }
        }
    }

    /// Appends a saved-board record under a single store lock.
    pub fn push_saved_image(&self, record: SavedImage) -> Result<(), PersistenceError> {
        let mut store = self.store.lock();
        let mut images: Vec<SavedImage> = match store.get(IMAGES_KEY)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_default(),
            None => Vec::new(),
        };
        images.push(record);
        store.set(IMAGES_KEY, &serde_json::to_string(&images)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;
    use egui::Color32;

    fn snapshot() -> CanvasSnapshot {
        CanvasSnapshot::of_surface(&Surface::new_filled(4, 4, Color32::WHITE)).unwrap()
    }

    #[test]
    fn checkpoint_lifecycle() {
        let gateway = CheckpointGateway::new(Box::new(MemoryStore::new()));
        assert!(gateway.restore().is_none());

        gateway.write_checkpoint(&snapshot()).unwrap();
        assert!(gateway.has_checkpoint());
        assert_eq!(gateway.restore().unwrap(), snapshot());

        gateway.clear_checkpoint().unwrap();
        assert!(!gateway.has_checkpoint());
        assert!(gateway.restore().is_none());
    }

    #[test]
    fn checkpoint_is_last_write_wins() {
        let gateway = CheckpointGateway::new(Box::new(MemoryStore::new()));
        let first = CanvasSnapshot::of_surface(&Surface::new_filled(4, 4, Color32::RED)).unwrap();
        gateway.write_checkpoint(&first).unwrap();
        gateway.write_checkpoint(&snapshot()).unwrap();
        assert_eq!(gateway.restore().unwrap(), snapshot());
    }

    #[test]
    fn saved_images_tolerate_absent_key() {
        let gateway = CheckpointGateway::new(Box::new(MemoryStore::new()));
        assert!(gateway.saved_images().is_empty());
    }

    #[test]
    fn saved_images_append_and_round_trip() {
        let gateway = CheckpointGateway::new(Box::new(MemoryStore::new()));
        let record = SavedImage::new("sketch", "data:image/png;base64,AA==");
        gateway.push_saved_image(record.clone()).unwrap();
        gateway
            .push_saved_image(SavedImage::new("second", "data:image/png;base64,BB=="))
            .unwrap();

        let images = gateway.saved_images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], record);
        assert_eq!(images[1].name, "second");
    }

    #[test]
    fn file_store_round_trips_and_tolerates_missing_keys() {
        let dir = std::env::temp_dir().join(format!("inkboard-test-{}", Uuid::new_v4()));
        let mut store = JsonFileStore::open(&dir).unwrap();

        assert!(store.get("missing").unwrap().is_none());
        store.set(CANVAS_STATE_KEY, "data:image/png;base64,AA==").unwrap();
        assert_eq!(
            store.get(CANVAS_STATE_KEY).unwrap().as_deref(),
            Some("data:image/png;base64,AA==")
        );
        store.remove(CANVAS_STATE_KEY).unwrap();
        assert!(store.get(CANVAS_STATE_KEY).unwrap().is_none());
        // Removing twice is fine.
        store.remove(CANVAS_STATE_KEY).unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }
}
