//! Save/load of farm state.
//!
//! A [`SaveDocument`] snapshots every planting spot in grid order and the
//! inventory in slot order. It is stored as JSON through a
//! [`DocumentStorage`] medium. Loading parses and validates the whole
//! document before touching live state, so a failed load changes nothing.
//!
//! Crop stages are not re-derived from elapsed time on load: the stored
//! `watered` flag is applied verbatim.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use farmstead_common::{SchemaVersion, SpotId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::grid::FarmGrid;
use crate::inventory::Inventory;
use crate::item::{display_name_for, ItemStack};
use crate::planting::SpotState;

/// Default save file name.
pub const DEFAULT_SAVE_FILE: &str = "farm_save.json";

/// Errors that can occur during save/load operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Nothing has been saved yet
    #[error("Save not found: {0}")]
    NotFound(String),

    /// Document written by a newer, incompatible format
    #[error("Incompatible save version: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes
        expected: SchemaVersion,
        /// Version found in the document
        found: SchemaVersion,
    },

    /// Document could not be parsed
    #[error("Save file corrupted: {0}")]
    Corrupted(String),
}

/// Result type for save operations.
pub type SaveResult<T> = Result<T, SaveError>;

/// Saved inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    /// Item kind
    pub kind: String,
    /// Display name (re-derived from the kind when empty)
    #[serde(default)]
    pub display_name: String,
    /// Item count
    pub count: i32,
}

impl SlotState {
    /// Snapshot of a stack.
    #[must_use]
    pub fn from_stack(stack: &ItemStack) -> Self {
        let count = i32::try_from(stack.count).unwrap_or_else(|_| {
            warn!(kind = %stack.kind, count = stack.count, "stack count clamped for save");
            i32::MAX
        });
        Self {
            kind: stack.kind.clone(),
            display_name: stack.display_name.clone(),
            count,
        }
    }

    /// Rebuilds the stack, or None if the count is not positive.
    #[must_use]
    pub fn to_stack(&self) -> Option<ItemStack> {
        let count = u32::try_from(self.count).ok().filter(|count| *count > 0)?;
        let display_name = if self.display_name.is_empty() {
            display_name_for(&self.kind)
        } else {
            self.display_name.clone()
        };
        Some(ItemStack::new(self.kind.clone(), display_name, count))
    }
}

/// Persisted farm state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    /// Document format version
    #[serde(default)]
    pub version: SchemaVersion,
    /// Save time (Unix seconds)
    #[serde(default)]
    pub saved_at: f64,
    /// Spot states in grid order
    #[serde(default)]
    pub spots: Vec<SpotState>,
    /// Inventory slots in slot order
    #[serde(default)]
    pub inventory: Vec<Option<SlotState>>,
}

/// Summary of an applied load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Spots that received a crop
    pub restored_spots: usize,
    /// Stored spot entries beyond the live grid size
    pub dropped_entries: usize,
    /// Live cells with no stored entry (left empty)
    pub unfilled_cells: usize,
    /// Occupied inventory slots after the load
    pub inventory_slots: usize,
    /// Stored inventory entries that did not fit
    pub dropped_slots: usize,
}

impl SaveDocument {
    /// Captures the current grid and inventory.
    #[must_use]
    pub fn capture(grid: &FarmGrid, inventory: &Inventory, now: f64) -> Self {
        Self {
            version: SchemaVersion::SAVE_DOCUMENT,
            saved_at: now,
            spots: grid.states(),
            inventory: inventory
                .slots()
                .iter()
                .map(|slot| slot.as_ref().map(SlotState::from_stack))
                .collect(),
        }
    }

    /// Serializes to pretty JSON.
    pub fn to_bytes(&self) -> SaveResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| SaveError::Serialization(e.to_string()))
    }

    /// Deserializes from JSON and checks the version.
    pub fn from_bytes(bytes: &[u8]) -> SaveResult<Self> {
        let document: Self =
            serde_json::from_slice(bytes).map_err(|e| SaveError::Corrupted(e.to_string()))?;

        if !SchemaVersion::SAVE_DOCUMENT.is_compatible_with(&document.version) {
            return Err(SaveError::VersionMismatch {
                expected: SchemaVersion::SAVE_DOCUMENT,
                found: document.version,
            });
        }

        Ok(document)
    }

    /// Applies the document to live state, by position.
    ///
    /// The grid is cleared first, then stored spots are restored in order.
    /// Extra stored spots are dropped and live spots without an entry stay
    /// empty. The inventory slot sequence is replaced wholesale.
    pub fn apply(&self, grid: &mut FarmGrid, inventory: &mut Inventory) -> LoadReport {
        let live = grid.len();
        let stored = self.spots.len();

        grid.clear_all();
        let mut restored_spots = 0;
        for (index, state) in self.spots.iter().take(live).enumerate() {
            if grid.load_state(SpotId::from_index(index), state) {
                restored_spots += 1;
            }
        }

        let dropped_entries = stored.saturating_sub(live);
        let unfilled_cells = live.saturating_sub(stored);
        if dropped_entries > 0 || unfilled_cells > 0 {
            warn!(stored, live, "save grid size differs from live grid");
        }

        let dropped_slots = inventory.restore_slots(
            self.inventory
                .iter()
                .map(|slot| slot.as_ref().and_then(SlotState::to_stack)),
        );

        LoadReport {
            restored_spots,
            dropped_entries,
            unfilled_cells,
            inventory_slots: inventory.occupied_count(),
            dropped_slots,
        }
    }
}

/// A medium that holds one save document.
pub trait DocumentStorage {
    /// Reads the stored bytes, or `NotFound` if nothing was saved.
    fn read_document(&self) -> SaveResult<Vec<u8>>;

    /// Replaces the stored bytes.
    fn write_document(&mut self, bytes: &[u8]) -> SaveResult<()>;
}

/// Stores the document in a file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Creates a storage backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a storage for the default save file in `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_SAVE_FILE))
    }

    /// Gets the save file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the path for the temporary file used during writes.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl DocumentStorage for FileStorage {
    fn read_document(&self) -> SaveResult<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SaveError::NotFound(self.path.display().to_string()))
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Uses atomic write (write to temp, then rename) for safety.
    fn write_document(&mut self, bytes: &[u8]) -> SaveResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

/// Keeps the document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    bytes: Option<Vec<u8>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that already holds a document.
    #[must_use]
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    /// Stored bytes, if any.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl DocumentStorage for MemoryStorage {
    fn read_document(&self) -> SaveResult<Vec<u8>> {
        self.bytes
            .clone()
            .ok_or_else(|| SaveError::NotFound("memory".to_string()))
    }

    fn write_document(&mut self, bytes: &[u8]) -> SaveResult<()> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }
}

/// Saves and loads farm state through a storage medium.
#[derive(Debug)]
pub struct Persistence<S> {
    storage: S,
}

impl<S: DocumentStorage> Persistence<S> {
    /// Creates a persistence layer over `storage`.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Gets the storage medium.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes the current grid and inventory.
    ///
    /// Live state is never modified, even when the write fails.
    pub fn save(&mut self, grid: &FarmGrid, inventory: &Inventory, now: f64) -> SaveResult<()> {
        let document = SaveDocument::capture(grid, inventory, now);
        let bytes = document.to_bytes()?;
        self.storage.write_document(&bytes)?;

        info!(
            spots = document.spots.len(),
            planted = grid.planted_count(),
            bytes = bytes.len(),
            "saved farm"
        );
        Ok(())
    }

    /// Reads the stored document and applies it.
    pub fn load(&self, grid: &mut FarmGrid, inventory: &mut Inventory) -> SaveResult<LoadReport> {
        let bytes = self.storage.read_document()?;
        let document = SaveDocument::from_bytes(&bytes)?;
        let report = document.apply(grid, inventory);

        info!(
            restored = report.restored_spots,
            inventory_slots = report.inventory_slots,
            version = %document.version,
            "loaded farm"
        );
        Ok(report)
    }
}
