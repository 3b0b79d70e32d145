//! Persistence - flat JSON save/load of player state.
//!
//! The on-disk record sorts every set field so identical states always write
//! identical bytes. Loading is all-or-nothing: a failed load returns an error
//! and the caller keeps whatever state it already had.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use game_world::{PlayerState, DEFAULT_HANDLE, START_NODE};

/// Save/load failures, each displaying as its player-facing one-liner.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("No save file found.")]
    Missing,

    #[error("Save file I/O failed.")]
    Io(#[from] std::io::Error),

    #[error("Failed to load save file.")]
    Malformed(#[from] serde_json::Error),
}

fn default_handle() -> String {
    DEFAULT_HANDLE.to_string()
}

fn default_location() -> String {
    START_NODE.to_string()
}

/// The durable snapshot of a player, as written to disk.
///
/// Set fields serialize as lexicographically sorted sequences; `log` keeps
/// insertion order. Absent fields deserialize to fresh-state defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    #[serde(default = "default_handle")]
    pub handle: String,

    #[serde(default = "default_location")]
    pub location: String,

    #[serde(default)]
    pub inventory: Vec<String>,

    #[serde(default)]
    pub scripts: Vec<String>,

    #[serde(default)]
    pub flags: Vec<String>,

    #[serde(default)]
    pub discovered: Vec<String>,

    #[serde(default)]
    pub log: Vec<String>,

    #[serde(default)]
    pub visited: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cipher: Option<String>,

    #[serde(default)]
    pub ended: bool,
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut entries: Vec<String> = set.iter().cloned().collect();
    entries.sort();
    entries
}

impl SaveRecord {
    /// Snapshot live state into the durable record shape.
    pub fn from_state(state: &PlayerState) -> Self {
        Self {
            handle: state.handle.clone(),
            location: state.location.clone(),
            inventory: sorted(&state.inventory),
            scripts: sorted(&state.scripts),
            flags: sorted(&state.flags),
            discovered: sorted(&state.discovered),
            log: state.log.clone(),
            visited: sorted(&state.visited),
            last_cipher: state.last_cipher.clone(),
            ended: state.ended,
        }
    }

    /// Rebuild live state from the record.
    ///
    /// The discovered set always regains the current location, so the
    /// discovery invariant holds even for hand-trimmed records.
    pub fn into_state(self) -> PlayerState {
        let handle = if self.handle.trim().is_empty() {
            DEFAULT_HANDLE.to_string()
        } else {
            self.handle
        };
        let mut discovered: HashSet<String> = self.discovered.into_iter().collect();
        if !discovered.contains(&self.location) {
            discovered.insert(self.location.clone());
        }
        PlayerState {
            handle,
            location: self.location,
            inventory: self.inventory.into_iter().collect(),
            scripts: self.scripts.into_iter().collect(),
            flags: self.flags.into_iter().collect(),
            discovered,
            visited: self.visited.into_iter().collect(),
            log: self.log,
            last_cipher: self.last_cipher,
            ended: self.ended,
        }
    }
}

/// An injected persistence target: one save file at a known path.
#[derive(Debug, Clone)]
pub struct SaveFile {
    path: PathBuf,
}

impl SaveFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the full state, blocking until the file is closed.
    pub fn save(&self, state: &PlayerState) -> Result<(), PersistError> {
        let record = SaveRecord::from_state(state);
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    /// Read and rebuild a full state. Never partially applies anything.
    pub fn load(&self) -> Result<PlayerState, PersistError> {
        if !self.path.exists() {
            return Err(PersistError::Missing);
        }
        let raw = fs::read_to_string(&self.path)?;
        let record: SaveRecord = serde_json::from_str(&raw)?;
        debug!(path = %self.path.display(), "state loaded");
        Ok(record.into_state())
    }
}
