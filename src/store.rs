//! Document store: fighter entries in memory, persisted as a JSON snapshot.
//!
//! One document per (discipline, fighter). Every mutation rewrites the
//! snapshot file when one is configured; destructive imports write a
//! timestamped backup of the previous contents first.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::models::{CategoryMap, Combat, CombatId, CombatPatch, FighterEntry, Status};

/// Backup files are named `brackets_backup_{millis}.json`.
const BACKUP_PREFIX: &str = "brackets_backup_";

/// Errors from store operations.
#[derive(Debug)]
pub enum StoreError {
    /// No entry with this document id.
    EntryNotFound(String),
    /// No combat with this id in the entry.
    CombatNotFound(CombatId),
    /// Snapshot/backup file could not be read or written.
    Io(std::io::Error),
    /// Snapshot/backup file is not valid JSON for the expected shape.
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::EntryNotFound(id) => write!(f, "No entry with id {id}"),
            StoreError::CombatNotFound(id) => write!(f, "No combat with id {id}"),
            StoreError::Io(e) => write!(f, "Store file error: {e}"),
            StoreError::Json(e) => write!(f, "Store data error: {e}"),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

/// Outcome of a category backfill: how many combats were updated vs. already set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct FillReport {
    pub updated: usize,
    pub skipped: usize,
}

/// The bracket collection. All reads and writes go through here; the web
/// layer wraps it in a `RwLock`.
pub struct BracketStore {
    entries: HashMap<String, FighterEntry>,
    path: Option<PathBuf>,
}

impl BracketStore {
    /// In-memory store with no snapshot file (tests, dry runs).
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            path: None,
        }
    }

    /// Store backed by a snapshot file; loads it when it already exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let data = fs::read_to_string(&path)?;
            index_entries(serde_json::from_str(&data)?)
        } else {
            HashMap::new()
        };
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    pub fn entries(&self) -> &HashMap<String, FighterEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, doc_id: &str) -> Option<&FighterEntry> {
        self.entries.get(doc_id)
    }

    /// Insert or replace one entry. Returns its document id.
    pub fn upsert_entry(&mut self, mut entry: FighterEntry) -> Result<String, StoreError> {
        entry.stamp_combats();
        let doc_id = entry.doc_id();
        self.entries.insert(doc_id.clone(), entry);
        self.save()?;
        Ok(doc_id)
    }

    pub fn delete_entry(&mut self, doc_id: &str) -> Result<(), StoreError> {
        if self.entries.remove(doc_id).is_none() {
            return Err(StoreError::EntryNotFound(doc_id.to_string()));
        }
        self.save()
    }

    /// Remove every entry (the "clear all" admin action).
    pub fn clear_all(&mut self) -> Result<usize, StoreError> {
        let removed = self.entries.len();
        self.entries.clear();
        self.save()?;
        Ok(removed)
    }

    /// Append a combat to an entry; the combat inherits the entry's fighter
    /// name when it has none.
    pub fn add_combat(&mut self, doc_id: &str, mut combat: Combat) -> Result<FighterEntry, StoreError> {
        let entry = self
            .entries
            .get_mut(doc_id)
            .ok_or_else(|| StoreError::EntryNotFound(doc_id.to_string()))?;
        if combat.fighter.is_empty() {
            combat.fighter = entry.fighter.clone();
        }
        entry.combats.push(combat);
        let updated = entry.clone();
        self.save()?;
        Ok(updated)
    }

    /// Partial edit of one combat's fields.
    pub fn update_combat(
        &mut self,
        doc_id: &str,
        combat_id: CombatId,
        patch: &CombatPatch,
    ) -> Result<FighterEntry, StoreError> {
        let entry = self
            .entries
            .get_mut(doc_id)
            .ok_or_else(|| StoreError::EntryNotFound(doc_id.to_string()))?;
        let combat = entry
            .combat_mut(combat_id)
            .ok_or(StoreError::CombatNotFound(combat_id))?;
        patch.apply(combat);
        let updated = entry.clone();
        self.save()?;
        Ok(updated)
    }

    pub fn remove_combat(&mut self, doc_id: &str, combat_id: CombatId) -> Result<FighterEntry, StoreError> {
        let entry = self
            .entries
            .get_mut(doc_id)
            .ok_or_else(|| StoreError::EntryNotFound(doc_id.to_string()))?;
        let before = entry.combats.len();
        entry.combats.retain(|c| c.id != combat_id);
        if entry.combats.len() == before {
            return Err(StoreError::CombatNotFound(combat_id));
        }
        let updated = entry.clone();
        self.save()?;
        Ok(updated)
    }

    /// Record a result for one combat.
    ///
    /// On `Lost`, the entry's combats at strictly later stages are flagged
    /// `hidden_after_loss` so the board drops them immediately. Recording a
    /// non-lost result lifts the flags within the entry again.
    pub fn set_status(
        &mut self,
        doc_id: &str,
        combat_id: CombatId,
        status: Status,
    ) -> Result<FighterEntry, StoreError> {
        let entry = self
            .entries
            .get_mut(doc_id)
            .ok_or_else(|| StoreError::EntryNotFound(doc_id.to_string()))?;
        let stage = entry
            .combat(combat_id)
            .ok_or(StoreError::CombatNotFound(combat_id))?
            .stage;
        for c in &mut entry.combats {
            if c.id == combat_id {
                c.status = status;
            }
            if status == Status::Lost {
                if c.stage.index() > stage.index() {
                    c.hidden_after_loss = true;
                }
            } else {
                c.hidden_after_loss = false;
            }
        }
        let updated = entry.clone();
        self.save()?;
        Ok(updated)
    }

    /// Set every combat back to not played and lift all hidden flags.
    pub fn reset_statuses(&mut self) -> Result<(), StoreError> {
        for entry in self.entries.values_mut() {
            for c in &mut entry.combats {
                c.status = Status::NotPlayed;
                c.hidden_after_loss = false;
            }
        }
        self.save()
    }

    /// Backfill missing weight categories from a fighter -> category map.
    /// Combats that already carry a category are left alone.
    pub fn fill_categories(&mut self, categories: &CategoryMap) -> Result<FillReport, StoreError> {
        let mut report = FillReport::default();
        for entry in self.entries.values_mut() {
            for c in &mut entry.combats {
                if !c.category.is_empty() {
                    report.skipped += 1;
                    continue;
                }
                match categories.get(&c.fighter) {
                    Some(category) => {
                        c.category = category.clone();
                        report.updated += 1;
                    }
                    None => report.skipped += 1,
                }
            }
        }
        self.save()?;
        Ok(report)
    }

    /// Replace the whole collection. When the store is file-backed and not
    /// empty, the previous contents are written to a timestamped backup file
    /// first; its path is returned.
    pub fn replace_all_with_backup(
        &mut self,
        entries: Vec<FighterEntry>,
    ) -> Result<Option<PathBuf>, StoreError> {
        let backup = if !self.entries.is_empty() {
            self.write_backup()?
        } else {
            None
        };
        self.entries = index_entries(entries);
        self.save()?;
        Ok(backup)
    }

    /// Replace the collection from a backup/snapshot file.
    pub fn restore_from_file(&mut self, path: &Path) -> Result<usize, StoreError> {
        let data = fs::read_to_string(path)?;
        let entries: Vec<FighterEntry> = serde_json::from_str(&data)?;
        let count = entries.len();
        self.entries = index_entries(entries);
        self.save()?;
        Ok(count)
    }

    /// Current collection as the snapshot JSON (also the backup download body).
    pub fn snapshot_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.sorted_entries())?)
    }

    /// Directory backup files are written to (next to the snapshot file).
    pub fn backup_dir(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        // A bare file name has an empty parent; backups then go to the cwd.
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Some(dir)
    }

    fn write_backup(&self) -> Result<Option<PathBuf>, StoreError> {
        let Some(dir) = self.backup_dir() else {
            return Ok(None);
        };
        let name = format!("{BACKUP_PREFIX}{}.json", Utc::now().timestamp_millis());
        let path = dir.join(name);
        fs::write(&path, self.snapshot_json()?)?;
        log::info!("Backup written to {}", path.display());
        Ok(Some(path))
    }

    fn sorted_entries(&self) -> Vec<&FighterEntry> {
        let mut list: Vec<(&String, &FighterEntry)> = self.entries.iter().collect();
        list.sort_by(|a, b| a.0.cmp(b.0));
        list.into_iter().map(|(_, e)| e).collect()
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_string_pretty(&self.sorted_entries())?)?;
        }
        Ok(())
    }
}

impl Default for BracketStore {
    fn default() -> Self {
        Self::new()
    }
}

fn index_entries(entries: Vec<FighterEntry>) -> HashMap<String, FighterEntry> {
    entries
        .into_iter()
        .map(|mut e| {
            e.stamp_combats();
            (e.doc_id(), e)
        })
        .collect()
}

/// Delete all but the newest `keep` backup files in `dir`. Returns how many
/// were removed. File names embed a millisecond timestamp, so lexical order
/// is age order.
pub fn prune_backups(dir: &Path, keep: usize) -> Result<usize, StoreError> {
    let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"))
        })
        .collect();
    backups.sort();
    let excess = backups.len().saturating_sub(keep);
    for path in backups.into_iter().take(excess) {
        fs::remove_file(&path)?;
    }
    Ok(excess)
}
