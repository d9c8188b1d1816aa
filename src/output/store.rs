//! Matched item store and JSON snapshots
//!
//! The store accumulates matches for one scan session in discovery order,
//! unique by item identity, and rewrites the whole snapshot file on demand.

use crate::output::{OutputError, OutputResult};
use crate::scanner::Item;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One record of the snapshot file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(rename = "c2cItemsName")]
    pub name: String,

    #[serde(rename = "showPrice")]
    pub show_price: Value,

    #[serde(rename = "c2cItemsId")]
    pub id: Value,

    pub url: String,
}

/// What a snapshot call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// The file was rewritten with this many records
    Written(usize),

    /// Nothing matched yet, the file was left alone
    Empty,
}

/// Builds the detail page URL for an item id
///
/// Depends on the id alone, so it can always be rebuilt from a snapshot.
pub fn detail_url(base_url: &str, id: &Value) -> String {
    let id = match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("{}?page=magic-market_detail&itemsId={}", base_url, id)
}

/// Accumulated matches of a scan session
#[derive(Debug, Clone)]
pub struct ResultStore {
    items: Vec<Item>,
    keys: HashSet<String>,
    detail_base_url: String,
}

impl ResultStore {
    /// Creates an empty store whose snapshots link to `detail_base_url`
    pub fn new(detail_base_url: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            keys: HashSet::new(),
            detail_base_url: detail_base_url.into(),
        }
    }

    /// Inserts `item` unless an item with the same identity is present
    ///
    /// Items without an identifier are compared as whole records.
    ///
    /// # Returns
    ///
    /// `true` if the item was newly added
    pub fn add(&mut self, item: Item) -> bool {
        match item.key() {
            Some(key) => {
                if !self.keys.insert(key) {
                    return false;
                }
            }
            None => {
                if self.items.contains(&item) {
                    return false;
                }
            }
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Matched items in discovery order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn detail_base_url(&self) -> &str {
        &self.detail_base_url
    }

    /// Drops every match, for a session reset
    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
    }

    /// Simplified records in discovery order
    pub fn records(&self) -> Vec<SnapshotRecord> {
        self.items
            .iter()
            .map(|item| SnapshotRecord {
                name: item.name.clone(),
                show_price: item.show_price.clone().unwrap_or(Value::Null),
                id: item.id.clone(),
                url: detail_url(&self.detail_base_url, &item.id),
            })
            .collect()
    }

    /// Overwrites `path` with every match as an indented JSON array
    ///
    /// Does nothing when the store is empty, so a previous snapshot is
    /// never clobbered by an empty one. The file is replaced through a
    /// sibling temp file, so readers never see a half-written array.
    pub fn save_snapshot(&self, path: &Path) -> OutputResult<SnapshotOutcome> {
        if self.is_empty() {
            tracing::info!("No matching items yet, snapshot not written");
            return Ok(SnapshotOutcome::Empty);
        }

        let json = serde_json::to_string_pretty(&self.records())?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!("Wrote {} records to {}", self.len(), path.display());
        Ok(SnapshotOutcome::Written(self.len()))
    }
}

/// Reads a snapshot file written by [`ResultStore::save_snapshot`]
pub fn read_snapshot(path: &Path) -> OutputResult<Vec<SnapshotRecord>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(OutputError::from)
}
