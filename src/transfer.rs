// JSON export/import of tasks

use crate::record::{State, Task};
use crate::store::TaskStore;
use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// One task as written to an export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Task")]
    pub task: String,
    #[serde(rename = "Body")]
    pub body: String,
    /// "Completed" or "Pending"
    #[serde(rename = "State")]
    pub state: String,
}

impl From<&Task> for ExportRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            task: task.task.clone(),
            body: task.body.clone(),
            state: task.status().as_str().to_string(),
        }
    }
}

/// One task read from an import file. Any `ID` key is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRecord {
    #[serde(rename = "Task")]
    pub task: String,
    #[serde(rename = "Body")]
    pub body: String,
    /// Only the exact string "Completed" means completed
    #[serde(rename = "State")]
    pub state: serde_json::Value,
}

impl ImportRecord {
    pub fn is_completed(&self) -> bool {
        self.state.as_str() == Some(State::Completed.as_str())
    }
}

/// Reasons an import document is rejected. None of them writes anything.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the file is not a valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("the JSON file must contain a list of tasks")]
    NotAnArray,

    #[error("task #{index} is malformed: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Every task in the store, in export form
pub fn export(store: &TaskStore) -> Result<Vec<ExportRecord>> {
    let tasks = store.list_all()?;
    Ok(tasks.iter().map(ExportRecord::from).collect())
}

/// Pretty-printed JSON array with four-space indentation
pub fn to_json(records: &[ExportRecord]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records
        .serialize(&mut serializer)
        .context("Failed to serialize tasks")?;
    String::from_utf8(buf).context("Serialized tasks are not UTF-8")
}

/// Export the store to `path`, returning the number of tasks written
///
/// An empty store writes nothing and returns 0.
pub fn write_export(store: &TaskStore, path: &Path) -> Result<usize> {
    let records = export(store)?;
    if records.is_empty() {
        warn!(path = ?path, "No tasks available to export");
        return Ok(0);
    }

    let json = to_json(&records)?;

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .context("Failed to open export file")?;

    // Truncate only once the lock is held
    file.lock_exclusive().context("Failed to acquire file lock")?;
    file.set_len(0)?;

    writeln!(file, "{}", json)?;
    file.sync_all()?;

    info!(path = ?path, count = records.len(), "Exported tasks");
    Ok(records.len())
}

/// Parse an import document; nothing is written
pub fn parse_import(text: &str) -> std::result::Result<Vec<ImportRecord>, ImportError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(ImportError::InvalidJson)?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Err(ImportError::NotAnArray),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| ImportError::InvalidRecord { index, source })
        })
        .collect()
}

/// Insert every record as a new task in one transaction
///
/// Existing tasks are never updated, so importing the same file twice
/// duplicates its tasks.
pub fn import(store: &TaskStore, records: &[ImportRecord]) -> Result<usize> {
    let count = store.transaction(|tx| {
        for record in records {
            TaskStore::insert_tx(tx, &record.task, &record.body, record.is_completed())?;
        }
        Ok(records.len())
    })?;

    info!(count, "Imported tasks");
    Ok(count)
}

/// Read, parse and import a file
pub fn import_file(store: &TaskStore, path: &Path) -> Result<usize> {
    let mut file = File::open(path).context("Failed to open import file")?;
    file.lock_shared().context("Failed to acquire file lock")?;

    let mut text = String::new();
    file.read_to_string(&mut text).context("Failed to read import file")?;
    let records = parse_import(&text)?;
    import(store, &records)
}
