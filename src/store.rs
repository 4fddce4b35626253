// Task store backed by SQLite

use crate::filter::Query;
use crate::record::Task;
use crate::schema::TASKS;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persistent task store.
///
/// Holds only the database path. Every operation opens its own connection and
/// drops it before returning, on success and on error alike.
#[derive(Debug, Clone)]
pub struct TaskStore {
    db_path: PathBuf,
}

impl TaskStore {
    /// Open or create a store at the given database file
    ///
    /// Parent directories are created and the schema is applied if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let store = Self { db_path };
        store.create_schema()?;

        info!(path = ?store.db_path, "Opened task store");
        Ok(store)
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");
        self.with_conn(|conn| {
            conn.execute_batch(&TASKS.create_sql())?;
            Ok(())
        })
    }

    /// Run `f` against a fresh connection, released when this returns
    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = Connection::open(&self.db_path).context("Failed to open SQLite database")?;
        f(&mut conn)
    }

    /// Run `f` inside a transaction committed on success; dropped (rolled back) on error
    fn with_tx<T>(&self, f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            let value = f(&tx)?;
            tx.commit().context("Failed to commit transaction")?;
            Ok(value)
        })
    }

    fn select_sql(where_clause: Option<&str>) -> String {
        match where_clause {
            Some(clause) => format!(
                "SELECT {} FROM {} WHERE ({}) ORDER BY id",
                TASKS.column_list(),
                TASKS.name,
                clause
            ),
            None => format!("SELECT {} FROM {} ORDER BY id", TASKS.column_list(), TASKS.name),
        }
    }

    // ========================================================================
    // CRUD API
    // ========================================================================

    /// Insert a new task and return it with its assigned id
    ///
    /// No validation beyond types: empty strings are stored as given.
    pub fn create(&self, task: &str, body: &str, state: bool) -> Result<Task> {
        self.with_tx(|tx| Self::insert_tx(tx, task, body, state))
    }

    pub(crate) fn insert_tx(tx: &rusqlite::Transaction<'_>, task: &str, body: &str, state: bool) -> Result<Task> {
        tx.execute(
            "INSERT INTO tasks (task, body, state) VALUES (?1, ?2, ?3)",
            rusqlite::params![task, body, state],
        )
        .context("Failed to insert task")?;

        let id = tx.last_insert_rowid();
        debug!(id, state, "Inserted task");

        Ok(Task {
            id,
            task: task.to_string(),
            body: body.to_string(),
            state,
        })
    }

    /// All tasks, ordered by id
    pub fn list_all(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&Self::select_sql(None))?;
            let rows = stmt.query_map([], Task::from_row)?;

            let mut results = Vec::new();
            for row_result in rows {
                results.push(row_result.context("Failed to read task row")?);
            }
            Ok(results)
        })
    }

    /// Point lookup; `None` when no task has this id
    pub fn get_by_id(&self, id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let task = conn
                .query_row(&Self::select_sql(Some("id = ?1")), [id], Task::from_row)
                .optional()?;
            Ok(task)
        })
    }

    /// Overwrite task, body and state of an existing task
    ///
    /// An unknown id is a silent no-op; callers that need to tell the two
    /// apart must check with `get_by_id` first.
    pub fn update(&self, id: i64, task: &str, body: &str, state: bool) -> Result<()> {
        let changed = self.with_tx(|tx| {
            let changed = tx
                .execute(
                    "UPDATE tasks SET task = ?1, body = ?2, state = ?3 WHERE id = ?4",
                    rusqlite::params![task, body, state, id],
                )
                .context("Failed to update task")?;
            Ok(changed)
        })?;

        if changed == 0 {
            debug!(id, "Update matched no task");
        } else {
            debug!(id, state, "Updated task");
        }
        Ok(())
    }

    /// Delete a task; true if it existed
    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.with_tx(|tx| {
            let deleted = tx
                .execute("DELETE FROM tasks WHERE id = ?1", [id])
                .context("Failed to delete task")?;
            Ok(deleted)
        })?;

        debug!(id, deleted, "Delete task");
        Ok(deleted > 0)
    }

    /// Search tasks; see [`Query::parse`] for the dispatch rules
    pub fn search(&self, query: &str) -> Result<Vec<Task>> {
        let query = Query::parse(query);
        debug!(%query, "Searching tasks");

        let (clause, value) = query.to_sql();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&Self::select_sql(Some(clause)))?;
            let rows = stmt.query_map([value], Task::from_row)?;

            let mut results = Vec::new();
            for row_result in rows {
                results.push(row_result.context("Failed to read task row")?);
            }
            Ok(results)
        })
    }

    /// Delete every task, returning how many were removed
    ///
    /// Ids keep counting from where they were.
    pub fn clear(&self) -> Result<usize> {
        let count = self.with_tx(|tx| Ok(tx.execute("DELETE FROM tasks", [])?))?;
        info!(count, "Cleared task store");
        Ok(count)
    }

    /// Run several inserts in a single transaction
    pub(crate) fn transaction<T>(&self, f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_tx(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> TaskStore {
        TaskStore::open(temp.path().join("tasks.db")).unwrap()
    }

    fn seed(store: &TaskStore) {
        store.create("Buy milk", "2 liters", false).unwrap();
        store.create("Write report", "Quarterly numbers", true).unwrap();
        store.create("Call mom", "About the MILKshake recipe", false).unwrap();
        store.create("Pay rent", "Done early", true).unwrap();
    }

    fn ids(tasks: &[Task]) -> BTreeSet<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_open_creates_database() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/tasks.db");

        let store = TaskStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.db_path(), path.as_path());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp = TempDir::new().unwrap();
        let created = open_store(&temp).create("Persist", "me", true).unwrap();

        let store = open_store(&temp);
        assert_eq!(store.get_by_id(created.id).unwrap(), Some(created));
    }

    #[test]
    fn test_create_and_get() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let created = store.create("Buy milk", "2 liters", false).unwrap();
        assert_eq!(created.id, 1);

        let retrieved = store.get_by_id(1).unwrap().unwrap();
        assert_eq!(
            retrieved,
            Task {
                id: 1,
                task: "Buy milk".to_string(),
                body: "2 liters".to_string(),
                state: false,
            }
        );
    }

    #[test]
    fn test_create_assigns_fresh_ids() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let a = store.create("a", "a", false).unwrap();
        let b = store.create("b", "b", true).unwrap();
        assert_ne!(a.id, b.id);

        // Deleted ids are not handed out again
        assert!(store.delete(b.id).unwrap());
        let c = store.create("c", "c", false).unwrap();
        assert!(c.id > b.id);
    }

    #[test]
    fn test_create_accepts_empty_strings() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let created = store.create("", "", false).unwrap();
        let retrieved = store.get_by_id(created.id).unwrap().unwrap();
        assert_eq!(retrieved.task, "");
        assert_eq!(retrieved.body, "");
    }

    #[test]
    fn test_get_nonexistent() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(store.get_by_id(42).unwrap().is_none());
    }

    #[test]
    fn test_list_all() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        assert!(store.list_all().unwrap().is_empty());

        seed(&store);
        let tasks = store.list_all().unwrap();
        assert_eq!(tasks.len(), 4);
        assert_eq!(ids(&tasks), BTreeSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn test_update_overwrites_all_fields() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let created = store.create("Original", "Original body", false).unwrap();
        store.update(created.id, "Updated", "Updated body", true).unwrap();

        let retrieved = store.get_by_id(created.id).unwrap().unwrap();
        assert_eq!(retrieved.task, "Updated");
        assert_eq!(retrieved.body, "Updated body");
        assert!(retrieved.state);
    }

    #[test]
    fn test_update_nonexistent_is_noop() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed(&store);

        let before = store.list_all().unwrap();
        store.update(999, "Ghost", "Nothing", true).unwrap();
        let after = store.list_all().unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_delete_once() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let created = store.create("To delete", "soon", false).unwrap();
        assert!(store.delete(created.id).unwrap());
        assert!(!store.delete(created.id).unwrap());
        assert!(store.get_by_id(created.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_nonexistent() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(!store.delete(7).unwrap());
    }

    #[test]
    fn test_search_by_state() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed(&store);

        let pending = store.search("pending").unwrap();
        assert_eq!(ids(&pending), BTreeSet::from([1, 3]));
        assert!(pending.iter().all(|t| !t.state));

        let completed = store.search("Completed").unwrap();
        assert_eq!(ids(&completed), BTreeSet::from([2, 4]));
        assert!(completed.iter().all(|t| t.state));
    }

    #[test]
    fn test_search_substring_ignores_case() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed(&store);

        // Matches "Buy milk" in task and "MILKshake" in body
        let results = store.search("Milk").unwrap();
        assert_eq!(ids(&results), BTreeSet::from([1, 3]));

        let results = store.search("quarterly").unwrap();
        assert_eq!(ids(&results), BTreeSet::from([2]));

        assert!(store.search("nothing like this").unwrap().is_empty());
    }

    #[test]
    fn test_search_status_word_shadows_text() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let literal = store.create("pending", "a task literally named pending", true).unwrap();
        let other = store.create("Other", "x", false).unwrap();

        // "pending" is always the status filter, so the completed task named
        // "pending" is not returned
        let results = store.search("pending").unwrap();
        assert_eq!(ids(&results), BTreeSet::from([other.id]));
        assert!(!ids(&results).contains(&literal.id));
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let percent = store.create("Discount 50%", "sale", false).unwrap();
        store.create("Discount 500", "sale", false).unwrap();
        let underscore = store.create("snake_case", "naming", false).unwrap();
        store.create("snakeXcase", "naming", false).unwrap();

        assert_eq!(ids(&store.search("50%").unwrap()), BTreeSet::from([percent.id]));
        assert_eq!(ids(&store.search("e_c").unwrap()), BTreeSet::from([underscore.id]));
    }

    #[test]
    fn test_search_empty_query_matches_all() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed(&store);

        assert_eq!(store.search("").unwrap().len(), 4);
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        seed(&store);

        assert_eq!(store.clear().unwrap(), 4);
        assert!(store.list_all().unwrap().is_empty());

        let next = store.create("after clear", "x", false).unwrap();
        assert_eq!(next.id, 5);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let result: Result<()> = store.transaction(|tx| {
            TaskStore::insert_tx(tx, "first", "x", false)?;
            Err(eyre::eyre!("boom"))
        });
        assert!(result.is_err());
        assert!(store.list_all().unwrap().is_empty());
    }
}
