//! SQLite persistence for bookmarks and tags.
//!
//! One connection per process, guarded by a mutex. A `linkshelf add` and a
//! running `linkshelf worker` may hold the same file open, so file databases
//! use WAL and wait on a locked writer instead of failing immediately.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, Transaction};

pub mod bookmark_repo;
pub mod error;
pub mod migrations;
pub mod store;
pub mod tag_repo;

pub use error::DatabaseError;
pub use store::BookmarkStore;

/// How long a write waits for another process to release the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the bookmark database. Clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database file, creating it and its directory on first use,
    /// and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self::init(conn)?;
        log::info!("Bookmark database ready at {}", path.display());
        Ok(db)
    }

    /// Fresh private database, used by tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with the connection locked.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }

    /// Runs `f` inside a transaction that commits only if `f` succeeds.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, DatabaseError>,
    {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }
}

/// `~/.linkshelf/data/linkshelf.db`, used when the config names no path.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".linkshelf").join("data").join("linkshelf.db"))
}

/// Current time as stored in timestamp columns.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_count(db: &Database) -> u32 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM tags", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn test_in_memory_database_is_migrated() {
        let db = Database::open_in_memory().unwrap();
        let applied: u32 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(applied as usize, migrations::MIGRATIONS.len());
    }

    #[test]
    fn test_open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("linkshelf.db");
        Database::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("linkshelf.db")).unwrap();
        let mode: String = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linkshelf.db");
        {
            let db = Database::open(&path).unwrap();
            db.with_conn(|conn| {
                conn.execute("INSERT INTO tags (name) VALUES ('kept')", [])?;
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(tag_count(&Database::open(&path).unwrap()), 1);
    }

    #[test]
    fn test_with_tx_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<(), DatabaseError> = db.with_tx(|tx| {
            tx.execute("INSERT INTO tags (name) VALUES ('discarded')", [])?;
            Err(DatabaseError::InvalidValue {
                column: "tags.name",
                reason: "rejected".to_string(),
            })
        });
        assert!(result.is_err());
        assert_eq!(tag_count(&db), 0);

        db.with_tx(|tx| {
            tx.execute("INSERT INTO tags (name) VALUES ('kept')", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(tag_count(&db), 1);
    }

    #[test]
    fn test_clones_share_connection() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();
        db.with_conn(|conn| {
            conn.execute("INSERT INTO tags (name) VALUES ('shared')", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(tag_count(&other), 1);
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path().unwrap();
        assert!(path.ends_with(".linkshelf/data/linkshelf.db"));
    }
}
