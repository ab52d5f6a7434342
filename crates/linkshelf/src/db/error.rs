use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot create database directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema migration {version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A row holds something the model cannot represent, or a write was
    /// asked to store a value the schema forbids.
    #[error("Invalid value for '{column}': {reason}")]
    InvalidValue { column: &'static str, reason: String },

    /// A thread panicked while holding the connection.
    #[error("Database connection poisoned by a panicked thread")]
    LockPoisoned,
}
