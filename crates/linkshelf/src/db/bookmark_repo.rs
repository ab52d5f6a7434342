//! Bookmark repository: CRUD operations for the `bookmarks` table and its
//! tag associations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use uuid::Uuid;

use super::{now_timestamp, tag_repo, Database, DatabaseError};
use crate::model::{AiStatus, Bookmark, NewBookmark};

/// A raw bookmark row, before status parsing and tag loading.
#[derive(Debug, Clone)]
struct BookmarkRow {
    id: i64,
    user_id: i64,
    url: String,
    title: String,
    description: String,
    is_favorite: bool,
    ai_enabled: bool,
    ai_status: String,
    ai_error: Option<String>,
    created_at: String,
    updated_at: String,
}

impl BookmarkRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            url: row.get("url")?,
            title: row.get("title")?,
            description: row.get("description")?,
            is_favorite: row.get("is_favorite")?,
            ai_enabled: row.get("ai_enabled")?,
            ai_status: row.get("ai_status")?,
            ai_error: row.get("ai_error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_bookmark(self, conn: &Connection) -> Result<Bookmark, DatabaseError> {
        let ai_status: AiStatus =
            self.ai_status
                .parse()
                .map_err(|e: crate::model::UnknownStatus| DatabaseError::InvalidValue {
                    column: "bookmarks.ai_status",
                    reason: e.to_string(),
                })?;
        let tags = tag_repo::load_for_bookmark(conn, self.id)?;

        Ok(Bookmark {
            id: self.id,
            user_id: self.user_id,
            url: self.url,
            title: self.title,
            description: self.description,
            is_favorite: self.is_favorite,
            ai_enabled: self.ai_enabled,
            ai_status,
            ai_error: self.ai_error,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Inserts a new bookmark with the given initial status.
pub fn insert(
    db: &Database,
    new: &NewBookmark,
    status: AiStatus,
) -> Result<Bookmark, DatabaseError> {
    let now = now_timestamp();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO bookmarks (user_id, url, title, description, is_favorite, ai_enabled,
             ai_status, ai_error, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)",
            params![
                new.user_id,
                new.url,
                new.title,
                new.description,
                new.is_favorite,
                new.ai_enabled,
                status.as_str(),
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        find_in(conn, id)?.ok_or_else(|| DatabaseError::InvalidValue {
            column: "bookmarks.id",
            reason: format!("bookmark {} missing after insert", id),
        })
    })
}

/// Finds a bookmark by its ID, including its tags.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Bookmark>, DatabaseError> {
    db.with_conn(|conn| find_in(conn, id))
}

fn find_in(conn: &Connection, id: i64) -> Result<Option<Bookmark>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM bookmarks WHERE id = ?1",
            params![id],
            BookmarkRow::from_row,
        )
        .optional()?;
    row.map(|r| r.into_bookmark(conn)).transpose()
}

/// Lists bookmarks whose status is one of `statuses`, oldest first.
pub fn find_by_status(
    db: &Database,
    statuses: &[AiStatus],
) -> Result<Vec<Bookmark>, DatabaseError> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    db.with_conn(|conn| {
        let placeholders: Vec<String> = (1..=statuses.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT * FROM bookmarks WHERE ai_status IN ({}) ORDER BY created_at, id",
            placeholders.join(", ")
        );
        let values: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<BookmarkRow> = stmt
            .query_map(rusqlite::params_from_iter(values), BookmarkRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|r| r.into_bookmark(conn)).collect()
    })
}

/// Moves an AI-enabled bookmark to `processing` under a fresh claim token.
///
/// Only `pending` rows, or `processing` rows left behind by an interrupted
/// worker, can be claimed. Claiming a `processing` row revokes the token of
/// the run that held it. Returns `None` when nothing was updated.
pub fn claim_for_processing(db: &Database, id: i64) -> Result<Option<String>, DatabaseError> {
    let token = Uuid::new_v4().to_string();
    let now = now_timestamp();
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE bookmarks SET ai_status = 'processing', claim_token = ?2, updated_at = ?3
             WHERE id = ?1 AND ai_enabled = 1 AND ai_status IN ('pending', 'processing')",
            params![id, token, now],
        )?;
        Ok((updated == 1).then_some(token))
    })
}

/// Writes the terminal outcome of the run holding `claim_token` and
/// replaces the tag links with `tag_ids`, in one transaction.
///
/// Nothing is written, and `false` is returned, unless the row is still
/// `processing` under that token. `url` and `is_favorite` are never written.
pub fn save_outcome(
    db: &Database,
    bookmark: &Bookmark,
    tag_ids: &[i64],
    claim_token: &str,
) -> Result<bool, DatabaseError> {
    if !bookmark.ai_status.is_terminal() {
        return Err(DatabaseError::InvalidValue {
            column: "bookmarks.ai_status",
            reason: format!("'{}' is not a terminal status", bookmark.ai_status),
        });
    }

    let now = now_timestamp();
    db.with_tx(|tx| {
        let updated = tx.execute(
            "UPDATE bookmarks SET title = ?2, description = ?3, ai_status = ?4, ai_error = ?5,
             claim_token = NULL, updated_at = ?6
             WHERE id = ?1 AND ai_status = 'processing' AND claim_token = ?7",
            params![
                bookmark.id,
                bookmark.title,
                bookmark.description,
                bookmark.ai_status.as_str(),
                bookmark.ai_error,
                now,
                claim_token,
            ],
        )?;
        if updated == 0 {
            return Ok(false);
        }

        tx.execute(
            "DELETE FROM bookmark_tags WHERE bookmark_id = ?1",
            params![bookmark.id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO bookmark_tags (bookmark_id, tag_id) VALUES (?1, ?2)",
            )?;
            for tag_id in tag_ids {
                stmt.execute(params![bookmark.id, tag_id])?;
            }
        }
        Ok(true)
    })
}

/// Sets the favorite flag. Returns `false` if the bookmark does not exist.
pub fn set_favorite(db: &Database, id: i64, favorite: bool) -> Result<bool, DatabaseError> {
    let now = now_timestamp();
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE bookmarks SET is_favorite = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, favorite, now],
        )?;
        Ok(updated == 1)
    })
}
