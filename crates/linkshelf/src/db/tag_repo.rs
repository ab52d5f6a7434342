//! Tag repository: lookup and get-or-create on the `tags` table.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DatabaseError};
use crate::model::Tag;

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Finds a tag by name, case-insensitively.
pub fn find_by_name(db: &Database, name: &str) -> Result<Option<Tag>, DatabaseError> {
    let name = normalize(name);
    db.with_conn(|conn| Ok(find_by_name_in(conn, &name)?))
}

/// Creates the tag if no tag with that (lowercased) name exists, and returns
/// the stored row either way. Never inserts a duplicate name.
pub fn create(db: &Database, name: &str) -> Result<Tag, DatabaseError> {
    let name = normalize(name);
    if name.is_empty() {
        return Err(DatabaseError::InvalidValue {
            column: "tags.name",
            reason: "tag name must not be empty".to_string(),
        });
    }

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        find_by_name_in(conn, &name)?.ok_or_else(|| DatabaseError::InvalidValue {
            column: "tags.name",
            reason: format!("tag '{}' missing after insert", name),
        })
    })
}

/// Lists all tags ordered by name.
pub fn list(db: &Database) -> Result<Vec<Tag>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |r| {
                Ok(Tag {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    })
}

fn find_by_name_in(conn: &Connection, name: &str) -> rusqlite::Result<Option<Tag>> {
    conn.query_row(
        "SELECT id, name FROM tags WHERE name = ?1",
        params![name],
        |r| {
            Ok(Tag {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()
}

/// Tags attached to a bookmark, ordered by name. Callers already hold the lock.
pub(crate) fn load_for_bookmark(conn: &Connection, bookmark_id: i64) -> rusqlite::Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name FROM tags t
         JOIN bookmark_tags bt ON bt.tag_id = t.id
         WHERE bt.bookmark_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![bookmark_id], |r| {
            Ok(Tag {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}
