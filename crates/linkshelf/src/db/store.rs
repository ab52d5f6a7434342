//! Persistence seam used by the enrichment pipeline and the bookmark service.

use super::{bookmark_repo, tag_repo, Database, DatabaseError};
use crate::model::{AiStatus, Bookmark, NewBookmark, Tag};

/// Storage operations the enrichment path depends on.
///
/// Implemented by [`Database`]; tests may substitute their own store.
pub trait BookmarkStore: Send + Sync {
    fn get(&self, id: i64) -> Result<Option<Bookmark>, DatabaseError>;

    fn insert(&self, new: &NewBookmark, status: AiStatus) -> Result<Bookmark, DatabaseError>;

    /// Atomically marks an AI-enabled, non-terminal bookmark as `processing`
    /// and returns the claim token the run must present when saving.
    /// Returns `None` if the bookmark cannot be claimed.
    fn claim_for_processing(&self, id: i64) -> Result<Option<String>, DatabaseError>;

    fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, DatabaseError>;

    /// Creates a tag, returning the existing row if the name is taken.
    fn create_tag(&self, name: &str) -> Result<Tag, DatabaseError>;

    fn get_or_create_tag(&self, name: &str) -> Result<Tag, DatabaseError> {
        match self.find_tag_by_name(name)? {
            Some(tag) => Ok(tag),
            None => self.create_tag(name),
        }
    }

    /// Persists the terminal enrichment fields of `bookmark` and replaces its
    /// tags, as a single unit. Returns `false` without writing when
    /// `claim_token` no longer holds the record.
    fn save(
        &self,
        bookmark: &Bookmark,
        tags: &[Tag],
        claim_token: &str,
    ) -> Result<bool, DatabaseError>;

    /// Bookmarks still `pending` or `processing`.
    fn find_unfinished(&self) -> Result<Vec<Bookmark>, DatabaseError>;

    fn set_favorite(&self, id: i64, favorite: bool) -> Result<bool, DatabaseError>;
}

impl BookmarkStore for Database {
    fn get(&self, id: i64) -> Result<Option<Bookmark>, DatabaseError> {
        bookmark_repo::find_by_id(self, id)
    }

    fn insert(&self, new: &NewBookmark, status: AiStatus) -> Result<Bookmark, DatabaseError> {
        bookmark_repo::insert(self, new, status)
    }

    fn claim_for_processing(&self, id: i64) -> Result<Option<String>, DatabaseError> {
        bookmark_repo::claim_for_processing(self, id)
    }

    fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, DatabaseError> {
        tag_repo::find_by_name(self, name)
    }

    fn create_tag(&self, name: &str) -> Result<Tag, DatabaseError> {
        tag_repo::create(self, name)
    }

    fn save(
        &self,
        bookmark: &Bookmark,
        tags: &[Tag],
        claim_token: &str,
    ) -> Result<bool, DatabaseError> {
        let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        bookmark_repo::save_outcome(self, bookmark, &tag_ids, claim_token)
    }

    fn find_unfinished(&self) -> Result<Vec<Bookmark>, DatabaseError> {
        bookmark_repo::find_by_status(self, &[AiStatus::Pending, AiStatus::Processing])
    }

    fn set_favorite(&self, id: i64, favorite: bool) -> Result<bool, DatabaseError> {
        bookmark_repo::set_favorite(self, id, favorite)
    }
}
