use log::{info, warn};

use crate::db::BookmarkStore;
use crate::worker::job::{EnrichmentJob, JobQueue};

/// Re-enqueues bookmarks left `pending` or `processing` by a previous run.
///
/// Returns the number of jobs enqueued.
pub fn recover_interrupted(
    store: &dyn BookmarkStore,
    queue: &dyn JobQueue,
) -> crate::Result<usize> {
    let unfinished = store.find_unfinished()?;
    let mut enqueued = 0;

    for bookmark in unfinished {
        if !bookmark.ai_enabled {
            warn!(
                "Bookmark {} is {} but has AI disabled, leaving as is",
                bookmark.id, bookmark.ai_status
            );
            continue;
        }
        queue.enqueue(EnrichmentJob::new(bookmark.id, bookmark.user_id))?;
        enqueued += 1;
    }

    if enqueued > 0 {
        info!("Re-enqueued {} interrupted enrichment jobs", enqueued);
    }
    Ok(enqueued)
}
