use thiserror::Error;

use crate::ai::AiServiceError;
use crate::db::DatabaseError;
use crate::error::{ConversionError, FetchError};

/// A step failure that moves the bookmark to `failed`.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Ai(#[from] AiServiceError),

    #[error("Storage failed: {0}")]
    Storage(#[from] DatabaseError),
}
