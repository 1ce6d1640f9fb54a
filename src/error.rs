use thiserror::Error;

use crate::persist::PersistenceError;
use crate::services::ServiceError;
use crate::snapshot::SnapshotError;

/// Errors that can occur in the drawing core.
///
/// Collaborator and storage failures never abort the draw/erase/checkpoint
/// loop; callers log them and keep going.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// An operation ran before its surface existed. Treated as a no-op
    /// condition, never fatal.
    #[error("surface is not initialized")]
    UninitializedSurface,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("unsupported image data: {0}")]
    Image(#[from] image::ImageError),
}
