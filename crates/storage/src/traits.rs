use async_trait::async_trait;

use opforms_engine::Response;

use crate::error::StorageError;

/// Persistence seam for submitted responses.
///
/// The engine hands a fully assembled [`Response`] to this trait and never
/// looks at it again; listing and counting exist for the serving and
/// inspection surfaces. Implementations must be `Send + Sync + 'static`
/// so they can sit in axum application state and cross async task
/// boundaries.
#[async_trait]
pub trait ResponseStore: Send + Sync + 'static {
    /// Persist one submitted response. Duplicate response ids are
    /// rejected with [`StorageError::AlreadySubmitted`].
    async fn submit(&self, response: Response) -> Result<(), StorageError>;

    /// All stored responses for a form, newest first. Unknown form ids
    /// yield an empty list, not an error.
    async fn responses_for_form(&self, form_id: &str) -> Result<Vec<Response>, StorageError>;

    /// Number of stored responses for a form.
    async fn response_count(&self, form_id: &str) -> Result<usize, StorageError>;
}
