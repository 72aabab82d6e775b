/// All errors a ResponseStore implementation can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A response with this id was already stored. Response ids are
    /// generated per submission, so a repeat means a duplicate submit.
    #[error("response already submitted: {response_id}")]
    AlreadySubmitted { response_id: String },

    /// The backend refused the payload (size limits, closed form, etc.).
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
