use crate::chat::ChatError;
use crate::repository::error::DatabaseError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("DatabaseError: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("ChatError: {0}")]
    ChatError(#[from] ChatError),
}
