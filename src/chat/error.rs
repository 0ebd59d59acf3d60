#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("Chat platform request failed: {message}")]
    RequestFailed { message: String },
}
