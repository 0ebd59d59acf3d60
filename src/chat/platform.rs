use std::collections::HashMap;

use async_trait::async_trait;

use crate::chat::error::ChatError;

/// One message retrieved from chat history.
#[derive(Debug, Clone, Default)]
pub struct HistoryMessage {
    pub sender_id: i64,
    /// Unix timestamp (seconds) of delivery.
    pub timestamp: i64,
    /// Number of attachments classified as photos; only these count toward
    /// the quota.
    pub photo_count: u32,
}

/// Chat platform collaborator.
///
/// All operations are best-effort from the engine's point of view: callers
/// degrade to a no-op or an empty result on failure and never surface
/// platform errors into the chat.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Delivers a notification to the chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChatError>;

    /// Current chat membership as platform user id -> display name.
    async fn fetch_members(&self, chat_id: i64) -> Result<HashMap<i64, String>, ChatError>;

    /// One page of chat history, newest first, paged by `offset`. A page
    /// shorter than `page_size` signals exhaustion.
    async fn fetch_history_page(
        &self,
        chat_id: i64,
        page_size: u32,
        offset: u32,
    ) -> Result<Vec<HistoryMessage>, ChatError>;
}
