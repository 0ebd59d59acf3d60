//! Live message collector: the per-message entry point feeding the counter
//! engine.

use std::sync::Arc;

use log::debug;

use crate::clock::GameClock;
use crate::service::error::ServiceError;
use crate::service::tracking_service::TrackingService;

/// Counts qualifying photos from live chat messages.
///
/// Only senders already bound to an active participant of the chat are
/// counted; all other traffic is ignored without touching the store.
/// Invocations are independent and may run concurrently; per-key atomicity
/// lives in the store's counter upsert.
pub struct MessageCollector {
    tracking: Arc<TrackingService>,
    clock: GameClock,
}

impl MessageCollector {
    pub fn new(tracking: Arc<TrackingService>, clock: GameClock) -> Self {
        Self { tracking, clock }
    }

    /// Handles one inbound chat message carrying `photo_count` qualifying
    /// attachments.
    pub async fn on_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        photo_count: u32,
    ) -> Result<(), ServiceError> {
        if photo_count == 0 {
            return Ok(());
        }
        if self
            .tracking
            .active_by_user(chat_id, sender_id)
            .await?
            .is_none()
        {
            return Ok(());
        }
        debug!("Collected {photo_count} photo(s) from user {sender_id} in chat {chat_id}");
        self.tracking
            .record_photos(
                chat_id,
                sender_id,
                photo_count as i64,
                self.clock.current_game_date(),
            )
            .await
    }
}
