//! One-shot identity binding and historical backfill after a roster
//! declaration.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::FixedOffset;
use log::debug;
use log::info;
use log::warn;

use crate::chat::ChatPlatform;
use crate::clock;
use crate::clock::GameClock;
use crate::repository::Repository;
use crate::service::error::ServiceError;
use crate::service::tracking_service::TrackingService;
use crate::service::tracking_service::name_key;

pub struct ReconciliationService {
    repo: Arc<Repository>,
    tracking: Arc<TrackingService>,
    platform: Arc<dyn ChatPlatform>,
    clock: GameClock,
    page_size: u32,
    max_pages: u32,
}

impl ReconciliationService {
    pub fn new(
        repo: Arc<Repository>,
        tracking: Arc<TrackingService>,
        platform: Arc<dyn ChatPlatform>,
        clock: GameClock,
        page_size: u32,
        max_pages: u32,
    ) -> Self {
        Self {
            repo,
            tracking,
            platform,
            clock,
            page_size: page_size.max(1),
            max_pages,
        }
    }

    /// Runs the full scan: bind declared names to current members, then
    /// replay the current game day's history through the counter engine.
    ///
    /// Replay runs at most once per chat, ever, gated by a marker row. Once
    /// any scan has replayed a chat's history, live counting is the only
    /// source of increments; a later re-declaration binds new identities but
    /// never pages through history again, as the live path has been counting
    /// the whole time. Within the one replay, only messages at or before the
    /// scan's start instant are credited: anything newer arrived with its
    /// sender already bound and goes through the live path.
    pub async fn scan(&self, chat_id: i64) -> Result<(), ServiceError> {
        // Cutoff is captured before binding so no message can be seen by
        // both the live path and the replay.
        let scan_start = self.clock.now();

        self.bind_identities(chat_id).await?;

        let game_date = clock::game_date(scan_start);
        if !self.repo.backfill_marks.try_mark(chat_id, game_date).await? {
            debug!("History for chat {chat_id} was already backfilled; skipping replay");
            return Ok(());
        }
        self.replay_history(chat_id, scan_start).await
    }

    /// Phase 1: fill in `user_id` for declared names matching a current
    /// member after normalization. Membership lookup is best-effort; an
    /// empty result binds nothing.
    async fn bind_identities(&self, chat_id: i64) -> Result<(), ServiceError> {
        let members = match self.platform.fetch_members(chat_id).await {
            Ok(members) => members,
            Err(e) => {
                warn!("Membership lookup failed for chat {chat_id}: {e}");
                HashMap::new()
            }
        };
        let by_key: HashMap<String, i64> = members
            .iter()
            .map(|(id, display)| (name_key(display), *id))
            .collect();

        let mut bound = 0;
        for p in self.repo.participants.select_all_by_chat(chat_id).await? {
            if p.user_id.is_some() {
                continue;
            }
            if let Some(&user_id) = by_key.get(&name_key(&p.name)) {
                if self.tracking.bind_identity(chat_id, &p.name, user_id).await? {
                    bound += 1;
                }
            }
        }
        if bound > 0 {
            info!("Bound {bound} participant identit(ies) in chat {chat_id}");
        }
        Ok(())
    }

    /// Phase 2: page backward through history and credit photos from bound,
    /// active senders to each message's game day. The window is the scan's
    /// game day up to `scan_start`; newer messages belong to the live path.
    ///
    /// Paging stops at a short page (history exhausted), at the first
    /// message older than the game-day start, or at the page safety bound.
    /// A platform error aborts the replay silently; increments already
    /// applied stand and are not retried.
    async fn replay_history(
        &self,
        chat_id: i64,
        scan_start: DateTime<FixedOffset>,
    ) -> Result<(), ServiceError> {
        let start_ts = clock::game_day_start(scan_start).timestamp();
        let end_ts = scan_start.timestamp();

        let mut offset = 0u32;
        for _ in 0..self.max_pages {
            let items = match self
                .platform
                .fetch_history_page(chat_id, self.page_size, offset)
                .await
            {
                Ok(items) => items,
                Err(e) => {
                    warn!(
                        "History fetch failed for chat {chat_id} at offset {offset}: {e}; replay aborted"
                    );
                    return Ok(());
                }
            };
            let exhausted = (items.len() as u32) < self.page_size;
            let mut reached_start = false;

            for msg in &items {
                if msg.timestamp < start_ts {
                    reached_start = true;
                    continue;
                }
                if msg.timestamp > end_ts {
                    continue;
                }
                if msg.photo_count == 0 {
                    continue;
                }
                if self
                    .tracking
                    .active_by_user(chat_id, msg.sender_id)
                    .await?
                    .is_none()
                {
                    continue;
                }
                let Some(game_date) = self.clock.game_date_of_unix(msg.timestamp) else {
                    continue;
                };
                self.tracking
                    .record_photos(chat_id, msg.sender_id, msg.photo_count as i64, game_date)
                    .await?;
            }

            if exhausted || reached_start {
                break;
            }
            offset += self.page_size;
        }
        Ok(())
    }
}
