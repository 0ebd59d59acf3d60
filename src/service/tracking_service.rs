//! Core tracking service: capped photo counters, roster management, and the
//! elimination sweep.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;
use log::info;
use tokio::sync::Mutex;

use crate::model::DAILY_QUOTA;
use crate::model::ParticipantModel;
use crate::repository::Repository;
use crate::service::error::ServiceError;

/// Collapses internal whitespace and trims a declared "Surname Given-name".
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-folded comparison key for name matching. Stored names keep their
/// original casing; only comparisons fold.
pub fn name_key(name: &str) -> String {
    normalize_name(name).to_lowercase()
}

pub struct TrackingService {
    repo: Arc<Repository>,
    // Sweeps for one chat must not interleave (re-running a sweep against a
    // roster mutated mid-flight is unsafe), so each chat gets its own gate.
    sweep_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl TrackingService {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            repo,
            sweep_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Records `delta` newly observed qualifying photos for one
    /// (chat, user, game day) key, capped at [`DAILY_QUOTA`].
    ///
    /// A zero delta never touches the store, so no empty report rows appear
    /// and replaying against a saturated counter is a no-op.
    pub async fn record_photos(
        &self,
        chat_id: i64,
        user_id: i64,
        delta: i64,
        game_date: NaiveDate,
    ) -> Result<(), ServiceError> {
        if delta <= 0 {
            return Ok(());
        }
        self.repo
            .daily_reports
            .add_photos(chat_id, user_id, game_date, delta, DAILY_QUOTA)
            .await?;
        debug!("Recorded {delta} photo(s) for user {user_id} in chat {chat_id} on {game_date}");
        Ok(())
    }

    /// Replaces the whole roster for a chat, discarding any prior roster.
    ///
    /// Names are normalized, empties dropped and duplicates collapsed; an
    /// empty result leaves the current roster untouched. Returns the number
    /// of declared participants.
    pub async fn replace_roster(
        &self,
        chat_id: i64,
        names: &[String],
    ) -> Result<usize, ServiceError> {
        let mut seen = HashSet::new();
        let names: Vec<String> = names
            .iter()
            .map(|n| normalize_name(n))
            .filter(|n| !n.is_empty())
            .filter(|n| seen.insert(name_key(n)))
            .collect();
        if names.is_empty() {
            return Ok(0);
        }
        self.repo.participants.replace_roster(chat_id, &names).await?;
        info!(
            "Declared roster of {} participant(s) for chat {chat_id}",
            names.len()
        );
        Ok(names.len())
    }

    /// Active participants still short of the quota on `game_date`, by name.
    pub async fn remaining_today(
        &self,
        chat_id: i64,
        game_date: NaiveDate,
    ) -> Result<Vec<String>, ServiceError> {
        let mut left = Vec::new();
        for p in self.repo.participants.select_active_by_chat(chat_id).await? {
            if self.quota_count(&p, game_date).await? < DAILY_QUOTA {
                left.push(p.name);
            }
        }
        Ok(left)
    }

    /// Eliminates every active participant that missed the quota on
    /// `game_date` and returns their names.
    ///
    /// Sweeps for one chat serialize; re-running after a sweep finds nothing
    /// new, since eliminated rows are no longer active.
    pub async fn sweep(
        &self,
        chat_id: i64,
        game_date: NaiveDate,
    ) -> Result<Vec<String>, ServiceError> {
        let gate = self.sweep_gate(chat_id).await;
        let _guard = gate.lock().await;

        let mut eliminated = Vec::new();
        for p in self.repo.participants.select_active_by_chat(chat_id).await? {
            if self.quota_count(&p, game_date).await? < DAILY_QUOTA {
                self.repo.participants.deactivate(chat_id, &p.name).await?;
                eliminated.push(p.name);
            }
        }
        if !eliminated.is_empty() {
            info!(
                "Eliminated {} participant(s) from chat {chat_id} for game day {game_date}",
                eliminated.len()
            );
        }
        Ok(eliminated)
    }

    /// Remaining active participants, ordered by name.
    pub async fn finalists(&self, chat_id: i64) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .repo
            .participants
            .select_active_by_chat(chat_id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    /// Every chat with any declared roster.
    pub async fn chats_with_roster(&self) -> Result<Vec<i64>, ServiceError> {
        Ok(self.repo.participants.select_distinct_chat_ids().await?)
    }

    /// Binds a platform identity to a declared name. Idempotent: an existing
    /// binding is never overwritten.
    pub async fn bind_identity(
        &self,
        chat_id: i64,
        name: &str,
        user_id: i64,
    ) -> Result<bool, ServiceError> {
        let bound = self.repo.participants.bind_user_id(chat_id, name, user_id).await?;
        if bound {
            debug!("Bound user {user_id} to '{name}' in chat {chat_id}");
        }
        Ok(bound)
    }

    /// Active participant bound to this platform user, if any.
    pub async fn active_by_user(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<Option<ParticipantModel>, ServiceError> {
        Ok(self
            .repo
            .participants
            .select_active_by_user(chat_id, user_id)
            .await?)
    }

    /// Photo count for one participant on one game day; unbound participants
    /// count as zero.
    async fn quota_count(
        &self,
        participant: &ParticipantModel,
        game_date: NaiveDate,
    ) -> Result<i64, ServiceError> {
        let Some(user_id) = participant.user_id else {
            return Ok(0);
        };
        Ok(self
            .repo
            .daily_reports
            .select_one(participant.chat_id, user_id, game_date)
            .await?
            .map_or(0, |r| r.photo_count))
    }

    async fn sweep_gate(&self, chat_id: i64) -> Arc<Mutex<()>> {
        self.sweep_locks
            .lock()
            .await
            .entry(chat_id)
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Ivanov   Petr "), "Ivanov Petr");
        assert_eq!(normalize_name("Ivanov Petr"), "Ivanov Petr");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_name_key_folds_case_only_for_comparison() {
        assert_eq!(name_key("IVANOV  Petr"), "ivanov petr");
        assert_eq!(name_key("Ivanov Petr"), name_key(" ivanov  petr "));
        assert_ne!(name_key("Ivanov Petr"), name_key("Ivanov Petr Jr"));
    }
}
