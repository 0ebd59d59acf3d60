//! Perpetual scheduler for the three recurring wall-clock anchors.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::DateTime;
use chrono::FixedOffset;
use log::debug;
use log::error;
use log::info;
use log::warn;
use tokio::time::sleep;

use crate::chat::ChatPlatform;
use crate::clock;
use crate::clock::GAME_DAY_START_HOUR;
use crate::clock::GameClock;
use crate::config::AnchorTime;
use crate::config::Config;
use crate::model::DAILY_QUOTA;
use crate::service::Services;
use crate::service::error::ServiceError;

/// Grace added past the computed anchor so the wall clock lands strictly
/// after it on wake-up.
const WAKE_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Reminder,
    Sweep,
    Finalists,
}

/// Task that wakes at the nearest of three recurring anchors: the daily
/// reminder, the daily elimination sweep and the monthly finalist listing.
///
/// No scheduler state survives a restart; each cycle recomputes the next
/// anchors from the current wall clock, so oversleeping skips at most one
/// cycle's actions and never replays them.
pub struct ChallengeScheduler {
    services: Arc<Services>,
    platform: Arc<dyn ChatPlatform>,
    clock: GameClock,
    reminder_at: AnchorTime,
    sweep_at: AnchorTime,
    finalists_at: AnchorTime,
    running: AtomicBool,
}

impl ChallengeScheduler {
    pub fn new(
        services: Arc<Services>,
        platform: Arc<dyn ChatPlatform>,
        clock: GameClock,
        config: &Config,
    ) -> Arc<Self> {
        info!(
            "Initializing ChallengeScheduler (reminder {}, sweep {}, finalists day 1 {})",
            config.reminder_at, config.sweep_at, config.finalists_at
        );
        Arc::new(Self {
            services,
            platform,
            clock,
            reminder_at: config.reminder_at,
            sweep_at: config.sweep_at,
            finalists_at: config.finalists_at,
            running: AtomicBool::new(false),
        })
    }

    /// Starts the anchor loop.
    pub fn start(self: Arc<Self>) {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!("Starting challenge scheduler loop.");
            self.spawn_anchor_loop();
        }
    }

    /// Stops the loop before its next wake-up.
    pub fn stop(&self) {
        info!("Stopping challenge scheduler loop.");
        self.running.store(false, Ordering::SeqCst);
    }

    fn spawn_anchor_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                if !self.running.load(Ordering::SeqCst) {
                    info!("Challenge scheduler loop stopped.");
                    break;
                }
                let now = self.clock.now();
                let due = self.next_anchors(now);
                let wake = due.iter().map(|(at, _)| *at).min().expect("three anchors");
                let pause = (wake - now).to_std().unwrap_or(Duration::ZERO) + WAKE_GRACE;
                debug!("Next anchor at {wake}; sleeping {pause:?}");
                sleep(pause).await;

                // Distinct times make ties unexpected, but a tie fires every
                // tied action.
                for (at, anchor) in &due {
                    if *at != wake {
                        continue;
                    }
                    let result = match anchor {
                        Anchor::Reminder => self.run_reminders().await,
                        Anchor::Sweep => self.run_sweeps().await,
                        Anchor::Finalists => self.run_finalists().await,
                    };
                    if let Err(e) = result {
                        // Store access failure has no recovery path
                        error!("Store failure during {anchor:?} anchor: {e}; scheduler exiting");
                        self.running.store(false, Ordering::SeqCst);
                        return;
                    }
                }
            }
        });
    }

    fn next_anchors(&self, now: DateTime<FixedOffset>) -> [(DateTime<FixedOffset>, Anchor); 3] {
        [
            (
                clock::next_daily_anchor(now, self.reminder_at.hour, self.reminder_at.minute),
                Anchor::Reminder,
            ),
            (
                clock::next_daily_anchor(now, self.sweep_at.hour, self.sweep_at.minute),
                Anchor::Sweep,
            ),
            (
                clock::next_monthly_anchor(now, 1, self.finalists_at.hour, self.finalists_at.minute),
                Anchor::Finalists,
            ),
        ]
    }

    /// Names everyone still short of today's quota, per chat. Silent for
    /// chats with nothing outstanding.
    pub async fn run_reminders(&self) -> Result<(), ServiceError> {
        let game_date = self.clock.current_game_date();
        for chat_id in self.services.tracking.chats_with_roster().await? {
            let names = self
                .services
                .tracking
                .remaining_today(chat_id, game_date)
                .await?;
            if names.is_empty() {
                continue;
            }
            let text = format!(
                "🕙 Reminder: still missing today's {DAILY_QUOTA} photos:\n{}",
                bullet_list(&names)
            );
            self.notify(chat_id, &text).await;
        }
        Ok(())
    }

    /// Runs the elimination sweep over the previous game day, per chat.
    /// Silent for chats with no eliminations.
    pub async fn run_sweeps(&self) -> Result<(), ServiceError> {
        let game_date = self.clock.previous_game_date();
        for chat_id in self.services.tracking.chats_with_roster().await? {
            let failed = self.services.tracking.sweep(chat_id, game_date).await?;
            if failed.is_empty() {
                continue;
            }
            let text = format!(
                "⛳ Results for game day {game_date} ({GAME_DAY_START_HOUR:02}:00 cutoff)\n\
                 Eliminated (fewer than {DAILY_QUOTA} photos):\n{}\n\
                 They can still write in the chat, but the bot no longer counts them.",
                bullet_list(&failed)
            );
            self.notify(chat_id, &text).await;
        }
        Ok(())
    }

    /// Lists the remaining active participants, per chat. Silent for chats
    /// with none left.
    pub async fn run_finalists(&self) -> Result<(), ServiceError> {
        for chat_id in self.services.tracking.chats_with_roster().await? {
            let names = self.services.tracking.finalists(chat_id).await?;
            if names.is_empty() {
                continue;
            }
            let text = format!(
                "🏁 Finalists (never missed a day):\n{}",
                bullet_list(&names)
            );
            self.notify(chat_id, &text).await;
        }
        Ok(())
    }

    // Send failures stay local to one chat; the batch continues.
    async fn notify(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.platform.send_message(chat_id, text).await {
            warn!("Failed to notify chat {chat_id}: {e}");
        }
    }
}

fn bullet_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("• {n}"))
        .collect::<Vec<_>>()
        .join("\n")
}
