use std::sync::Arc;

use crate::chat::ChatPlatform;
use crate::clock::GameClock;
use crate::config::Config;
use crate::repository::Repository;
use crate::service::error::ServiceError;
use crate::service::reconciliation_service::ReconciliationService;
use crate::service::tracking_service::TrackingService;

pub mod error;
pub mod reconciliation_service;
pub mod tracking_service;

pub struct Services {
    pub tracking: Arc<TrackingService>,
    pub reconciliation: Arc<ReconciliationService>,
}

impl Services {
    pub fn new(
        repo: Arc<Repository>,
        platform: Arc<dyn ChatPlatform>,
        clock: GameClock,
        config: &Config,
    ) -> Self {
        let tracking = Arc::new(TrackingService::new(repo.clone()));
        let reconciliation = Arc::new(ReconciliationService::new(
            repo,
            tracking.clone(),
            platform,
            clock,
            config.history_page_size,
            config.history_max_pages,
        ));
        Self {
            tracking,
            reconciliation,
        }
    }

    /// Roster declaration entry point: atomically replaces the roster for a
    /// chat, then runs the reconciliation scan. An empty declaration is a
    /// no-op.
    pub async fn declare_roster(&self, chat_id: i64, names: &[String]) -> Result<(), ServiceError> {
        if self.tracking.replace_roster(chat_id, names).await? == 0 {
            return Ok(());
        }
        self.reconciliation.scan(chat_id).await
    }
}
