//! Challenge store with SQLite storage and SQLx.

use std::str::FromStr;

use log::debug;
use log::info;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::repository::table::BackfillMarkTable;
use crate::repository::table::DailyReportTable;
use crate::repository::table::ParticipantTable;
use crate::repository::table::TableBase;

pub mod error;
pub mod table;

/// Main database struct containing all table handlers.
pub struct Repository {
    pub pool: SqlitePool,
    pub participants: ParticipantTable,
    pub daily_reports: DailyReportTable,
    pub backfill_marks: BackfillMarkTable,
}

impl Repository {
    /// Creates a new database connection and initializes table handlers.
    pub async fn new(db_url: &str, db_path: &str) -> anyhow::Result<Self> {
        let path = std::path::Path::new(db_path);
        if !path.exists() {
            debug!("Database path {db_path} does not exist. Creating...");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, "")?;
            info!("Created {db_path}");
        }

        debug!("Connecting to db...");
        let opts = SqliteConnectOptions::from_str(db_url)?.foreign_keys(true);
        let pool = SqlitePool::connect_with(opts).await?;
        info!("Connected to db.");

        let participants = ParticipantTable::new(pool.clone());
        let daily_reports = DailyReportTable::new(pool.clone());
        let backfill_marks = BackfillMarkTable::new(pool.clone());

        Ok(Self {
            pool,
            participants,
            daily_reports,
            backfill_marks,
        })
    }

    pub async fn create_all_tables(&self) -> anyhow::Result<()> {
        self.participants.create_table().await?;
        self.daily_reports.create_table().await?;
        self.backfill_marks.create_table().await?;
        Ok(())
    }

    pub async fn drop_all_tables(&self) -> anyhow::Result<()> {
        self.participants.drop_table().await?;
        self.daily_reports.drop_table().await?;
        self.backfill_marks.drop_table().await?;
        Ok(())
    }

    pub async fn delete_all_tables(&self) -> anyhow::Result<()> {
        self.participants.delete_all().await?;
        self.daily_reports.delete_all().await?;
        self.backfill_marks.delete_all().await?;
        Ok(())
    }
}
