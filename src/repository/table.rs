//! Database table operations and implementations.

use chrono::NaiveDate;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::model::BackfillMarkModel;
use crate::model::DailyReportModel;
use crate::model::ParticipantModel;
use crate::repository::error::DatabaseError;

/// Base table struct providing database pool access.
#[derive(Clone)]
pub struct BaseTable {
    pub pool: SqlitePool,
}

impl BaseTable {
    /// Creates a new base table with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Base trait for table operations.
#[async_trait::async_trait]
pub trait TableBase {
    /// Creates the table if it doesn't exist.
    async fn create_table(&self) -> Result<(), DatabaseError>;
    /// Drops the table.
    async fn drop_table(&self) -> Result<(), DatabaseError>;
    /// Deletes all rows from the table.
    async fn delete_all(&self) -> Result<(), DatabaseError>;
}

// ============================================================================
// ParticipantTable
// ============================================================================

#[derive(Clone)]
pub struct ParticipantTable {
    base: BaseTable,
}

impl ParticipantTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    /// Replaces the whole roster for a chat in one transaction. Every new
    /// row starts active with an unbound identity.
    pub async fn replace_roster(
        &self,
        chat_id: i64,
        names: &[String],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.base.pool.begin().await?;
        sqlx::query("DELETE FROM participants WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;
        for name in names {
            sqlx::query(
                "INSERT OR REPLACE INTO participants (chat_id, user_id, name, active) VALUES (?, NULL, ?, 1)",
            )
            .bind(chat_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn select_all_by_chat(
        &self,
        chat_id: i64,
    ) -> Result<Vec<ParticipantModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, ParticipantModel>(
            "SELECT * FROM participants WHERE chat_id = ? ORDER BY name",
        )
        .bind(chat_id)
        .fetch_all(&self.base.pool)
        .await?)
    }

    pub async fn select_active_by_chat(
        &self,
        chat_id: i64,
    ) -> Result<Vec<ParticipantModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, ParticipantModel>(
            "SELECT * FROM participants WHERE chat_id = ? AND active = 1 ORDER BY name",
        )
        .bind(chat_id)
        .fetch_all(&self.base.pool)
        .await?)
    }

    pub async fn select_active_by_user(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<Option<ParticipantModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, ParticipantModel>(
            "SELECT * FROM participants WHERE chat_id = ? AND user_id = ? AND active = 1",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    /// Binds a platform identity to a declared name. Write-once: rows with
    /// an identity already set are left untouched. Returns whether a row
    /// was bound.
    pub async fn bind_user_id(
        &self,
        chat_id: i64,
        name: &str,
        user_id: i64,
    ) -> Result<bool, DatabaseError> {
        let res = sqlx::query(
            "UPDATE participants SET user_id = ? WHERE chat_id = ? AND name = ? AND user_id IS NULL",
        )
        .bind(user_id)
        .bind(chat_id)
        .bind(name)
        .execute(&self.base.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn deactivate(&self, chat_id: i64, name: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE participants SET active = 0 WHERE chat_id = ? AND name = ?")
            .bind(chat_id)
            .bind(name)
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    /// Every chat with any declared roster, active or not.
    pub async fn select_distinct_chat_ids(&self) -> Result<Vec<i64>, DatabaseError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT DISTINCT chat_id FROM participants")
            .fetch_all(&self.base.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

#[async_trait::async_trait]
impl TableBase for ParticipantTable {
    async fn create_table(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS participants (
                chat_id INTEGER NOT NULL,
                user_id INTEGER DEFAULT NULL,
                name TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (chat_id, name)
            )
            "#,
        )
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn drop_table(&self) -> Result<(), DatabaseError> {
        sqlx::query("DROP TABLE IF EXISTS participants")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM participants")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// DailyReportTable
// ============================================================================

#[derive(Clone)]
pub struct DailyReportTable {
    base: BaseTable,
}

impl DailyReportTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    pub async fn select_one(
        &self,
        chat_id: i64,
        user_id: i64,
        game_date: NaiveDate,
    ) -> Result<Option<DailyReportModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, DailyReportModel>(
            "SELECT * FROM daily_reports WHERE chat_id = ? AND user_id = ? AND game_date = ?",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(game_date)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    /// Applies a capped increment to one (chat, user, game day) counter.
    ///
    /// Runs as a single upsert statement, so concurrent increments for the
    /// same key serialize inside SQLite; a saturated counter is a no-op.
    pub async fn add_photos(
        &self,
        chat_id: i64,
        user_id: i64,
        game_date: NaiveDate,
        delta: i64,
        cap: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO daily_reports (chat_id, user_id, game_date, photo_count)
            VALUES (?, ?, ?, MIN(?, ?))
            ON CONFLICT (chat_id, user_id, game_date)
            DO UPDATE SET photo_count = MIN(?, photo_count + ?)
            WHERE photo_count < ?
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(game_date)
        .bind(cap)
        .bind(delta)
        .bind(cap)
        .bind(delta)
        .bind(cap)
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TableBase for DailyReportTable {
    async fn create_table(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS daily_reports (
                chat_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                game_date TEXT NOT NULL,
                photo_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (chat_id, user_id, game_date)
            )
            "#,
        )
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn drop_table(&self) -> Result<(), DatabaseError> {
        sqlx::query("DROP TABLE IF EXISTS daily_reports")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM daily_reports")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}

// ============================================================================
// BackfillMarkTable
// ============================================================================

#[derive(Clone)]
pub struct BackfillMarkTable {
    base: BaseTable,
}

impl BackfillMarkTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            base: BaseTable::new(pool),
        }
    }

    /// Inserts the marker for a chat, recording the game day its replay
    /// covers. Returns false when the chat was already marked, i.e. its
    /// backfill already ran at some earlier point.
    pub async fn try_mark(&self, chat_id: i64, game_date: NaiveDate) -> Result<bool, DatabaseError> {
        let res = sqlx::query(
            "INSERT OR IGNORE INTO backfill_marks (chat_id, game_date, scanned_at) VALUES (?, ?, ?)",
        )
        .bind(chat_id)
        .bind(game_date)
        .bind(Utc::now())
        .execute(&self.base.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn select_one(
        &self,
        chat_id: i64,
    ) -> Result<Option<BackfillMarkModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, BackfillMarkModel>(
            "SELECT * FROM backfill_marks WHERE chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(&self.base.pool)
        .await?)
    }
}

#[async_trait::async_trait]
impl TableBase for BackfillMarkTable {
    async fn create_table(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS backfill_marks (
                chat_id INTEGER NOT NULL,
                game_date TEXT NOT NULL,
                scanned_at TIMESTAMP NOT NULL,
                PRIMARY KEY (chat_id)
            )
            "#,
        )
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    async fn drop_table(&self) -> Result<(), DatabaseError> {
        sqlx::query("DROP TABLE IF EXISTS backfill_marks")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM backfill_marks")
            .execute(&self.base.pool)
            .await?;
        Ok(())
    }
}
