use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use serde::Serialize;
use sqlx::FromRow;

/// Minimum qualifying photos per game day to stay in the challenge.
pub const DAILY_QUOTA: i64 = 2;

/// A declared challenge participant, one row per (chat, name).
///
/// The canonicalized "Surname Given-name" string is the stable key; the
/// platform identity is bound lazily by the reconciliation scan and may stay
/// unset forever for names that never match a chat member.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct ParticipantModel {
    pub chat_id: i64,
    /// Platform user id; `None` until bound, then never overwritten.
    pub user_id: Option<i64>,
    /// Whitespace-collapsed declared name, original casing preserved.
    pub name: String,
    /// True from declaration; cleared exactly once by the elimination sweep.
    pub active: bool,
}

/// Per-(chat, user, game day) photo counter, capped at [`DAILY_QUOTA`].
///
/// Absence of a row is equivalent to a count of zero. Rows are never
/// deleted; the historical record outlives elimination and month end.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct DailyReportModel {
    pub chat_id: i64,
    pub user_id: i64,
    pub game_date: NaiveDate,
    pub photo_count: i64,
}

/// Marks that the historical backfill already ran for a chat, recording the
/// game day it covered. One replay per chat lifetime: live counting and a
/// repeated scan must never apply the same messages twice.
#[derive(FromRow, Serialize, Default, Clone, Debug)]
pub struct BackfillMarkModel {
    pub chat_id: i64,
    /// Game day the replay covered.
    pub game_date: NaiveDate,
    pub scanned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_serialize_with_dates() {
        let report = DailyReportModel {
            chat_id: 1,
            user_id: 10,
            game_date: "2025-03-09".parse().unwrap(),
            photo_count: 2,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("2025-03-09"));

        assert!(serde_json::to_string(&BackfillMarkModel::default()).is_ok());
        assert!(serde_json::to_string(&ParticipantModel::default()).is_ok());
    }
}
