use chrono::NaiveDate;

mod common;

// Handles setup, execution, and teardown automatically.
macro_rules! db_test {
    ($name:ident, |$db:ident| $body:block) => {
        #[tokio::test]
        async fn $name() {
            let ($db, db_path) = common::setup_db().await;

            // Execute the test logic
            $body

            common::teardown_db(db_path).await;
        }
    };
}

macro_rules! declare {
    ($db:expr, $chat:expr, [ $($name:expr),* ]) => {
        $db.participants
            .replace_roster($chat, &[$($name.to_string()),*])
            .await
            .expect("Failed to replace roster")
    };
}

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

mod participant_table_tests {
    use super::*;

    db_test!(replace_roster_inserts_active_unbound_rows, |db| {
        declare!(db, 1, ["Ivanov Petr", "Petrov Maxim"]);

        let rows = db.participants.select_all_by_chat(1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|p| p.active && p.user_id.is_none()));
    });

    db_test!(replace_roster_discards_prior_roster, |db| {
        declare!(db, 1, ["Ivanov Petr", "Petrov Maxim"]);
        db.participants.deactivate(1, "Ivanov Petr").await.unwrap();

        declare!(db, 1, ["Sidorov Ivan"]);

        let rows = db.participants.select_all_by_chat(1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Sidorov Ivan");
        assert!(rows[0].active);
    });

    db_test!(replace_roster_is_scoped_by_chat, |db| {
        declare!(db, 1, ["Ivanov Petr"]);
        declare!(db, 2, ["Petrov Maxim"]);

        declare!(db, 1, ["Sidorov Ivan"]);

        let other = db.participants.select_all_by_chat(2).await.unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(other[0].name, "Petrov Maxim");
    });

    db_test!(bind_user_id_is_write_once, |db| {
        declare!(db, 1, ["Ivanov Petr"]);

        assert!(db.participants.bind_user_id(1, "Ivanov Petr", 10).await.unwrap());
        // a second bind must not overwrite the first
        assert!(!db.participants.bind_user_id(1, "Ivanov Petr", 99).await.unwrap());

        let rows = db.participants.select_all_by_chat(1).await.unwrap();
        assert_eq!(rows[0].user_id, Some(10));
    });

    db_test!(deactivate_clears_active_flag, |db| {
        declare!(db, 1, ["Ivanov Petr", "Petrov Maxim"]);
        db.participants.deactivate(1, "Ivanov Petr").await.unwrap();

        let active = db.participants.select_active_by_chat(1).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Petrov Maxim");
    });

    db_test!(select_active_is_ordered_by_name, |db| {
        declare!(db, 1, ["Petrov Maxim", "Ivanov Petr", "Sidorov Ivan"]);

        let names: Vec<String> = db
            .participants
            .select_active_by_chat(1)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Ivanov Petr", "Petrov Maxim", "Sidorov Ivan"]);
    });

    db_test!(select_active_by_user_requires_binding_and_activity, |db| {
        declare!(db, 1, ["Ivanov Petr"]);
        assert!(db.participants.select_active_by_user(1, 10).await.unwrap().is_none());

        db.participants.bind_user_id(1, "Ivanov Petr", 10).await.unwrap();
        assert!(db.participants.select_active_by_user(1, 10).await.unwrap().is_some());

        db.participants.deactivate(1, "Ivanov Petr").await.unwrap();
        assert!(db.participants.select_active_by_user(1, 10).await.unwrap().is_none());
    });

    db_test!(distinct_chat_ids_cover_inactive_rosters, |db| {
        declare!(db, 1, ["Ivanov Petr"]);
        declare!(db, 2, ["Petrov Maxim"]);
        db.participants.deactivate(2, "Petrov Maxim").await.unwrap();

        let mut chats = db.participants.select_distinct_chat_ids().await.unwrap();
        chats.sort();
        assert_eq!(chats, [1, 2]);
    });
}

mod daily_report_table_tests {
    use super::*;

    db_test!(add_photos_creates_row, |db| {
        db.daily_reports.add_photos(1, 10, d("2025-03-09"), 1, 2).await.unwrap();

        let report = db
            .daily_reports
            .select_one(1, 10, d("2025-03-09"))
            .await
            .unwrap()
            .expect("report row");
        assert_eq!(report.photo_count, 1);
    });

    db_test!(add_photos_accumulates_to_cap, |db| {
        db.daily_reports.add_photos(1, 10, d("2025-03-09"), 1, 2).await.unwrap();
        db.daily_reports.add_photos(1, 10, d("2025-03-09"), 1, 2).await.unwrap();
        db.daily_reports.add_photos(1, 10, d("2025-03-09"), 3, 2).await.unwrap();

        let report = db
            .daily_reports
            .select_one(1, 10, d("2025-03-09"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.photo_count, 2);
    });

    db_test!(add_photos_caps_single_large_delta, |db| {
        db.daily_reports.add_photos(1, 10, d("2025-03-09"), 7, 2).await.unwrap();

        let report = db
            .daily_reports
            .select_one(1, 10, d("2025-03-09"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.photo_count, 2);
    });

    db_test!(reports_are_keyed_per_day_and_user, |db| {
        db.daily_reports.add_photos(1, 10, d("2025-03-09"), 2, 2).await.unwrap();
        db.daily_reports.add_photos(1, 10, d("2025-03-10"), 1, 2).await.unwrap();
        db.daily_reports.add_photos(1, 11, d("2025-03-09"), 1, 2).await.unwrap();

        let a = db.daily_reports.select_one(1, 10, d("2025-03-09")).await.unwrap().unwrap();
        let b = db.daily_reports.select_one(1, 10, d("2025-03-10")).await.unwrap().unwrap();
        let c = db.daily_reports.select_one(1, 11, d("2025-03-09")).await.unwrap().unwrap();
        assert_eq!((a.photo_count, b.photo_count, c.photo_count), (2, 1, 1));
    });

    db_test!(select_one_missing_returns_none, |db| {
        let report = db.daily_reports.select_one(1, 10, d("2025-03-09")).await.unwrap();
        assert!(report.is_none());
    });
}

mod backfill_mark_tests {
    use super::*;

    db_test!(try_mark_once_per_chat, |db| {
        assert!(db.backfill_marks.try_mark(1, d("2025-03-09")).await.unwrap());
        assert!(!db.backfill_marks.try_mark(1, d("2025-03-09")).await.unwrap());
        // the mark covers the chat's whole lifetime, not one game day
        assert!(!db.backfill_marks.try_mark(1, d("2025-03-10")).await.unwrap());

        // other chats mark independently
        assert!(db.backfill_marks.try_mark(2, d("2025-03-09")).await.unwrap());
    });

    db_test!(select_one_returns_the_recorded_mark, |db| {
        assert!(db.backfill_marks.select_one(1).await.unwrap().is_none());

        db.backfill_marks.try_mark(1, d("2025-03-09")).await.unwrap();
        db.backfill_marks.try_mark(1, d("2025-03-10")).await.unwrap();
        let mark = db.backfill_marks.select_one(1).await.unwrap().expect("mark row");
        assert_eq!(mark.chat_id, 1);
        // the losing insert does not move the recorded day
        assert_eq!(mark.game_date, d("2025-03-09"));
    });
}
