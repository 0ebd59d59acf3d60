//! Game-day arithmetic and recurring wall-clock anchors.
//!
//! A game day runs from 06:00 to the next 06:00 in one fixed civil timezone
//! and is identified by the calendar date of its start. Everything here is
//! pure arithmetic over `DateTime<FixedOffset>`; no other module does its
//! own time math.

use chrono::DateTime;
use chrono::Datelike;
use chrono::Duration;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::Timelike;
use chrono::Utc;

/// Hour at which a new game day begins.
pub const GAME_DAY_START_HOUR: u32 = 6;

/// Game day containing `ts`: the calendar date, except `[00:00, 06:00)`
/// belongs to the previous date.
pub fn game_date(ts: DateTime<FixedOffset>) -> NaiveDate {
    if ts.hour() < GAME_DAY_START_HOUR {
        (ts - Duration::days(1)).date_naive()
    } else {
        ts.date_naive()
    }
}

/// Start instant (06:00) of the game day containing `ts`.
pub fn game_day_start(ts: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    at_time(game_date(ts), ts.offset(), GAME_DAY_START_HOUR, 0)
}

/// Next future occurrence of the given time of day. If `now` is at or past
/// today's occurrence, returns tomorrow's.
pub fn next_daily_anchor(
    now: DateTime<FixedOffset>,
    hour: u32,
    minute: u32,
) -> DateTime<FixedOffset> {
    let today = at_time(now.date_naive(), now.offset(), hour, minute);
    if now < today { today } else { today + Duration::days(1) }
}

/// Next future occurrence of the given day-of-month and time of day, rolling
/// into the next month (and year) when this month's occurrence has passed.
///
/// Days past a month's end clamp to its last day, so day 31 fires on
/// April 30th and February 28th/29th. The engine only uses day 1.
pub fn next_monthly_anchor(
    now: DateTime<FixedOffset>,
    day: u32,
    hour: u32,
    minute: u32,
) -> DateTime<FixedOffset> {
    let candidate =
        at_time(clamped_ymd(now.year(), now.month(), day), now.offset(), hour, minute);
    if now < candidate {
        return candidate;
    }
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    at_time(clamped_ymd(year, month, day), now.offset(), hour, minute)
}

/// Calendar date for (year, month, day) with `day` clamped into the month.
fn clamped_ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day.max(1)).unwrap_or_else(|| {
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("first of month")
            - Duration::days(1)
    })
}

fn at_time(
    date: NaiveDate,
    offset: &FixedOffset,
    hour: u32,
    minute: u32,
) -> DateTime<FixedOffset> {
    // A fixed offset has no DST gaps, so local times are always unambiguous
    date.and_hms_opt(hour, minute, 0)
        .and_then(|naive| naive.and_local_timezone(*offset).single())
        .expect("valid wall-clock time in a fixed offset")
}

/// Clock handle carrying the challenge's fixed civil timezone.
#[derive(Clone, Copy, Debug)]
pub struct GameClock {
    offset: FixedOffset,
}

impl GameClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Builds a clock from whole hours east of UTC; out-of-range offsets
    /// fall back to UTC.
    pub fn from_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset"));
        Self { offset }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    pub fn current_game_date(&self) -> NaiveDate {
        game_date(self.now())
    }

    /// Game day to evaluate at the morning sweep: the one containing
    /// "24 hours ago".
    pub fn previous_game_date(&self) -> NaiveDate {
        game_date(self.now() - Duration::days(1))
    }

    /// Game day of a unix timestamp (seconds); `None` for timestamps outside
    /// the representable range.
    pub fn game_date_of_unix(&self, secs: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(secs, 0).map(|ts| game_date(ts.with_timezone(&self.offset)))
    }
}
