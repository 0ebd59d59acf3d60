use std::collections::HashSet;
use std::path::PathBuf;

/// A recurring wall-clock time-of-day anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorTime {
    pub hour: u32,
    pub minute: u32,
}

impl AnchorTime {
    /// Parses `"HH:MM"`; malformed or out-of-range input yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.split_once(':')?;
        let hour = h.trim().parse().ok()?;
        let minute = m.trim().parse().ok()?;
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }
}

impl std::fmt::Display for AnchorTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Clone)]
pub struct Config {
    pub db_url: String,
    pub db_path: String,
    pub logs_path: PathBuf,
    /// Fixed civil timezone offset, in hours east of UTC.
    pub tz_offset_hours: i32,
    /// Daily reminder for participants still short of the quota.
    pub reminder_at: AnchorTime,
    /// Daily elimination sweep over the previous game day.
    pub sweep_at: AnchorTime,
    /// Monthly finalist announcement on day 1.
    pub finalists_at: AnchorTime,
    pub history_page_size: u32,
    /// Safety bound on the backfill paging loop.
    pub history_max_pages: u32,
    /// Platform ids allowed to declare rosters (consumed by the command layer).
    pub admin_ids: HashSet<i64>,
}

impl Config {
    pub fn new() -> Self {
        dotenv::dotenv().ok();
        Self {
            db_url: std::env::var("DB_URL").unwrap_or("sqlite://data.db".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or("data.db".to_string()),
            logs_path: std::env::var("LOGS_PATH").unwrap_or("logs".to_string()).into(),
            tz_offset_hours: env_parse("TZ_OFFSET_HOURS", 3),
            reminder_at: env_anchor("REMINDER_TIME", AnchorTime { hour: 22, minute: 0 }),
            sweep_at: env_anchor("SWEEP_TIME", AnchorTime { hour: 6, minute: 1 }),
            finalists_at: env_anchor("FINALISTS_TIME", AnchorTime { hour: 6, minute: 2 }),
            history_page_size: env_parse("HISTORY_PAGE_SIZE", 200),
            history_max_pages: env_parse("HISTORY_MAX_PAGES", 50),
            admin_ids: std::env::var("ADMIN_IDS")
                .unwrap_or_default()
                .split(',')
                .filter_map(|x| x.trim().parse().ok())
                .collect(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_anchor(key: &str, default: AnchorTime) -> AnchorTime {
    std::env::var(key)
        .ok()
        .and_then(|v| AnchorTime::parse(&v))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_time_parse() {
        assert_eq!(AnchorTime::parse("22:00"), Some(AnchorTime { hour: 22, minute: 0 }));
        assert_eq!(AnchorTime::parse("6:01"), Some(AnchorTime { hour: 6, minute: 1 }));
        assert_eq!(AnchorTime::parse("24:00"), None);
        assert_eq!(AnchorTime::parse("12:60"), None);
        assert_eq!(AnchorTime::parse("noon"), None);
    }

    #[test]
    fn test_anchor_time_display() {
        assert_eq!(AnchorTime { hour: 6, minute: 2 }.to_string(), "06:02");
    }
}
