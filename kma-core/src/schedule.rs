//! Bulletin (base time) selection for the KMA feeds.
//!
//! The provider publishes on a fixed KST schedule regardless of client
//! locale, and each bulletin becomes usable only after an observed latency.
//! All math here runs on civil KST time; [`now_kst`] converts the system
//! clock once at the pipeline entry.

use chrono::{FixedOffset, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Publication hours of the short/daily-range feed, KST.
const DAILY_PUBLICATION_HOURS: [u32; 8] = [2, 5, 8, 11, 14, 17, 20, 23];

/// Identifies one published bulletin of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletinWindow {
    /// "YYYYMMDD"
    pub base_date: String,
    /// "HHmm", always on the hour ("HH00").
    pub base_time: String,
}

impl BulletinWindow {
    /// Human-readable "YYYY-MM-DD HH:mm" stamp for display.
    pub fn formatted(&self) -> String {
        if self.base_date.len() == 8 && self.base_time.len() >= 4 {
            format!(
                "{}-{}-{} {}:{}",
                &self.base_date[..4],
                &self.base_date[4..6],
                &self.base_date[6..8],
                &self.base_time[..2],
                &self.base_time[2..4]
            )
        } else {
            format!("{} {}", self.base_date, self.base_time)
        }
    }
}

/// Current civil time in KST (UTC+9).
pub fn now_kst() -> NaiveDateTime {
    let kst = FixedOffset::east_opt(9 * 3600).expect("UTC+9 is a valid offset");
    Utc::now().with_timezone(&kst).naive_local()
}

/// Authoritative bulletin for the ultra-short-range feeds (current
/// observation and 6-hour forecast).
///
/// Published on the hour, but the upload lags by 10-20 minutes in practice,
/// so during the first 30 minutes of an hour the previous hour's bulletin is
/// the one actually available. Hour 0 rolls over to yesterday 23:00.
pub fn ultra_short_base_time(now: NaiveDateTime) -> BulletinWindow {
    let mut base_date = now.date();
    let mut base_hour = i64::from(now.hour());

    if now.minute() < 30 {
        base_hour -= 1;
        if base_hour < 0 {
            base_hour = 23;
            base_date = base_date.pred_opt().unwrap_or(base_date);
        }
    }

    BulletinWindow {
        base_date: base_date.format("%Y%m%d").to_string(),
        base_time: format!("{base_hour:02}00"),
    }
}

/// Authoritative bulletin for the short/daily-range feed.
///
/// Published at 02, 05, 08, 11, 14, 17, 20 and 23 KST; the latest of these
/// hours not after the current hour wins. Before 02:00 the newest edition is
/// still yesterday's 23:00 bulletin.
pub fn daily_base_time(now: NaiveDateTime) -> BulletinWindow {
    let hour = now.hour();

    if hour < DAILY_PUBLICATION_HOURS[0] {
        let yesterday = now.date().pred_opt().unwrap_or(now.date());
        return BulletinWindow {
            base_date: yesterday.format("%Y%m%d").to_string(),
            base_time: "2300".to_string(),
        };
    }

    let base_hour = DAILY_PUBLICATION_HOURS
        .iter()
        .rev()
        .find(|&&h| h <= hour)
        .copied()
        .unwrap_or(23);

    BulletinWindow {
        base_date: now.date().format("%Y%m%d").to_string(),
        base_time: format!("{base_hour:02}00"),
    }
}

/// True when the 02:00 daily bulletin is worth fetching on the side: late in
/// the day the regular daily bulletin no longer carries today's min/max, but
/// the 02:00 edition may.
pub fn should_fetch_0200(now: NaiveDateTime) -> bool {
    now.hour() >= 3
}

/// "YYYYMMDD" for the given day plus an offset in days.
pub fn date_string(now: NaiveDateTime, days_ahead: u64) -> String {
    let date = now
        .date()
        .checked_add_days(chrono::Days::new(days_ahead))
        .unwrap_or_else(|| now.date());
    date.format("%Y%m%d").to_string()
}

/// Short weekday name ("Mon".."Sun") for a "YYYYMMDD" date string.
pub fn weekday_short(yyyymmdd: &str) -> String {
    chrono::NaiveDate::parse_from_str(yyyymmdd, "%Y%m%d")
        .map(|d| d.format("%a").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
    }

    #[test]
    fn ultra_short_uses_current_hour_from_minute_30() {
        let window = ultra_short_base_time(at(2026, 1, 28, 14, 30));
        assert_eq!(window.base_date, "20260128");
        assert_eq!(window.base_time, "1400");
    }

    #[test]
    fn ultra_short_uses_previous_hour_before_minute_30() {
        let window = ultra_short_base_time(at(2026, 1, 28, 14, 29));
        assert_eq!(window.base_date, "20260128");
        assert_eq!(window.base_time, "1300");
    }

    #[test]
    fn ultra_short_rolls_over_midnight() {
        let window = ultra_short_base_time(at(2026, 1, 28, 0, 10));
        assert_eq!(window.base_date, "20260127");
        assert_eq!(window.base_time, "2300");
    }

    #[test]
    fn ultra_short_midnight_at_minute_30_stays_today() {
        let window = ultra_short_base_time(at(2026, 1, 28, 0, 30));
        assert_eq!(window.base_date, "20260128");
        assert_eq!(window.base_time, "0000");
    }

    #[test]
    fn daily_before_0200_uses_yesterday_2300() {
        let window = daily_base_time(at(2026, 1, 28, 1, 59));
        assert_eq!(window.base_date, "20260127");
        assert_eq!(window.base_time, "2300");
    }

    #[test]
    fn daily_at_0200_switches_to_today() {
        let window = daily_base_time(at(2026, 1, 28, 2, 0));
        assert_eq!(window.base_date, "20260128");
        assert_eq!(window.base_time, "0200");
    }

    #[test]
    fn daily_picks_latest_publication_hour_not_after_now() {
        for (hour, expected) in [
            (4, "0200"),
            (5, "0500"),
            (10, "0800"),
            (14, "1400"),
            (16, "1400"),
            (22, "2000"),
            (23, "2300"),
        ] {
            let window = daily_base_time(at(2026, 1, 28, hour, 5));
            assert_eq!(window.base_time, expected, "hour {hour}");
            assert_eq!(window.base_date, "20260128");
        }
    }

    #[test]
    fn formatted_renders_display_stamp() {
        let window = BulletinWindow {
            base_date: "20260128".into(),
            base_time: "1400".into(),
        };
        assert_eq!(window.formatted(), "2026-01-28 14:00");
    }

    #[test]
    fn supplement_fetch_starts_at_0300() {
        assert!(!should_fetch_0200(at(2026, 1, 28, 2, 59)));
        assert!(should_fetch_0200(at(2026, 1, 28, 3, 0)));
        assert!(should_fetch_0200(at(2026, 1, 28, 14, 5)));
    }

    #[test]
    fn date_string_adds_days() {
        let now = at(2026, 1, 31, 12, 0);
        assert_eq!(date_string(now, 0), "20260131");
        assert_eq!(date_string(now, 1), "20260201");
        assert_eq!(date_string(now, 2), "20260202");
    }

    #[test]
    fn weekday_short_names() {
        // 2026-01-28 is a Wednesday.
        assert_eq!(weekday_short("20260128"), "Wed");
        assert_eq!(weekday_short("not-a-date"), "");
    }
}
