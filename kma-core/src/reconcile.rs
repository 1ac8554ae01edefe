//! Turns the raw item lists of one fetch round into a normalized
//! [`WeatherData`] snapshot.
//!
//! The feeds are inconsistent on purpose-relevant points: the same value
//! field is overloaded between observation and forecast, today's min/max is
//! frequently absent from late bulletins, and single-slot codes can
//! misrepresent a day. Every policy below exists to paper over one of those
//! gaps deterministically. Pure over already-fetched data.

use std::collections::BTreeSet;

use chrono::{NaiveDateTime, Timelike};

use crate::error::{Feed, WeatherError};
use crate::gateway::{FeedBundle, RawItem};
use crate::model::{DailySample, HourlySample, Precipitation, Sky, WeatherData};
use crate::schedule::{self, BulletinWindow};

const CAT_TEMPERATURE: &str = "T1H";
const CAT_HUMIDITY: &str = "REH";
const CAT_WIND_SPEED: &str = "WSD";
const CAT_SKY: &str = "SKY";
const CAT_PRECIPITATION: &str = "PTY";
const CAT_DAILY_MIN: &str = "TMN";
const CAT_DAILY_MAX: &str = "TMX";
const CAT_DAILY_TEMP: &str = "TMP";

/// Window used for the per-day representative sky/precipitation vote.
const AFTERNOON_START: i64 = 1200;
const AFTERNOON_END: i64 = 1800;

const HOURLY_SLOTS: usize = 6;
const DAILY_DAYS: usize = 3;

/// Lenient float parse: empty, missing or malformed values degrade to the
/// caller's default instead of failing the request.
fn safe_parse_f64(value: Option<&str>, default: f64) -> f64 {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().parse().unwrap_or(default),
        _ => default,
    }
}

fn safe_parse_i64(value: Option<&str>, default: i64) -> i64 {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Instantaneous reading from the current-observation feed. The feed
/// overloads both value fields on one item; the observation field wins when
/// both are present.
fn observed(items: &[RawItem], category: &str) -> f64 {
    let item = items.iter().find(|i| i.category == category);
    let value = item.and_then(|i| {
        i.obsr_value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or(i.fcst_value.as_deref())
    });
    safe_parse_f64(value, 0.0)
}

/// Smallest forecast time not earlier than `now_hhmm`; if the whole bulletin
/// is in the past (stale edge case) the latest available time is used.
fn closest_forecast_time(items: &[RawItem], now_hhmm: &str) -> String {
    let times: BTreeSet<&str> = items
        .iter()
        .filter_map(|i| i.fcst_time.as_deref())
        .filter(|t| !t.is_empty())
        .collect();
    let now_num: i64 = now_hhmm.parse().unwrap_or(0);

    for time in &times {
        if let Ok(n) = time.parse::<i64>() {
            if n >= now_num {
                return (*time).to_string();
            }
        }
    }
    times
        .iter()
        .next_back()
        .map(|t| (*t).to_string())
        .unwrap_or_else(|| now_hhmm.to_string())
}

fn value_at<'a>(items: &'a [RawItem], category: &str, time: &str) -> Option<&'a str> {
    items
        .iter()
        .find(|i| i.category == category && i.fcst_time.as_deref() == Some(time))
        .and_then(|i| i.fcst_value.as_deref())
}

fn code_at(items: &[RawItem], category: &str, time: &str, default: i64) -> i64 {
    safe_parse_i64(value_at(items, category, time), default)
}

/// Most frequent code among the given items. Ties resolve to the code seen
/// first in iteration order, which keeps the result deterministic for a
/// fixed input ordering.
fn majority_code(items: &[&RawItem], default: i64) -> i64 {
    let mut counts: Vec<(i64, usize)> = Vec::new();
    for item in items {
        let code = safe_parse_i64(item.fcst_value.as_deref(), default);
        match counts.iter_mut().find(|(c, _)| *c == code) {
            Some((_, n)) => *n += 1,
            None => counts.push((code, 1)),
        }
    }

    let mut best = default;
    let mut best_count = 0usize;
    for (code, count) in counts {
        if count > best_count {
            best = code;
            best_count = count;
        }
    }
    best
}

fn afternoon_items<'a>(items: &'a [RawItem], category: &str, date: &str) -> Vec<&'a RawItem> {
    items
        .iter()
        .filter(|i| {
            i.category == category
                && i.fcst_date.as_deref() == Some(date)
                && i
                    .fcst_time
                    .as_deref()
                    .and_then(|t| t.parse::<i64>().ok())
                    .is_some_and(|n| (AFTERNOON_START..=AFTERNOON_END).contains(&n))
        })
        .collect()
}

/// First item matching the highest-priority rule. Keeping the rules as an
/// ordered list makes the fallback chain auditable instead of burying it in
/// nested conditionals.
fn pick_by_priority<'a>(
    items: &[&'a RawItem],
    rules: &[&dyn Fn(&RawItem) -> bool],
) -> Option<&'a RawItem> {
    rules
        .iter()
        .find_map(|rule| items.iter().copied().find(|item| rule(item)))
}

/// Min/max item for one date: the 02:00 bulletin edition is preferred, any
/// bulletin for that date second.
fn extreme_for_date<'a>(items: &[&'a RawItem], date: &str) -> Option<&'a RawItem> {
    let from_0200 = |i: &RawItem| {
        i.fcst_date.as_deref() == Some(date) && i.base_time.as_deref() == Some("0200")
    };
    let any_bulletin = |i: &RawItem| i.fcst_date.as_deref() == Some(date);
    pick_by_priority(items, &[&from_0200, &any_bulletin])
}

fn finite_values<'a>(items: impl IntoIterator<Item = &'a RawItem>) -> Vec<f64> {
    items
        .into_iter()
        .filter_map(|i| i.fcst_value.as_deref())
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect()
}

fn iso_date(yyyymmdd: &str) -> String {
    if yyyymmdd.len() == 8 {
        format!(
            "{}-{}-{}",
            &yyyymmdd[..4],
            &yyyymmdd[4..6],
            &yyyymmdd[6..8]
        )
    } else {
        yyyymmdd.to_string()
    }
}

/// Reconcile one fetch round into a [`WeatherData`] snapshot.
///
/// The current-observation and short-range feeds are load-bearing and must
/// be non-empty; the daily feed may be arbitrarily sparse and only degrades
/// the output through the fallback policies.
pub fn reconcile(
    feeds: &FeedBundle,
    now: NaiveDateTime,
    ultra: &BulletinWindow,
    daily_window: &BulletinWindow,
) -> Result<WeatherData, WeatherError> {
    if feeds.current.is_empty() {
        return Err(WeatherError::NoData { feed: Feed::Current });
    }
    if feeds.forecast.is_empty() {
        return Err(WeatherError::NoData { feed: Feed::Forecast });
    }

    let now_hhmm = format!("{:02}{:02}", now.hour(), now.minute());
    let selected_time = closest_forecast_time(&feeds.forecast, &now_hhmm);

    let temperature = observed(&feeds.current, CAT_TEMPERATURE);
    let humidity = observed(&feeds.current, CAT_HUMIDITY);
    let wind_speed = observed(&feeds.current, CAT_WIND_SPEED);

    let sky = Sky::from_code(code_at(&feeds.forecast, CAT_SKY, &selected_time, 1));
    let precipitation =
        Precipitation::from_code(code_at(&feeds.forecast, CAT_PRECIPITATION, &selected_time, 0));

    let today = schedule::date_string(now, 0);

    // TMN/TMX pool: the primary bulletin plus whatever the 02:00 edition
    // adds for today.
    let mut min_items: Vec<&RawItem> = feeds
        .daily
        .iter()
        .filter(|i| i.category == CAT_DAILY_MIN)
        .collect();
    min_items.extend(
        feeds
            .daily_0200
            .iter()
            .filter(|i| i.category == CAT_DAILY_MIN && i.fcst_date.as_deref() == Some(today.as_str())),
    );
    let mut max_items: Vec<&RawItem> = feeds
        .daily
        .iter()
        .filter(|i| i.category == CAT_DAILY_MAX)
        .collect();
    max_items.extend(
        feeds
            .daily_0200
            .iter()
            .filter(|i| i.category == CAT_DAILY_MAX && i.fcst_date.as_deref() == Some(today.as_str())),
    );

    // Today's extremes. Late bulletins often forecast TMN/TMX only for
    // tomorrow onward; when today's are absent, synthesize from the current
    // temperature and today's hourly TMP samples.
    let today_min_values = finite_values(
        min_items
            .iter()
            .copied()
            .filter(|i| i.fcst_date.as_deref() == Some(today.as_str())),
    );
    let today_max_values = finite_values(
        max_items
            .iter()
            .copied()
            .filter(|i| i.fcst_date.as_deref() == Some(today.as_str())),
    );

    let (mut min_temp, mut max_temp) =
        if !today_min_values.is_empty() && !today_max_values.is_empty() {
            (
                today_min_values.iter().copied().fold(f64::INFINITY, f64::min),
                today_max_values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        } else {
            let mut samples = vec![temperature];
            samples.extend(finite_values(feeds.daily.iter().filter(|i| {
                i.category == CAT_DAILY_TEMP && i.fcst_date.as_deref() == Some(today.as_str())
            })));
            (
                samples.iter().copied().fold(f64::INFINITY, f64::min),
                samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };

    // The provider occasionally reports extremes inconsistent with its own
    // observation. Nudge the offending bound instead of returning a
    // physically impossible triple.
    if min_temp > temperature {
        min_temp = temperature - 2.0;
    }
    if max_temp < temperature {
        max_temp = temperature + 2.0;
    }

    let mut daily = Vec::with_capacity(DAILY_DAYS);
    for index in 0..DAILY_DAYS {
        let date = schedule::date_string(now, index as u64);
        let weekday = schedule::weekday_short(&date);

        let day_sky = Sky::from_code(majority_code(
            &afternoon_items(&feeds.daily, CAT_SKY, &date),
            1,
        ));
        let day_precipitation = Precipitation::from_code(majority_code(
            &afternoon_items(&feeds.daily, CAT_PRECIPITATION, &date),
            0,
        ));

        let min_value = extreme_for_date(&min_items, &date)
            .and_then(|i| i.fcst_value.as_deref())
            .filter(|v| !v.trim().is_empty());
        let day_min = match min_value {
            Some(v) => safe_parse_f64(Some(v), temperature - 5.0),
            None if index == 0 => min_temp,
            None => temperature - 5.0 - 2.0 * index as f64,
        };
        let max_value = extreme_for_date(&max_items, &date)
            .and_then(|i| i.fcst_value.as_deref())
            .filter(|v| !v.trim().is_empty());
        let day_max = match max_value {
            Some(v) => safe_parse_f64(Some(v), temperature + 5.0),
            None if index == 0 => max_temp,
            None => temperature + 5.0 - 2.0 * index as f64,
        };

        let label = match index {
            0 => format!("Today ({weekday})"),
            1 => format!("Tomorrow ({weekday})"),
            _ => format!("Day after ({weekday})"),
        };

        daily.push(DailySample {
            date: iso_date(&date),
            label,
            weekday_short: weekday,
            min_temp: day_min,
            max_temp: day_max,
            sky: day_sky,
            precipitation: day_precipitation,
        });
    }

    // Hourly strip: distinct forecast times from the current hour floor
    // onward, at most six slots.
    let current_hour_num = i64::from(now.hour()) * 100;
    let times: BTreeSet<&str> = feeds
        .forecast
        .iter()
        .filter_map(|i| i.fcst_time.as_deref())
        .filter(|t| !t.is_empty())
        .collect();
    let mut hourly = Vec::new();
    for time in times
        .iter()
        .copied()
        .filter(|t| t.parse::<i64>().is_ok_and(|n| n >= current_hour_num))
        .take(HOURLY_SLOTS)
    {
        hourly.push(HourlySample {
            time: format!("{}:00", time.get(..2).unwrap_or(time)),
            temperature: safe_parse_f64(value_at(&feeds.forecast, CAT_TEMPERATURE, time), temperature),
            sky: Sky::from_code(code_at(&feeds.forecast, CAT_SKY, time, 1)),
            precipitation: Precipitation::from_code(code_at(
                &feeds.forecast,
                CAT_PRECIPITATION,
                time,
                0,
            )),
        });
    }

    Ok(WeatherData {
        temperature,
        humidity,
        sky,
        precipitation,
        wind_speed,
        min_temp,
        max_temp,
        hourly,
        daily,
        bulletin_time_instant: ultra.formatted(),
        bulletin_time_daily: daily_window.formatted(),
    })
}
