use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Integer cell in the provider's 5 km forecast grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub nx: i32,
    pub ny: i32,
}

/// Sky condition, mapped from the provider's SKY category codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sky {
    #[default]
    Clear,
    PartlyCloudy,
    Overcast,
}

impl Sky {
    /// SKY code mapping: 1 clear, 3 partly cloudy, 4 overcast.
    /// Unknown codes degrade to clear rather than failing the request.
    pub fn from_code(code: i64) -> Self {
        match code {
            3 => Sky::PartlyCloudy,
            4 => Sky::Overcast,
            _ => Sky::Clear,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sky::Clear => "Clear",
            Sky::PartlyCloudy => "Partly cloudy",
            Sky::Overcast => "Overcast",
        }
    }
}

/// Precipitation form, mapped from the provider's PTY category codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Precipitation {
    #[default]
    None,
    Rain,
    RainSnow,
    Snow,
    Shower,
}

impl Precipitation {
    /// PTY code mapping: 0 none, 1 rain, 2 rain/snow, 3 snow, 4 shower.
    /// Unknown codes degrade to none.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Precipitation::Rain,
            2 => Precipitation::RainSnow,
            3 => Precipitation::Snow,
            4 => Precipitation::Shower,
            _ => Precipitation::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Precipitation::None => "None",
            Precipitation::Rain => "Rain",
            Precipitation::RainSnow => "Rain/snow",
            Precipitation::Snow => "Snow",
            Precipitation::Shower => "Shower",
        }
    }
}

/// One slot of the 6-hour forecast strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Slot label, e.g. "14:00".
    pub time: String,
    pub temperature: f64,
    pub sky: Sky,
    pub precipitation: Precipitation,
}

/// One entry of the 3-day outlook (today, tomorrow, day after).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySample {
    /// ISO date, e.g. "2026-01-28".
    pub date: String,
    /// Display label, e.g. "Today (Wed)".
    pub label: String,
    /// Short weekday name, e.g. "Wed". Exposed so callers can flag weekends.
    pub weekday_short: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub sky: Sky,
    pub precipitation: Precipitation,
}

/// Normalized weather snapshot for one location.
///
/// Invariant: `min_temp <= temperature <= max_temp` (enforced during
/// reconciliation, the raw feeds do not guarantee it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub temperature: f64,
    pub humidity: f64,
    pub sky: Sky,
    pub precipitation: Precipitation,
    pub wind_speed: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub hourly: Vec<HourlySample>,
    pub daily: Vec<DailySample>,
    /// Bulletin stamp of the hourly/current data, "YYYY-MM-DD HH:mm" KST.
    pub bulletin_time_instant: String,
    /// Bulletin stamp of the 3-day data. May legitimately differ from the
    /// instant stamp, the two feeds publish on different schedules.
    pub bulletin_time_daily: String,
}
