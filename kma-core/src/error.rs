use std::fmt;

use thiserror::Error;

/// One of the three forecast feeds the provider exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Hourly current-observation feed (getUltraSrtNcst).
    Current,
    /// Ultra-short-range 6-hour forecast feed (getUltraSrtFcst).
    Forecast,
    /// Short-range multi-day forecast feed (getVilageFcst).
    Daily,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Current => "current",
            Feed::Forecast => "forecast",
            Feed::Daily => "daily",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the weather pipeline.
///
/// Individual scalar fields never produce errors: malformed or missing
/// numeric strings fall back to documented defaults instead. Only whole-feed
/// failures reach the caller.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// No service key available. Raised before any network call.
    #[error("KMA service key is not configured. Hint: run `kma-weather configure` or set KMA_SERVICE_KEY")]
    Configuration,

    /// The provider answered but signaled failure in its response envelope.
    #[error("{feed} feed rejected the request (code {code}): {message}")]
    Provider {
        feed: Feed,
        code: String,
        message: String,
    },

    /// The provider answered success but a load-bearing feed carried no items.
    #[error("{feed} feed returned no items")]
    NoData { feed: Feed },

    /// HTTP transport or JSON decoding failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_names_are_stable() {
        assert_eq!(Feed::Current.to_string(), "current");
        assert_eq!(Feed::Forecast.to_string(), "forecast");
        assert_eq!(Feed::Daily.to_string(), "daily");
    }

    #[test]
    fn provider_error_mentions_feed_and_code() {
        let err = WeatherError::Provider {
            feed: Feed::Daily,
            code: "03".into(),
            message: "NO_DATA".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("daily"));
        assert!(msg.contains("03"));
        assert!(msg.contains("NO_DATA"));
    }
}
