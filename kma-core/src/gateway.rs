//! HTTP gateway to the KMA village forecast service.
//!
//! Fetches the three feeds concurrently for one grid cell and bulletin pair,
//! validates each response envelope and flattens the item payloads. All
//! reconciliation happens later on the returned [`FeedBundle`].

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Feed, WeatherError};
use crate::model::GridCell;
use crate::schedule::BulletinWindow;

const DEFAULT_BASE_URL: &str = "http://apis.data.go.kr/1360000/VilageFcstInfoService_2.0";
const SUCCESS_CODE: &str = "00";

/// One category/value pair from a feed. Values are strings and may be empty
/// or missing; numeric interpretation is deferred to the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub category: String,
    #[serde(rename = "fcstValue", skip_serializing_if = "Option::is_none")]
    pub fcst_value: Option<String>,
    #[serde(rename = "obsrValue", skip_serializing_if = "Option::is_none")]
    pub obsr_value: Option<String>,
    #[serde(rename = "fcstTime", skip_serializing_if = "Option::is_none")]
    pub fcst_time: Option<String>,
    #[serde(rename = "fcstDate", skip_serializing_if = "Option::is_none")]
    pub fcst_date: Option<String>,
    #[serde(rename = "baseDate", skip_serializing_if = "Option::is_none")]
    pub base_date: Option<String>,
    #[serde(rename = "baseTime", skip_serializing_if = "Option::is_none")]
    pub base_time: Option<String>,
}

/// The upstream format prunes one-element arrays to a bare object; decode
/// both shapes uniformly into a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: EnvelopeResponse,
}

#[derive(Debug, Deserialize)]
struct EnvelopeResponse {
    header: EnvelopeHeader,
    body: Option<EnvelopeBody>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeHeader {
    #[serde(rename = "resultCode")]
    result_code: String,
    #[serde(rename = "resultMsg", default)]
    result_msg: String,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    items: Option<EnvelopeItems>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeItems {
    item: Option<OneOrMany<RawItem>>,
}

/// Raw item lists of one fetch round, reconciler input.
#[derive(Debug, Default)]
pub struct FeedBundle {
    pub current: Vec<RawItem>,
    pub forecast: Vec<RawItem>,
    pub daily: Vec<RawItem>,
    /// Best-effort extra items from today's 02:00 daily bulletin. Empty when
    /// not requested or when that fetch failed.
    pub daily_0200: Vec<RawItem>,
}

#[derive(Debug, Clone)]
pub struct ProviderGateway {
    http: Client,
    service_key: String,
    base_url: String,
}

impl ProviderGateway {
    pub fn new(service_key: String) -> Self {
        Self {
            http: Client::new(),
            service_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the gateway at a different host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch the three feeds concurrently, plus today's 02:00 daily bulletin
    /// when `supplement_date` is given.
    ///
    /// Any of the three main fetches failing fails the whole round; partial
    /// results are not usable downstream. The supplementary fetch only
    /// sharpens today's min/max, so its failure is logged and ignored.
    pub async fn fetch_raw(
        &self,
        grid: GridCell,
        ultra: &BulletinWindow,
        daily: &BulletinWindow,
        supplement_date: Option<&str>,
    ) -> Result<FeedBundle, WeatherError> {
        let supplement = async {
            let Some(date) = supplement_date else {
                return Vec::new();
            };
            let window = BulletinWindow {
                base_date: date.to_string(),
                base_time: "0200".to_string(),
            };
            match self.fetch_feed(Feed::Daily, grid, &window).await {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!("02:00 daily bulletin fetch failed, continuing without it: {err}");
                    Vec::new()
                }
            }
        };

        let (current, forecast, daily_items, daily_0200) = tokio::join!(
            self.fetch_feed(Feed::Current, grid, ultra),
            self.fetch_feed(Feed::Forecast, grid, ultra),
            self.fetch_feed(Feed::Daily, grid, daily),
            supplement,
        );

        Ok(FeedBundle {
            current: current?,
            forecast: forecast?,
            daily: daily_items?,
            daily_0200,
        })
    }

    async fn fetch_feed(
        &self,
        feed: Feed,
        grid: GridCell,
        window: &BulletinWindow,
    ) -> Result<Vec<RawItem>, WeatherError> {
        let (operation, rows) = match feed {
            Feed::Current => ("getUltraSrtNcst", "10"),
            Feed::Forecast => ("getUltraSrtFcst", "60"),
            Feed::Daily => ("getVilageFcst", "900"),
        };
        let url = format!("{}/{}", self.base_url, operation);
        let nx = grid.nx.to_string();
        let ny = grid.ny.to_string();

        tracing::debug!(%feed, base_date = %window.base_date, base_time = %window.base_time, nx = grid.nx, ny = grid.ny, "fetching feed");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("pageNo", "1"),
                ("numOfRows", rows),
                ("dataType", "JSON"),
                ("base_date", window.base_date.as_str()),
                ("base_time", window.base_time.as_str()),
                ("nx", nx.as_str()),
                ("ny", ny.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let envelope: Envelope = res.json().await?;
        let header = envelope.response.header;
        if header.result_code != SUCCESS_CODE {
            return Err(WeatherError::Provider {
                feed,
                code: header.result_code,
                message: header.result_msg,
            });
        }

        Ok(envelope
            .response
            .body
            .and_then(|body| body.items)
            .and_then(|items| items.item)
            .map(OneOrMany::into_vec)
            .unwrap_or_default())
    }
}
