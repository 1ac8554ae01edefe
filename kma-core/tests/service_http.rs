//! End-to-end tests over real HTTP against a mock KMA endpoint.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kma_core::{Feed, Precipitation, Sky, WeatherError, WeatherService};

/// Fixed test clock: Wednesday 2026-01-28, 14:05 KST.
fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 28)
        .expect("valid date")
        .and_hms_opt(14, 5, 0)
        .expect("valid time")
}

fn envelope(items: Value) -> Value {
    json!({
        "response": {
            "header": { "resultCode": "00", "resultMsg": "NORMAL_SERVICE" },
            "body": { "items": { "item": items } }
        }
    })
}

fn error_envelope(code: &str, msg: &str) -> Value {
    json!({
        "response": {
            "header": { "resultCode": code, "resultMsg": msg }
        }
    })
}

fn current_items() -> Value {
    json!([
        { "category": "T1H", "obsrValue": "18.0" },
        { "category": "REH", "obsrValue": "55" },
        { "category": "WSD", "obsrValue": "2.0" }
    ])
}

fn forecast_items() -> Value {
    json!([
        { "category": "T1H", "fcstValue": "17.0", "fcstTime": "1500" },
        { "category": "SKY", "fcstValue": "1", "fcstTime": "1500" },
        { "category": "PTY", "fcstValue": "0", "fcstTime": "1500" }
    ])
}

fn daily_items() -> Value {
    json!([
        { "category": "TMP", "fcstValue": "13.0", "fcstDate": "20260128", "fcstTime": "1500" },
        { "category": "TMP", "fcstValue": "17.0", "fcstDate": "20260128", "fcstTime": "1800" },
        { "category": "TMN", "fcstValue": "10.0", "fcstDate": "20260129", "baseTime": "1100" },
        { "category": "TMX", "fcstValue": "20.0", "fcstDate": "20260129", "baseTime": "1100" }
    ])
}

fn service_for(server: &MockServer) -> WeatherService {
    WeatherService::new("TEST_KEY".into())
        .expect("key is configured")
        .with_base_url(server.uri())
}

#[tokio::test]
async fn afternoon_lookup_returns_normalized_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getUltraSrtNcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(current_items())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/getUltraSrtFcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(forecast_items())))
        .mount(&server)
        .await;
    // Serves both the primary 11:00 bulletin and the 02:00 supplement.
    Mock::given(method("GET"))
        .and(path("/getVilageFcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(daily_items())))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let data = service
        .get_weather_at(37.5665, 126.9780, test_now())
        .await
        .expect("lookup succeeds");

    assert_eq!(data.temperature, 18.0);
    assert_eq!(data.humidity, 55.0);
    assert_eq!(data.wind_speed, 2.0);
    assert_eq!(data.sky, Sky::Clear);
    assert_eq!(data.precipitation, Precipitation::None);
    // Today synthesized from {18} ∪ {13, 17}; tomorrow explicit.
    assert_eq!(data.daily[0].min_temp, 13.0);
    assert_eq!(data.daily[0].max_temp, 18.0);
    assert_eq!(data.daily[1].min_temp, 10.0);
    assert_eq!(data.daily[1].max_temp, 20.0);
    assert!(data.min_temp <= data.temperature && data.temperature <= data.max_temp);
    assert_eq!(data.bulletin_time_instant, "2026-01-28 14:00");
    assert_eq!(data.bulletin_time_daily, "2026-01-28 11:00");
    assert_eq!(data.hourly.len(), 1);
    assert_eq!(data.hourly[0].time, "15:00");
}

#[tokio::test]
async fn envelope_failure_on_current_feed_aborts_the_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getUltraSrtNcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_envelope("03", "NO_DATA")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/getUltraSrtFcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(forecast_items())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/getVilageFcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(daily_items())))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let err = service
        .get_weather_at(37.5665, 126.9780, test_now())
        .await
        .unwrap_err();

    match err {
        WeatherError::Provider { feed, code, .. } => {
            assert_eq!(feed, Feed::Current);
            assert_eq!(code, "03");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_0200_supplement_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getUltraSrtNcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(current_items())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/getUltraSrtFcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(forecast_items())))
        .mount(&server)
        .await;
    // The 02:00 supplement blows up; the primary 11:00 bulletin works.
    Mock::given(method("GET"))
        .and(path("/getVilageFcst"))
        .and(query_param("base_time", "0200"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/getVilageFcst"))
        .and(query_param("base_time", "1100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(daily_items())))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let data = service
        .get_weather_at(37.5665, 126.9780, test_now())
        .await
        .expect("supplement failure must not surface");

    assert_eq!(data.daily[1].min_temp, 10.0);
    assert_eq!(data.daily[1].max_temp, 20.0);
}

#[tokio::test]
async fn single_item_payload_decodes_as_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getUltraSrtNcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(current_items())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/getUltraSrtFcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(forecast_items())))
        .mount(&server)
        .await;
    // One-element arrays arrive pruned to a bare object upstream.
    Mock::given(method("GET"))
        .and(path("/getVilageFcst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(
            { "category": "TMN", "fcstValue": "10.0", "fcstDate": "20260129" }
        ))))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let data = service
        .get_weather_at(37.5665, 126.9780, test_now())
        .await
        .expect("lookup succeeds");

    assert_eq!(data.daily[1].min_temp, 10.0);
}
