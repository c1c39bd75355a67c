// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client tests against a local fake of the upstream APIs.

use axum::{
    extract::{Form, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use weather_feed::models::Coordinate;
use weather_feed::services::{
    ActivityProvider, FetchError, GarminClient, OpenWeatherClient, WeatherProvider,
};

#[derive(Default)]
struct Upstream {
    weather_status: AtomicUsize,
    logins: AtomicUsize,
    /// Reject the next activity request with 401
    expire_next: AtomicBool,
}

async fn current(
    State(upstream): State<Arc<Upstream>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let status = upstream.weather_status.load(Ordering::SeqCst);
    if status != 0 {
        let code = StatusCode::from_u16(status as u16).unwrap();
        return (code, Json(json!({"message": "nope"})));
    }
    assert_eq!(params.get("appid").map(String::as_str), Some("test_key"));

    (
        StatusCode::OK,
        Json(json!({
            "coord": {"lat": params["lat"].parse::<f64>().unwrap(), "lon": params["lon"].parse::<f64>().unwrap()},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "main": {"temp": 293.15, "feels_like": 292.0, "temp_min": 290.0, "temp_max": 295.0,
                     "pressure": 1013, "humidity": 40},
            "wind": {"speed": 3.6, "deg": 200},
            "dt": 1714567890,
            "name": "Springfield"
        })),
    )
}

async fn forecast(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    assert_eq!(params.get("appid").map(String::as_str), Some("test_key"));
    let entry = |dt: i64, rain: f64| {
        json!({
            "dt": dt,
            "dt_txt": "2024-05-01 15:00:00",
            "main": {"temp": 290.0, "humidity": 50},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "wind": {"speed": 5.0, "deg": 180},
            "rain": {"3h": rain}
        })
    };
    Json(json!({
        "cod": "200",
        "cnt": 2,
        "list": [entry(1714575600, 0.5), entry(1714586400, 1.25)],
        "city": {"name": "Springfield"}
    }))
}

async fn login(
    State(upstream): State<Arc<Upstream>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    if form.get("password").map(String::as_str) != Some("correct-horse") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad credentials"})));
    }
    let n = upstream.logins.fetch_add(1, Ordering::SeqCst) + 1;
    (
        StatusCode::OK,
        Json(json!({"access_token": format!("token-{n}"), "expires_in": 3600})),
    )
}

async fn activities(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !auth.starts_with("Bearer token-") || upstream.expire_next.swap(false, Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "expired"})));
    }
    assert_eq!(params.get("limit").map(String::as_str), Some("10"));

    (
        StatusCode::OK,
        Json(json!([
            {"activityId": 2, "activityName": "Tempo", "startTimeGMT": "2024-05-02 14:00:00",
             "distance": 8000.0, "averageSpeed": 3.5, "activityType": {"typeKey": "running"}},
            {"activityId": 1, "activityName": "Easy", "startTimeGMT": "2024-05-01 14:00:00",
             "distance": 5000.0, "averageSpeed": 2.9, "activityType": {"typeKey": "running"}}
        ])),
    )
}

async fn spawn_upstream() -> (String, Arc<Upstream>) {
    let upstream = Arc::new(Upstream::default());
    let app = Router::new()
        .route("/data/2.5/weather", get(current))
        .route("/data/2.5/forecast", get(forecast))
        .route("/sso/signin", post(login))
        .route(
            "/activitylist-service/activities/search/activities",
            get(activities),
        )
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), upstream)
}

fn weather_client(base: &str) -> OpenWeatherClient {
    OpenWeatherClient::new(
        reqwest::Client::new(),
        format!("{base}/data/2.5/"),
        "test_key".to_string(),
    )
}

fn garmin_client(base: &str, password: &str) -> GarminClient {
    GarminClient::new(
        reqwest::Client::new(),
        format!("{base}/sso/signin"),
        base.to_string(),
        "runner@example.com".to_string(),
        password.to_string(),
    )
}

#[tokio::test]
async fn test_weather_snapshot_merges_current_and_forecast() {
    let (base, _) = spawn_upstream().await;
    let client = weather_client(&base);

    let snapshot = client
        .snapshot(Coordinate::new(40.0, -74.0).unwrap())
        .await
        .unwrap();

    assert_eq!(snapshot.current.name, "Springfield");
    assert_eq!(snapshot.current.main.humidity, 40.0);
    assert_eq!(snapshot.hourly.len(), 2);
    assert_eq!(snapshot.hourly[1].rain_3h(), 1.25);
}

#[tokio::test]
async fn test_weather_error_statuses() {
    let (base, upstream) = spawn_upstream().await;
    let client = weather_client(&base);
    let coord = Coordinate::new(1.0, 1.0).unwrap();

    upstream.weather_status.store(429, Ordering::SeqCst);
    assert!(matches!(
        client.snapshot(coord).await,
        Err(FetchError::RateLimited)
    ));

    upstream.weather_status.store(500, Ordering::SeqCst);
    assert!(matches!(
        client.snapshot(coord).await,
        Err(FetchError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_garmin_session_is_reused() {
    let (base, upstream) = spawn_upstream().await;
    let client = garmin_client(&base, "correct-horse");

    let first = client.recent_activities().await.unwrap();
    let second = client.clone().recent_activities().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].activity_id, 2);
    assert_eq!(first[0].start_time, "2024-05-02T14:00:00Z");
    assert_eq!(first, second);
    assert_eq!(upstream.logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_garmin_logs_in_again_after_rejection() {
    let (base, upstream) = spawn_upstream().await;
    let client = garmin_client(&base, "correct-horse");

    client.recent_activities().await.unwrap();
    upstream.expire_next.store(true, Ordering::SeqCst);

    let activities = client.recent_activities().await.unwrap();
    assert_eq!(activities.len(), 2);
    assert_eq!(upstream.logins.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_garmin_bad_credentials() {
    let (base, upstream) = spawn_upstream().await;
    let client = garmin_client(&base, "wrong");

    let err = client.recent_activities().await.unwrap_err();
    assert!(matches!(err, FetchError::Auth(_)));
    assert_eq!(upstream.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_transport_error_omits_api_key() {
    // Nothing listens on this port once the listener is dropped.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let key = "SECRET_API_KEY_123";
    let client = OpenWeatherClient::new(
        reqwest::Client::new(),
        format!("http://{addr}/data/2.5"),
        key.to_string(),
    );

    let err = client
        .snapshot(Coordinate::new(1.0, 1.0).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Http(_)));

    let logged = format!("{err} {err:?}");
    assert!(!logged.contains(key), "API key leaked: {logged}");
}
