// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use weather_feed::config::Config;
use weather_feed::models::weather::{HourlyForecast, MainReadings, Wind};
use weather_feed::models::{ActivityRecord, Coordinate, CurrentConditions, WeatherSnapshot};
use weather_feed::routes::create_router;
use weather_feed::services::{ActivityProvider, FetchError, WeatherProvider};
use weather_feed::session::SessionDeps;
use weather_feed::AppState;

/// In-memory weather source; echoes the coordinate back in the location name.
#[derive(Default)]
pub struct FakeWeather {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn snapshot(&self, coord: Coordinate) -> Result<WeatherSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                status: 500,
                body: "upstream down".to_string(),
            });
        }

        let main = MainReadings {
            temp: 288.0,
            feels_like: 287.0,
            temp_min: 285.0,
            temp_max: 290.0,
            pressure: 1015.0,
            humidity: 55.0,
        };
        let wind = Wind {
            speed: 4.0,
            deg: 270.0,
        };

        Ok(WeatherSnapshot {
            current: CurrentConditions {
                dt: 1_700_000_000,
                name: format!("{},{}", coord.lat, coord.lon),
                main: main.clone(),
                weather: vec![],
                wind,
                rain: None,
                snow: None,
            },
            hourly: vec![HourlyForecast {
                dt: 1_700_010_800,
                dt_txt: "2023-11-15 01:00:00".to_string(),
                main,
                weather: vec![],
                wind,
                rain: None,
                snow: None,
            }],
        })
    }
}

/// In-memory activity source.
#[derive(Default)]
pub struct FakeActivities {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ActivityProvider for FakeActivities {
    async fn recent_activities(&self) -> Result<Vec<ActivityRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ActivityRecord {
            activity_id: 1,
            name: "Morning Run".to_string(),
            activity_type: "running".to_string(),
            start_time: "2024-05-01T13:00:00Z".to_string(),
            distance_m: 10_000.0,
            average_speed_mps: 3.3,
        }])
    }
}

/// Fakes plus the state wired to them.
#[allow(dead_code)]
pub struct TestApp {
    pub state: Arc<AppState>,
    pub weather: Arc<FakeWeather>,
    pub activities: Arc<FakeActivities>,
}

/// Create app state backed by in-memory fakes.
#[allow(dead_code)]
pub fn create_test_state(interval: Duration) -> TestApp {
    let weather = Arc::new(FakeWeather::default());
    let activities = Arc::new(FakeActivities::default());

    let deps = SessionDeps {
        weather: weather.clone(),
        activities: activities.clone(),
        weather_interval: interval,
        activity_interval: interval,
    };

    TestApp {
        state: Arc::new(AppState::new(Config::default(), deps)),
        weather,
        activities,
    }
}

/// Create a test router with offline fakes.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, TestApp) {
    let app = create_test_state(Duration::from_secs(900));
    (create_router(app.state.clone()), app)
}

/// Bind the full server on an ephemeral port.
/// Dropping the returned sender shuts it down.
#[allow(dead_code)]
pub async fn spawn_server(state: Arc<AppState>) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let signal = async move {
            let _ = stop_rx.await;
        };
        weather_feed::serve_with_shutdown(listener, state, signal)
            .await
            .expect("Server failed");
    });

    (addr, stop_tx)
}
