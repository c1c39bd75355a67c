// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot HTTP form of the weather channel.

use crate::error::{AppError, Result};
use crate::models::{Coordinate, WeatherSnapshot};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/weather", get(get_weather))
}

#[derive(Deserialize)]
struct WeatherQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

fn parse_coordinate(query: WeatherQuery) -> Result<Coordinate> {
    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(AppError::BadRequest(
            "Both 'lat' and 'lon' are required".to_string(),
        ));
    };

    Coordinate::new(lat, lon).ok_or_else(|| {
        AppError::BadRequest(format!("Coordinate out of range: lat={lat}, lon={lon}"))
    })
}

/// Get current conditions and the hourly forecast for a coordinate.
async fn get_weather(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherSnapshot>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let coord = parse_coordinate(query)?;

    tracing::debug!(lat = coord.lat, lon = coord.lon, "Fetching weather snapshot");

    let snapshot = state.session_deps.weather.snapshot(coord).await?;
    Ok(Json(snapshot))
}
