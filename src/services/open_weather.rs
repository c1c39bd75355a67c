// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenWeather API client for current conditions and the 3-hourly forecast.

use super::{check_response_json, FetchError, WeatherProvider};
use crate::config::Config;
use crate::models::weather::ForecastResponse;
use crate::models::{Coordinate, CurrentConditions, WeatherSnapshot};
use async_trait::async_trait;

/// OpenWeather API client.
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client with the given API key.
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build a client from application config.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(
            http,
            config.open_weather_base_url.clone(),
            config.open_weather_api_key.clone(),
        )
    }

    /// Current conditions at a coordinate.
    pub async fn current_conditions(
        &self,
        coord: Coordinate,
    ) -> Result<CurrentConditions, FetchError> {
        self.get_json("weather", coord).await
    }

    /// 3-hourly forecast at a coordinate.
    pub async fn forecast(&self, coord: Coordinate) -> Result<ForecastResponse, FetchError> {
        self.get_json("forecast", coord).await
    }

    /// Generic GET against an OpenWeather route.
    async fn get_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        route: &str,
        coord: Coordinate,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, route);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("appid", self.api_key.clone()),
                ("lat", coord.lat.to_string()),
                ("lon", coord.lon.to_string()),
            ])
            .send()
            .await?;

        check_response_json(response).await
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    /// Fetch current conditions and forecast concurrently, then merge.
    async fn snapshot(&self, coord: Coordinate) -> Result<WeatherSnapshot, FetchError> {
        let (current, forecast) =
            tokio::try_join!(self.current_conditions(coord), self.forecast(coord))?;

        tracing::debug!(
            location = %current.name,
            hourly = forecast.list.len(),
            "Weather snapshot fetched"
        );

        Ok(WeatherSnapshot {
            current,
            hourly: forecast.list,
        })
    }
}
