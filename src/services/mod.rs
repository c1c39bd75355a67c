// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - upstream data fetchers.
//!
//! Sessions only see the [`WeatherProvider`] and [`ActivityProvider`] traits,
//! so tests can substitute in-memory fakes for the HTTP clients.

pub mod garmin;
pub mod open_weather;

use crate::models::{ActivityRecord, Coordinate, WeatherSnapshot};
use async_trait::async_trait;

pub use garmin::GarminClient;
pub use open_weather::OpenWeatherClient;

/// Source of combined current + hourly weather for a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn snapshot(&self, coord: Coordinate) -> Result<WeatherSnapshot, FetchError>;
}

/// Source of the user's recent activities (most recent first).
#[async_trait]
pub trait ActivityProvider: Send + Sync {
    async fn recent_activities(&self) -> Result<Vec<ActivityRecord>, FetchError>;
}

/// Failure of a single upstream fetch. Never fatal: the poll that issued it
/// simply waits for its next tick.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("Upstream rate limit hit (429)")]
    RateLimited,

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    #[error("Upstream authentication failed: {0}")]
    Auth(String),
}

// Request URLs carry the OpenWeather key in the query string.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.without_url())
    }
}

impl FetchError {
    /// Whether the failure means the cached upstream session is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Status { status: 401, .. })
    }
}

/// Check response status and parse the JSON body.
pub(crate) async fn check_response_json<T: for<'de> serde::Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, FetchError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("Upstream rate limit hit (429)");
            return Err(FetchError::RateLimited);
        }

        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unauthorized() {
        let err = FetchError::Status {
            status: 401,
            body: String::new(),
        };
        assert!(err.is_unauthorized());

        let err = FetchError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert!(!err.is_unauthorized());
        assert!(!FetchError::RateLimited.is_unauthorized());
    }
}
