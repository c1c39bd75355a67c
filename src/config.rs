// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Credentials are read once at startup; a missing one stops the process
//! before the listener is bound.

use std::env;
use std::time::Duration;

/// Default cadence for both channels (15 minutes).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15 * 60;

/// Default timeout applied to every upstream request.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Interval between polls on each channel
    pub poll_interval: Duration,
    /// Per-request upstream timeout
    pub fetch_timeout: Duration,
    /// OpenWeather API base URL
    pub open_weather_base_url: String,
    /// Garmin SSO login URL
    pub garmin_sso_url: String,
    /// Garmin Connect API base URL
    pub garmin_api_url: String,

    // --- Secrets ---
    /// OpenWeather API key
    pub open_weather_api_key: String,
    /// Garmin Connect username
    pub garmin_username: String,
    /// Garmin Connect password
    pub garmin_password: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 3000,
            frontend_url: "http://localhost:3000".to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            open_weather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            garmin_sso_url: "https://sso.garmin.com/sso/signin".to_string(),
            garmin_api_url: "https://connectapi.garmin.com".to_string(),
            open_weather_api_key: "test_api_key".to_string(),
            garmin_username: "test_user".to_string(),
            garmin_password: "test_password".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            poll_interval: Duration::from_secs(secs_var(
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            fetch_timeout: Duration::from_secs(secs_var(
                "FETCH_TIMEOUT_SECS",
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
            open_weather_base_url: env::var("OPEN_WEATHER_BASE_URL")
                .unwrap_or(defaults.open_weather_base_url),
            garmin_sso_url: env::var("GARMIN_SSO_URL").unwrap_or(defaults.garmin_sso_url),
            garmin_api_url: env::var("GARMIN_API_URL").unwrap_or(defaults.garmin_api_url),

            open_weather_api_key: required("OPEN_WEATHER_API_KEY")?,
            garmin_username: required("GARMIN_USERNAME")?,
            garmin_password: required("GARMIN_PASSWORD")?,
        })
    }
}

/// Read a required, non-empty variable.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Read a positive number of seconds, falling back to `default`.
fn secs_var(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
