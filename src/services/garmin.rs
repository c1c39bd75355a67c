// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Garmin Connect client for the recent-activity feed.
//!
//! Handles:
//! - Credential login against the SSO endpoint
//! - Session token caching with proactive re-login before expiry
//! - A single re-login when the API rejects a cached token
//! - Mapping Garmin activity summaries to [`ActivityRecord`]

use super::{check_response_json, ActivityProvider, FetchError};
use crate::config::Config;
use crate::models::ActivityRecord;
use crate::time_utils::{format_utc_rfc3339, parse_garmin_gmt};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before session expiration when we proactively log in again (5 minutes).
const SESSION_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Number of activities requested per fetch.
const ACTIVITY_PAGE_SIZE: u32 = 10;

/// Cached session token with expiry information.
#[derive(Clone)]
struct CachedSession {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Garmin Connect client.
///
/// Clones share one session cache, so concurrent polls from many
/// connections trigger at most one login at a time.
#[derive(Clone)]
pub struct GarminClient {
    http: reqwest::Client,
    sso_url: String,
    api_url: String,
    username: String,
    password: String,
    /// Held across a login so concurrent callers wait for the winner.
    session: Arc<Mutex<Option<CachedSession>>>,
}

impl GarminClient {
    /// Create a new client with login credentials.
    pub fn new(
        http: reqwest::Client,
        sso_url: String,
        api_url: String,
        username: String,
        password: String,
    ) -> Self {
        Self {
            http,
            sso_url,
            api_url: api_url.trim_end_matches('/').to_string(),
            username,
            password,
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Build a client from application config.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(
            http,
            config.garmin_sso_url.clone(),
            config.garmin_api_url.clone(),
            config.garmin_username.clone(),
            config.garmin_password.clone(),
        )
    }

    /// Get a valid session token, logging in if none is cached or it is
    /// about to expire.
    async fn access_token(&self) -> Result<String, FetchError> {
        let mut session = self.session.lock().await;
        let margin = Duration::seconds(SESSION_REFRESH_MARGIN_SECS);

        if let Some(cached) = session.as_ref() {
            if Utc::now() + margin < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
            tracing::info!("Garmin session expiring, logging in again");
        }

        let fresh = self.login().await?;
        let token = fresh.access_token.clone();
        *session = Some(fresh);
        Ok(token)
    }

    /// Drop the cached session so the next call logs in again.
    async fn invalidate_session(&self) {
        *self.session.lock().await = None;
    }

    /// Exchange credentials for a session token.
    async fn login(&self) -> Result<CachedSession, FetchError> {
        let response = self
            .http
            .post(&self.sso_url)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            tracing::error!(status = %status, "Garmin login rejected");
            return Err(FetchError::Auth(format!(
                "Login rejected with status {}",
                status
            )));
        }

        let login: LoginResponse = check_response_json(response).await?;
        let expires_at = Utc::now() + Duration::seconds(login.expires_in);

        tracing::info!(expires_at = %format_utc_rfc3339(expires_at), "Garmin login succeeded");
        Ok(CachedSession {
            access_token: login.access_token,
            expires_at,
        })
    }

    /// List the most recent activities with a given token.
    async fn list_activities(
        &self,
        access_token: &str,
    ) -> Result<Vec<GarminActivitySummary>, FetchError> {
        let url = format!(
            "{}/activitylist-service/activities/search/activities",
            self.api_url
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("start", 0), ("limit", ACTIVITY_PAGE_SIZE)])
            .send()
            .await?;

        check_response_json(response).await
    }
}

#[async_trait]
impl ActivityProvider for GarminClient {
    async fn recent_activities(&self) -> Result<Vec<ActivityRecord>, FetchError> {
        let token = self.access_token().await?;

        let summaries = match self.list_activities(&token).await {
            Ok(list) => list,
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Garmin rejected cached session, logging in again");
                self.invalidate_session().await;
                let token = self.access_token().await?;
                self.list_activities(&token).await?
            }
            Err(e) => return Err(e),
        };

        let records: Vec<ActivityRecord> = summaries
            .into_iter()
            .filter_map(GarminActivitySummary::into_record)
            .collect();

        tracing::debug!(count = records.len(), "Garmin activities fetched");
        Ok(records)
    }
}

/// Login response from the SSO endpoint.
#[derive(Debug, Clone, Deserialize)]
struct LoginResponse {
    access_token: String,
    /// Token lifetime in seconds
    expires_in: i64,
}

/// Summary activity from the activity-list service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivitySummary {
    pub activity_id: u64,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(rename = "startTimeGMT")]
    pub start_time_gmt: String,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub activity_type: Option<GarminActivityType>,
}

/// Activity type descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivityType {
    pub type_key: String,
}

impl GarminActivitySummary {
    /// Convert to the pushed record. Activities with an unparseable start
    /// time are skipped; missing distance/speed count as zero.
    pub fn into_record(self) -> Option<ActivityRecord> {
        let Some(start) = parse_garmin_gmt(&self.start_time_gmt) else {
            tracing::warn!(
                activity_id = self.activity_id,
                start_time = %self.start_time_gmt,
                "Skipping activity with unparseable start time"
            );
            return None;
        };

        Some(ActivityRecord {
            activity_id: self.activity_id,
            name: self.activity_name.unwrap_or_default(),
            activity_type: self
                .activity_type
                .map(|t| t.type_key)
                .unwrap_or_else(|| "other".to_string()),
            start_time: format_utc_rfc3339(start),
            distance_m: self.distance.unwrap_or(0.0),
            average_speed_mps: self.average_speed.unwrap_or(0.0),
        })
    }
}
