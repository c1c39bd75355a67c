// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model for the garmin channel.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One recorded activity, most recent first in any list we push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Garmin activity ID
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub activity_id: u64,
    /// Activity name/title
    pub name: String,
    /// Activity type key (running, cycling, ...)
    pub activity_type: String,
    /// Start time (RFC 3339, UTC)
    pub start_time: String,
    /// Distance in meters
    pub distance_m: f64,
    /// Average speed in meters/second
    pub average_speed_mps: f64,
}

/// Payload of the garmin channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityList {
    pub activities: Vec<ActivityRecord>,
}

impl From<Vec<ActivityRecord>> for ActivityList {
    fn from(activities: Vec<ActivityRecord>) -> Self {
        Self { activities }
    }
}
